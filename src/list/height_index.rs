//! Row height index - prefix sums of row line counts via a Fenwick tree.
//!
//! The list owner needs the total height of all rows and the row under a
//! given vertical line offset. Rows report a changed line count after a
//! refresh; updating one height is O(log n).

/// Fenwick tree over row heights, 0-indexed API.
#[derive(Debug, Clone, Default)]
pub struct HeightIndex {
    /// Backing storage, may be longer than `len`.
    tree: Vec<isize>,
    len: usize,
}

impl HeightIndex {
    /// Create an empty index with room for `capacity` rows.
    pub fn new(capacity: usize) -> Self {
        Self {
            tree: vec![0; capacity],
            len: 0,
        }
    }

    /// Append a row of the given height.
    pub fn push(&mut self, height: usize) {
        if self.len >= self.tree.len() {
            self.grow();
        }
        let row = self.len;
        self.len += 1;
        fenwick::array::update(&mut self.tree, row, height as isize);
    }

    /// Double the backing storage.
    ///
    /// New upper nodes cover existing rows, so the tree is rebuilt rather
    /// than zero-extended.
    fn grow(&mut self) {
        let heights: Vec<usize> = (0..self.len).map(|row| self.height(row)).collect();
        self.tree = vec![0; self.tree.len().max(1) * 2];
        for (row, height) in heights.into_iter().enumerate() {
            fenwick::array::update(&mut self.tree, row, height as isize);
        }
    }

    /// Height of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    pub fn height(&self, row: usize) -> usize {
        let upto = self.prefix_sum(row);
        if row == 0 {
            upto
        } else {
            upto - self.prefix_sum(row - 1)
        }
    }

    /// Replace one row's height.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    pub fn set(&mut self, row: usize, height: usize) {
        let delta = height as isize - self.height(row) as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, row, delta);
        }
    }

    /// Total height of rows `0..=row`.
    ///
    /// # Panics
    ///
    /// Panics if `row >= len()`.
    pub fn prefix_sum(&self, row: usize) -> usize {
        assert!(
            row < self.len,
            "row {} out of bounds (len: {})",
            row,
            self.len
        );
        fenwick::array::prefix_sum(&self.tree, row).max(0) as usize
    }

    /// Row containing line `offset`, or `None` past the last row.
    ///
    /// Row `i` covers lines `[prefix_sum(i - 1), prefix_sum(i))`.
    pub fn lower_bound(&self, offset: usize) -> Option<usize> {
        let (mut left, mut right) = (0, self.len);
        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > offset {
                right = mid;
            } else {
                left = mid + 1;
            }
        }
        (left < self.len).then_some(left)
    }

    pub fn total(&self) -> usize {
        match self.len {
            0 => 0,
            len => self.prefix_sum(len - 1),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drop every row, keeping the allocation.
    pub fn clear(&mut self) {
        self.tree.iter_mut().for_each(|slot| *slot = 0);
        self.len = 0;
    }
}
