//! String interning for cached column text.
//!
//! Column values repeat heavily across rows ("TCP", "192.168.1.1", ...), so
//! every harvested value goes through a shared pool that hands back one
//! stable allocation per distinct string. The pool is append-only and lives
//! as long as the capture session that owns the rows.

use parking_lot::Mutex;
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Append-only interning capability shared by all rows of a session.
///
/// Interning is idempotent: equal text always yields handles that point at
/// the same allocation. Implementations must tolerate concurrent callers.
pub trait StringPool: Send + Sync {
    /// Return the pooled copy of `text`, inserting it if absent.
    fn intern(&self, text: &str) -> Arc<str>;

    /// Number of distinct strings held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Hash-set backed pool guarded by a mutex.
#[derive(Debug, Default)]
pub struct HashStringPool {
    strings: Mutex<HashSet<Arc<str>>>,
}

impl HashStringPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool with room for `capacity` distinct strings.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            strings: Mutex::new(HashSet::with_capacity(capacity)),
        }
    }
}

impl StringPool for HashStringPool {
    fn intern(&self, text: &str) -> Arc<str> {
        let mut strings = self.strings.lock();
        if let Some(existing) = strings.get(text) {
            return existing.clone();
        }
        let interned: Arc<str> = Arc::from(text);
        strings.insert(interned.clone());
        interned
    }

    fn len(&self) -> usize {
        self.strings.lock().len()
    }
}

/// A cached column value.
///
/// Either a string with `'static` lifetime that needed no copy, or a handle
/// into the session's string pool. Equality, ordering and hashing go by the
/// text alone, so the two representations are interchangeable.
#[derive(Debug, Clone)]
pub enum ColumnText {
    Static(&'static str),
    Interned(Arc<str>),
}

impl ColumnText {
    pub const EMPTY: ColumnText = ColumnText::Static("");

    pub fn as_str(&self) -> &str {
        match self {
            ColumnText::Static(s) => s,
            ColumnText::Interned(s) => s,
        }
    }

    /// Number of text lines, always at least 1.
    pub fn line_count(&self) -> usize {
        self.as_str().matches('\n').count() + 1
    }
}

impl Default for ColumnText {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Deref for ColumnText {
    type Target = str;

    fn deref(&self) -> &str {
        self.as_str()
    }
}

impl AsRef<str> for ColumnText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ColumnText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PartialEq for ColumnText {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for ColumnText {}

impl PartialEq<str> for ColumnText {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for ColumnText {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl Hash for ColumnText {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_str().hash(state);
    }
}

impl PartialOrd for ColumnText {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ColumnText {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_str().cmp(other.as_str())
    }
}

/// How decoded text is turned into cached [`ColumnText`].
///
/// Both strategies produce identical observable text; they differ only in
/// how many copies end up in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HarvestStrategy {
    /// Intern every value.
    #[default]
    InternAll,
    /// Keep `'static` strings as-is and intern only owned text.
    MinimizeCopies,
}

impl HarvestStrategy {
    /// Parse the kebab-case name used in config files and the environment.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "intern-all" => Some(Self::InternAll),
            "minimize-copies" => Some(Self::MinimizeCopies),
            _ => None,
        }
    }

    pub fn harvest(self, pool: &dyn StringPool, text: &Cow<'static, str>) -> ColumnText {
        match (self, text) {
            (HarvestStrategy::MinimizeCopies, Cow::Borrowed(s)) => ColumnText::Static(s),
            _ => ColumnText::Interned(pool.intern(text)),
        }
    }
}
