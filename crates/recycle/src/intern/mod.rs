//! Deduplicating intern tables
//!
//! An intern table maps equal values to one stable [`InternId`] and back.
//! Identifiers are handed out in insertion order starting at 1; 0 is never
//! issued and always reads as "not found".
//!
//! - `InternTable`: single owner, mutation through `&mut self`
//! - `ConcurrentInternTable`: shared, guarded by a reader-writer lock

mod concurrent;
mod table;

use core::fmt;
use core::num::NonZeroU64;

pub use concurrent::ConcurrentInternTable;
pub use table::InternTable;

/// Identifier issued by an intern table
///
/// Only meaningful for the table that issued it, and only until that table
/// is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternId(NonZeroU64);

impl InternId {
    /// Wrap a raw identifier; 0 is the sentinel and yields `None`
    pub const fn new(raw: u64) -> Option<Self> {
        match NonZeroU64::new(raw) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }

    /// Raw identifier value
    pub const fn get(self) -> u64 {
        self.0.get()
    }

    /// Identifier of the value stored at `index` (0-based)
    pub(crate) fn from_index(index: usize) -> Self {
        Self(NonZeroU64::MIN.saturating_add(index as u64))
    }

    /// Storage slot for a raw identifier
    pub(crate) fn slot(raw: u64) -> Option<usize> {
        raw.checked_sub(1).and_then(|index| usize::try_from(index).ok())
    }

    /// Storage slot of an issued identifier
    pub(crate) fn index(self) -> usize {
        // Issued identifiers come from `from_index`, so they always fit
        Self::slot(self.get()).unwrap_or(usize::MAX)
    }
}

impl From<InternId> for u64 {
    fn from(id: InternId) -> Self {
        id.get()
    }
}

impl PartialEq<u64> for InternId {
    fn eq(&self, other: &u64) -> bool {
        self.get() == *other
    }
}

impl fmt::Display for InternId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Single-owner interface shared by both intern tables
///
/// Lookups return owned values so that the same code can drive a table that
/// hands out references and one that cannot. Mutating methods take
/// `&mut self`: through this trait a `ConcurrentInternTable` is used with
/// exclusive access. Share one across threads through its inherent `&self`
/// methods instead.
pub trait Intern<T: Clone> {
    /// Identifier for `value`, assigning the next one if it is new
    fn insert(&mut self, value: T) -> InternId;

    /// Value stored under a raw identifier
    fn value(&self, id: u64) -> Option<T>;

    /// Canonical stored instance equal to `value`
    fn deduplicate(&mut self, value: T) -> T;

    /// Number of distinct values since creation or the last clear
    fn len(&self) -> usize;

    /// Whether the table holds no values
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every value and restart identifiers at 1
    fn clear(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_sentinel() {
        assert!(InternId::new(0).is_none());
        assert_eq!(InternId::slot(0), None);
    }

    #[test]
    fn test_index_mapping() {
        let id = InternId::from_index(0);
        assert_eq!(id.get(), 1);
        assert_eq!(id, 1_u64);
        assert_eq!(id.index(), 0);
        assert_eq!(InternId::slot(id.get()), Some(0));
        assert_eq!(InternId::from_index(41).to_string(), "42");
        assert_eq!(u64::from(InternId::new(7).unwrap()), 7);
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        let a = InternId::new(1).unwrap();
        let b = InternId::new(2).unwrap();
        assert!(a < b);
    }
}
