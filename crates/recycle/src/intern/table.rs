//! Single-owner intern table

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

use hashbrown::DefaultHashBuilder;
use hashbrown::hash_table::{Entry, HashTable};
#[cfg(feature = "logging")]
use tracing::debug;

use super::{Intern, InternId};

/// Bidirectional map between values and sequential identifiers
///
/// Each distinct value is stored exactly once. The hash index holds only
/// identifiers; values live in insertion order, so identifier `n` is the
/// value at slot `n - 1`.
///
/// # Example
/// ```
/// use nebula_recycle::intern::InternTable;
///
/// let mut table = InternTable::new();
/// let a = table.insert("value".to_string());
/// let b = table.insert("value".to_string());
/// let c = table.insert("other".to_string());
///
/// assert_eq!(a, b);
/// assert_eq!((a.get(), c.get()), (1, 2));
/// assert_eq!(table.value(a).map(String::as_str), Some("value"));
/// assert_eq!(table.value(3_u64), None);
/// ```
pub struct InternTable<T, S = DefaultHashBuilder> {
    index: HashTable<InternId>,
    values: Vec<T>,
    hasher: S,
}

impl<T> InternTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Create an empty table with room for `capacity` distinct values
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashTable::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
            hasher: DefaultHashBuilder::default(),
        }
    }
}

impl<T, S> InternTable<T, S> {
    /// Create an empty table using `hasher` for the index
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            index: HashTable::new(),
            values: Vec::new(),
            hasher,
        }
    }

    /// Value stored under `id`, or `None` for 0 and unissued identifiers
    pub fn value(&self, id: impl Into<u64>) -> Option<&T> {
        InternId::slot(id.into()).and_then(|slot| self.values.get(slot))
    }

    /// Number of distinct values since creation or the last clear
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the table holds no values
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every value; the next new value gets identifier 1 again
    pub fn clear(&mut self) {
        let _dropped = self.values.len();
        self.index.clear();
        self.values.clear();

        #[cfg(feature = "logging")]
        debug!(dropped = _dropped, "intern table cleared");
    }

    /// Entries in identifier order
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (InternId, &T)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(slot, value)| (InternId::from_index(slot), value))
    }
}

impl<T: Hash + Eq, S: BuildHasher> InternTable<T, S> {
    /// Identifier for `value`, assigning the next one if it is new
    ///
    /// Equal values always map to the same identifier until the table is
    /// cleared. A repeated value is dropped in favour of the stored one.
    pub fn insert(&mut self, value: T) -> InternId {
        let hash = self.hasher.hash_one(&value);
        let values = &self.values;
        let hasher = &self.hasher;

        let entry = self.index.entry(
            hash,
            |id| values[id.index()] == value,
            |id| hasher.hash_one(&values[id.index()]),
        );

        match entry {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let id = InternId::from_index(self.values.len());
                entry.insert(id);
                self.values.push(value);
                id
            }
        }
    }

    /// Canonical stored instance equal to `value`, storing `value` if it is new
    pub fn deduplicate(&mut self, value: T) -> &T {
        let id = self.insert(value);
        &self.values[id.index()]
    }

    /// Identifier already assigned to `value`, without inserting it
    pub fn id_of<Q>(&self, value: &Q) -> Option<InternId>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hasher.hash_one(value);
        self.index
            .find(hash, |id| {
                let stored: &Q = self.values[id.index()].borrow();
                stored == value
            })
            .copied()
    }

    /// Whether an equal value has been interned
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.id_of(value).is_some()
    }
}

impl<T: Hash + Eq + Clone, S: BuildHasher> Intern<T> for InternTable<T, S> {
    fn insert(&mut self, value: T) -> InternId {
        Self::insert(self, value)
    }

    fn value(&self, id: u64) -> Option<T> {
        Self::value(self, id).cloned()
    }

    fn deduplicate(&mut self, value: T) -> T {
        Self::deduplicate(self, value).clone()
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn clear(&mut self) {
        Self::clear(self);
    }
}

impl<T, S: Default> Default for InternTable<T, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<T: Hash + Eq, S: BuildHasher> Extend<T> for InternTable<T, S> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Hash + Eq> FromIterator<T> for InternTable<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

impl<T: fmt::Debug, S> fmt::Debug for InternTable<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|(id, value)| (id.get(), value)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_insert_and_lookup_scenario() {
        let mut table = InternTable::new();

        assert_eq!(table.insert("value".to_string()).get(), 1);
        assert_eq!(table.insert("value".to_string()).get(), 1);
        assert_eq!(table.insert("other".to_string()).get(), 2);

        assert_eq!(table.value(1_u64).map(String::as_str), Some("value"));
        assert_eq!(table.value(3_u64), None);
        assert_eq!(table.len(), 2);

        table.clear();
        assert_eq!(table.value(1_u64), None);
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_zero_never_resolves() {
        let mut table = InternTable::new();
        table.insert(10_i32);
        assert_eq!(table.value(0_u64), None);
        assert_eq!(table.value(u64::MAX), None);
    }

    #[test]
    fn test_ids_restart_after_clear() {
        let mut table = InternTable::new();
        table.insert('a');
        table.insert('b');
        table.clear();

        assert!(table.is_empty());
        assert!(!table.contains(&'a'));
        assert_eq!(table.insert('b').get(), 1);
        assert_eq!(table.value(1_u64), Some(&'b'));
    }

    #[test]
    fn test_deduplicate_returns_stored_instance() {
        let mut table = InternTable::new();
        let first = table.deduplicate(String::from("shared")).as_ptr();
        let second = table.deduplicate(String::from("shared")).as_ptr();

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_lookup_by_borrowed_form() {
        let table: InternTable<String> =
            ["a", "b", "a", "c"].into_iter().map(String::from).collect();

        assert_eq!(table.len(), 3);
        assert_eq!(table.id_of("c").map(InternId::get), Some(3));
        assert!(table.contains("b"));
        assert!(!table.contains("d"));
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut table = InternTable::with_capacity(4);
        table.extend([30, 10, 30, 20]);

        let entries: Vec<_> = table.iter().map(|(id, v)| (id.get(), *v)).collect();
        assert_eq!(entries, vec![(1, 30), (2, 10), (3, 20)]);
        assert_eq!(format!("{table:?}"), "{1: 30, 2: 10, 3: 20}");
    }

    #[test]
    fn test_lookup_by_intern_id() {
        let mut table = InternTable::new();
        let id = table.insert(vec![1_u8, 2]);
        assert_eq!(table.value(id), Some(&vec![1, 2]));
    }

    #[test]
    fn test_trait_object_usage() {
        fn exercise(table: &mut dyn Intern<u32>) -> (u64, Option<u32>, usize) {
            let id = table.insert(7);
            table.insert(7);
            (id.get(), table.value(id.get()), table.len())
        }

        let mut table = InternTable::new();
        assert_eq!(exercise(&mut table), (1, Some(7), 1));
        assert!(!Intern::is_empty(&table));
    }
}
