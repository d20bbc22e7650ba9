//! Lock-guarded intern table for shared use

use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};

use hashbrown::DefaultHashBuilder;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};

use super::{Intern, InternId, InternTable};

/// Intern table that can be shared between threads
///
/// Lookups take a shared read lock. `insert` and `deduplicate` take an
/// upgradable read, so a hit never blocks other readers; only a miss upgrades
/// to the exclusive lock. Mutations are serialized with each other, which
/// keeps identifier assignment linearizable: racing inserts of equal values
/// all observe one identifier.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use nebula_recycle::intern::ConcurrentInternTable;
///
/// let table = Arc::new(ConcurrentInternTable::new());
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let table = Arc::clone(&table);
///         thread::spawn(move || table.insert("shared"))
///     })
///     .collect();
///
/// for h in handles {
///     assert_eq!(h.join().unwrap().get(), 1);
/// }
/// assert_eq!(table.len(), 1);
/// ```
pub struct ConcurrentInternTable<T, S = DefaultHashBuilder> {
    inner: RwLock<InternTable<T, S>>,
}

impl<T> ConcurrentInternTable<T> {
    /// Create an empty table
    pub fn new() -> Self {
        Self::from(InternTable::new())
    }

    /// Create an empty table with room for `capacity` distinct values
    pub fn with_capacity(capacity: usize) -> Self {
        Self::from(InternTable::with_capacity(capacity))
    }
}

impl<T, S> ConcurrentInternTable<T, S> {
    /// Clone of the value stored under `id`
    pub fn value(&self, id: impl Into<u64>) -> Option<T>
    where
        T: Clone,
    {
        self.inner.read().value(id).cloned()
    }

    /// Run `f` on a clone of the value stored under `id`
    ///
    /// The lock is released before `f` runs, so `f` may use the table.
    pub fn with_value<R>(&self, id: impl Into<u64>, f: impl FnOnce(&T) -> R) -> Option<R>
    where
        T: Clone,
    {
        let value = self.value(id)?;
        Some(f(&value))
    }

    /// Number of distinct values since creation or the last clear
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the table holds no values
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Drop every value and restart identifiers at 1
    ///
    /// Identifiers issued before the clear must not be used afterwards; they
    /// resolve to `None` or to whatever value later took the slot.
    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Unwrap the single-owner table
    pub fn into_inner(self) -> InternTable<T, S> {
        self.inner.into_inner()
    }
}

impl<T: Hash + Eq, S: BuildHasher> ConcurrentInternTable<T, S> {
    /// Identifier for `value`, assigning the next one if it is new
    pub fn insert(&self, value: T) -> InternId {
        let table = self.inner.upgradable_read();
        if let Some(id) = table.id_of(&value) {
            return id;
        }

        let mut table = RwLockUpgradableReadGuard::upgrade(table);
        table.insert(value)
    }

    /// Canonical stored instance equal to `value`
    ///
    /// Returns a clone of the stored instance; storage is shared only inside
    /// the table.
    pub fn deduplicate(&self, value: T) -> T
    where
        T: Clone,
    {
        let table = self.inner.upgradable_read();
        if let Some(stored) = table.id_of(&value).and_then(|id| table.value(id)) {
            return stored.clone();
        }

        let mut table = RwLockUpgradableReadGuard::upgrade(table);
        table.deduplicate(value).clone()
    }

    /// Identifier already assigned to `value`, without inserting it
    pub fn id_of<Q>(&self, value: &Q) -> Option<InternId>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.inner.read().id_of(value)
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

impl<T: Hash + Eq + Clone, S: BuildHasher> Intern<T> for ConcurrentInternTable<T, S> {
    fn insert(&mut self, value: T) -> InternId {
        self.inner.get_mut().insert(value)
    }

    fn value(&self, id: u64) -> Option<T> {
        Self::value(self, id)
    }

    fn deduplicate(&mut self, value: T) -> T {
        self.inner.get_mut().deduplicate(value).clone()
    }

    fn len(&self) -> usize {
        Self::len(self)
    }

    fn clear(&mut self) {
        self.inner.get_mut().clear();
    }
}

impl<T, S> From<InternTable<T, S>> for ConcurrentInternTable<T, S> {
    fn from(table: InternTable<T, S>) -> Self {
        Self {
            inner: RwLock::new(table),
        }
    }
}

impl<T, S: Default> Default for ConcurrentInternTable<T, S> {
    fn default() -> Self {
        Self::from(InternTable::default())
    }
}

impl<T: fmt::Debug, S> fmt::Debug for ConcurrentInternTable<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_read() {
            Some(table) => f.debug_tuple("ConcurrentInternTable").field(&*table).finish(),
            None => f.write_str("ConcurrentInternTable(<locked>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Barrier, mpsc};
    use std::thread;
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_concurrent_insert_same_keys() {
        const THREADS: usize = 10;
        const KEYS: [&str; 3] = ["alpha", "beta", "gamma"];

        let table = Arc::new(ConcurrentInternTable::new());
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let table = Arc::clone(&table);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    // Vary the order so threads race on different keys first
                    let mut ids: Vec<_> = KEYS
                        .iter()
                        .cycle()
                        .skip(i % KEYS.len())
                        .take(KEYS.len())
                        .map(|key| (*key, table.insert(key.to_string())))
                        .collect();
                    ids.sort_unstable();
                    ids
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(table.len(), KEYS.len());
        for ids in &results {
            assert_eq!(ids, &results[0]);
        }
        for (key, id) in &results[0] {
            assert_eq!(table.value(*id).as_deref(), Some(*key));
        }
    }

    #[test]
    fn test_deduplicate_and_lookup() {
        let table = ConcurrentInternTable::with_capacity(2);
        let first = table.deduplicate(String::from("x"));
        let second = table.deduplicate(String::from("x"));

        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.id_of("x").map(InternId::get), Some(1));
        assert_eq!(table.with_value(1_u64, String::len), Some(1));
        assert_eq!(table.value(0_u64), None);
    }

    #[test]
    fn test_clear_resets_ids() {
        let table = ConcurrentInternTable::new();
        table.insert(1_u32);
        table.insert(2_u32);
        table.clear();

        assert!(table.is_empty());
        assert!(!table.contains(&1_u32));
        assert_eq!(table.insert(2).get(), 1);
    }

    #[test]
    fn test_with_value_callback_can_reenter() {
        let table = Arc::new(ConcurrentInternTable::new());
        table.insert("a".to_string());

        let (tx, rx) = mpsc::channel();
        let worker = {
            let table = Arc::clone(&table);
            thread::spawn(move || {
                let id = table.with_value(1_u64, |_| {
                    table.clear();
                    table.insert("b".to_string())
                });
                tx.send(id).unwrap();
            })
        };

        let id = rx
            .recv_timeout(Duration::from_secs(5))
            .expect("callback that touches the table must not block");
        worker.join().unwrap();

        assert_eq!(id.map(InternId::get), Some(1));
        assert_eq!(table.value(1_u64).as_deref(), Some("b"));
    }

    #[test]
    fn test_conversions() {
        let mut single = InternTable::new();
        single.insert('q');

        let shared = ConcurrentInternTable::from(single);
        assert!(shared.contains(&'q'));
        assert_eq!(format!("{shared:?}"), "ConcurrentInternTable({1: 'q'})");

        let single = shared.into_inner();
        assert_eq!(single.value(1_u64), Some(&'q'));
    }

    #[test]
    fn test_trait_methods_use_exclusive_access() {
        let mut table: ConcurrentInternTable<u8> = ConcurrentInternTable::default();
        assert_eq!(Intern::insert(&mut table, 9).get(), 1);
        assert_eq!(Intern::deduplicate(&mut table, 9), 9);
        assert_eq!(Intern::value(&table, 1), Some(9));
        Intern::clear(&mut table);
        assert!(Intern::is_empty(&table));
    }
}
