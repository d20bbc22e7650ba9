//! Pool of single values

use core::fmt;

use crossbeam_queue::SegQueue;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::SyncPool;
use crate::config::PoolConfig;
use crate::error::{RecycleResult, fatal};
use crate::lifecycle::{Lifecycle, LifecyclePolicy};
use crate::stats::{PoolCounters, PoolStats};

/// Thread-safe pool of recycled values
///
/// `get` pops the free list or runs the allocate policy; `put` runs the reset
/// policy and pushes the value back. The pool never drops a value on its own
/// while it is alive. When the pool itself is dropped, every idle value goes
/// through the release policy.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::thread;
///
/// use nebula_recycle::pool::ValuePool;
///
/// let pool = Arc::new(ValuePool::new(
///     || Vec::<u8>::with_capacity(1024),
///     |mut v: Vec<u8>| {
///         v.clear();
///         v
///     },
/// ));
///
/// let handles: Vec<_> = (0..4)
///     .map(|_| {
///         let pool = Arc::clone(&pool);
///         thread::spawn(move || {
///             let mut buffer = pool.get();
///             buffer.extend_from_slice(b"Hello");
///             pool.put(buffer);
///         })
///     })
///     .collect();
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(pool.len(), 0);
/// assert!(pool.cap() >= 1);
/// ```
pub struct ValuePool<T, L: Lifecycle<T> = LifecyclePolicy<T>> {
    free: SegQueue<T>,
    lifecycle: L,
    counters: PoolCounters,
    name: String,
}

impl<T: 'static> ValuePool<T> {
    /// Create a pool from allocate and reset closures
    pub fn new<A, R>(allocate: A, reset: R) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
        R: Fn(T) -> T + Send + Sync + 'static,
    {
        Self::with_lifecycle(LifecyclePolicy::new(allocate, reset), PoolConfig::default())
    }
}

impl<T, L: Lifecycle<T>> ValuePool<T, L> {
    /// Create a pool with a custom lifecycle and configuration
    ///
    /// Panics if the configuration is invalid.
    #[track_caller]
    pub fn with_lifecycle(lifecycle: L, config: PoolConfig) -> Self {
        fatal(Self::try_with_lifecycle(lifecycle, config))
    }

    /// Create a pool, reporting an invalid configuration as an error
    pub fn try_with_lifecycle(lifecycle: L, config: PoolConfig) -> RecycleResult<Self> {
        config.validate()?;

        let pool = Self {
            free: SegQueue::new(),
            lifecycle,
            counters: PoolCounters::default(),
            name: config.name,
        };

        for _ in 0..config.pre_warm {
            let value = pool.construct();
            pool.free.push(value);
        }

        #[cfg(feature = "logging")]
        debug!(
            pool = %pool.name,
            value_type = core::any::type_name::<T>(),
            pre_warm = config.pre_warm,
            "value pool created"
        );

        Ok(pool)
    }

    /// Take a value, recycled or freshly allocated
    pub fn get(&self) -> T {
        let (value, reused) = match self.free.pop() {
            Some(value) => (value, true),
            None => (self.construct(), false),
        };
        self.counters.record_get(reused);
        value
    }

    /// Reset `value` and return it to the free list
    ///
    /// The caller gives up the value; nothing it wrote survives the reset.
    pub fn put(&self, value: T) {
        let value = self.lifecycle.reset(value);
        self.free.push(value);
        self.counters.record_put();
    }

    /// Permanently remove a checked-out value, running the release policy
    pub fn discard(&self, value: T) {
        self.lifecycle.release(value);
        self.counters.record_discard();
    }

    /// Values currently checked out
    pub fn len(&self) -> i64 {
        self.counters.outstanding()
    }

    /// Whether no value is checked out
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// High-water mark: times the allocate policy has run
    pub fn cap(&self) -> i64 {
        self.counters.constructed()
    }

    /// Values waiting on the free list
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.free.len())
    }

    /// Pool name from the configuration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lifecycle this pool runs
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    fn construct(&self) -> T {
        let value = self.lifecycle.allocate();
        let _constructed = self.counters.record_construction();

        #[cfg(feature = "logging")]
        trace!(pool = %self.name, constructed = _constructed, "allocated new value");

        value
    }
}

impl<T, L: Lifecycle<T>> SyncPool<T> for ValuePool<T, L> {
    fn get(&self) -> T {
        Self::get(self)
    }

    fn put(&self, value: T) {
        Self::put(self, value);
    }

    fn len(&self) -> i64 {
        Self::len(self)
    }

    fn cap(&self) -> i64 {
        Self::cap(self)
    }
}

impl<T, L: Lifecycle<T>> Drop for ValuePool<T, L> {
    fn drop(&mut self) {
        while let Some(value) = self.free.pop() {
            self.lifecycle.release(value);
        }
    }
}

impl<T, L: Lifecycle<T>> fmt::Debug for ValuePool<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePool")
            .field("name", &self.name)
            .field("type", &core::any::type_name::<T>())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
