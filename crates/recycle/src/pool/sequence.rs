//! Pool of resizable sequences

use core::fmt;

use crossbeam_queue::SegQueue;
#[cfg(feature = "logging")]
use tracing::{debug, trace};

use super::SyncPool;
use crate::config::SequenceConfig;
use crate::error::{RecycleResult, fatal};
use crate::lifecycle::{Lifecycle, SequenceLifecycle, SequencePolicy};
use crate::stats::{PoolCounters, PoolStats};

/// Thread-safe pool of `Vec`s that keeps their backing storage alive
///
/// A freshly allocated sequence has the configured default length and
/// capacity. A recycled one comes back empty with whatever capacity it had
/// when it was returned, so growth done by one user is inherited by the next.
///
/// # Example
/// ```
/// use nebula_recycle::pool::SequencePool;
///
/// let pool = SequencePool::<u8>::new(0, 256);
///
/// let mut buf = pool.get();
/// buf.extend_from_slice(&[0; 1000]);
/// let grown = buf.capacity();
/// pool.put(buf);
///
/// let buf = pool.get();
/// assert!(buf.is_empty());
/// assert_eq!(buf.capacity(), grown);
/// ```
pub struct SequencePool<T, L: SequenceLifecycle<T> = SequencePolicy<T>> {
    free: SegQueue<Vec<T>>,
    lifecycle: L,
    counters: PoolCounters,
    config: SequenceConfig,
}

impl<T: Default + Send + 'static> SequencePool<T> {
    /// Create a pool of `T::default()`-filled sequences
    ///
    /// Panics if `default_len > default_cap`.
    #[track_caller]
    pub fn new(default_len: usize, default_cap: usize) -> Self {
        Self::with_lifecycle(
            SequencePolicy::default_values(),
            SequenceConfig::new(default_len, default_cap),
        )
    }

    /// Create a pool of `T::default()`-filled sequences, reporting an invalid
    /// shape as an error
    pub fn try_new(default_len: usize, default_cap: usize) -> RecycleResult<Self> {
        Self::try_with_lifecycle(
            SequencePolicy::default_values(),
            SequenceConfig::try_new(default_len, default_cap)?,
        )
    }
}

impl<T: 'static> SequencePool<T> {
    /// Create a pool whose bulk operations are derived from an element lifecycle
    #[track_caller]
    pub fn from_elements<E>(element: E, config: SequenceConfig) -> Self
    where
        E: Lifecycle<T> + 'static,
    {
        Self::with_lifecycle(SequencePolicy::from_elements(element), config)
    }
}

impl<T, L: SequenceLifecycle<T>> SequencePool<T, L> {
    /// Create a pool with a custom lifecycle and configuration
    ///
    /// Panics if the configuration is invalid.
    #[track_caller]
    pub fn with_lifecycle(lifecycle: L, config: SequenceConfig) -> Self {
        fatal(Self::try_with_lifecycle(lifecycle, config))
    }

    /// Create a pool, reporting an invalid configuration as an error
    pub fn try_with_lifecycle(lifecycle: L, config: SequenceConfig) -> RecycleResult<Self> {
        config.validate()?;

        let pool = Self {
            free: SegQueue::new(),
            lifecycle,
            counters: PoolCounters::default(),
            config,
        };

        for _ in 0..pool.config.pre_warm {
            let seq = pool.construct();
            pool.free.push(seq);
        }

        #[cfg(feature = "logging")]
        debug!(
            pool = %pool.config.name,
            element_type = core::any::type_name::<T>(),
            default_len = pool.config.default_len,
            default_cap = pool.config.default_cap,
            pre_warm = pool.config.pre_warm,
            "sequence pool created"
        );

        Ok(pool)
    }

    /// Take a sequence, recycled or freshly allocated
    pub fn get(&self) -> Vec<T> {
        let (seq, reused) = match self.free.pop() {
            Some(seq) => (seq, true),
            None => (self.construct(), false),
        };
        self.counters.record_get(reused);
        seq
    }

    /// Truncate `seq` to length zero and return it to the free list
    pub fn put(&self, seq: Vec<T>) {
        let seq = self.lifecycle.reset(seq);
        self.free.push(seq);
        self.counters.record_put();
    }

    /// Permanently remove a checked-out sequence, running the release policy
    pub fn discard(&self, seq: Vec<T>) {
        drop(self.lifecycle.release(seq));
        self.counters.record_discard();
    }

    /// Sequences currently checked out
    pub fn len(&self) -> i64 {
        self.counters.outstanding()
    }

    /// Whether no sequence is checked out
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// High-water mark: times the allocate policy has run
    pub fn cap(&self) -> i64 {
        self.counters.constructed()
    }

    /// Sequences waiting on the free list
    pub fn idle(&self) -> usize {
        self.free.len()
    }

    /// Snapshot of the pool counters
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.free.len())
    }

    /// Pool configuration
    pub fn config(&self) -> &SequenceConfig {
        &self.config
    }

    /// Pool name from the configuration
    pub fn name(&self) -> &str {
        &self.config.name
    }

    fn construct(&self) -> Vec<T> {
        let seq = self
            .lifecycle
            .allocate(self.config.default_len, self.config.default_cap);
        let _constructed = self.counters.record_construction();

        #[cfg(feature = "logging")]
        trace!(pool = %self.config.name, constructed = _constructed, "allocated new sequence");

        seq
    }
}

impl<T, L: SequenceLifecycle<T>> SyncPool<Vec<T>> for SequencePool<T, L> {
    fn get(&self) -> Vec<T> {
        Self::get(self)
    }

    fn put(&self, value: Vec<T>) {
        Self::put(self, value);
    }

    fn len(&self) -> i64 {
        Self::len(self)
    }

    fn cap(&self) -> i64 {
        Self::cap(self)
    }
}

impl<T, L: SequenceLifecycle<T>> Drop for SequencePool<T, L> {
    fn drop(&mut self) {
        while let Some(seq) = self.free.pop() {
            drop(self.lifecycle.release(seq));
        }
    }
}

impl<T, L: SequenceLifecycle<T>> fmt::Debug for SequencePool<T, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePool")
            .field("config", &self.config)
            .field("element", &core::any::type_name::<T>())
            .field("stats", &self.stats())
            .finish_non_exhaustive()
    }
}
