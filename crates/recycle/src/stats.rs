//! Usage accounting for pools
//!
//! Counters are plain atomics updated synchronously by the `get`/`put` call
//! that triggered them. They are meant for monitoring; a pool never makes a
//! decision based on them.

use core::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Live counters owned by a pool
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    outstanding: AtomicI64,
    constructed: AtomicI64,
    gets: AtomicU64,
    puts: AtomicU64,
    reuses: AtomicU64,
    discards: AtomicU64,
}

impl PoolCounters {
    /// Record a value handed out, fresh or recycled
    pub(crate) fn record_get(&self, reused: bool) {
        self.gets.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.reuses.fetch_add(1, Ordering::Relaxed);
        }
        self.outstanding.fetch_add(1, Ordering::AcqRel);
    }

    /// Record a value returned to the free list
    pub(crate) fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    /// Record a checked-out value that was permanently discarded
    pub(crate) fn record_discard(&self) {
        self.discards.fetch_add(1, Ordering::Relaxed);
        self.outstanding.fetch_sub(1, Ordering::AcqRel);
    }

    /// Record a run of the allocate policy; returns the new total
    pub(crate) fn record_construction(&self) -> i64 {
        self.constructed.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub(crate) fn outstanding(&self) -> i64 {
        self.outstanding.load(Ordering::Acquire)
    }

    pub(crate) fn constructed(&self) -> i64 {
        self.constructed.load(Ordering::Acquire)
    }

    pub(crate) fn snapshot(&self, idle: usize) -> PoolStats {
        PoolStats {
            outstanding: self.outstanding(),
            constructed: self.constructed(),
            gets: self.gets.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
            discards: self.discards.load(Ordering::Relaxed),
            idle,
        }
    }
}

/// Point-in-time view of a pool's counters
///
/// Fields are read one by one, so a snapshot taken while other threads are
/// inside `get`/`put` may mix values from slightly different moments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Values checked out and not yet returned or discarded
    pub outstanding: i64,
    /// Times the allocate policy has run
    pub constructed: i64,
    /// Total `get` calls
    pub gets: u64,
    /// Total `put` calls
    pub puts: u64,
    /// `get` calls served from the free list
    pub reuses: u64,
    /// Checked-out values removed with `discard`
    pub discards: u64,
    /// Values waiting on the free list
    pub idle: usize,
}

impl PoolStats {
    /// Share of `get` calls served without allocating
    pub fn reuse_rate(&self) -> f64 {
        if self.gets == 0 {
            0.0
        } else {
            self.reuses as f64 / self.gets as f64
        }
    }
}
