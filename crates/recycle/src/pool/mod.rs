//! Recycling pools
//!
//! This module provides two pools sharing the [`SyncPool`] interface:
//! - `ValuePool`: recycles single values under a [`Lifecycle`](crate::lifecycle::Lifecycle)
//! - `SequencePool`: recycles `Vec`s, keeping their capacity across reuse
//!
//! Both keep an unbounded lock-free free list, so `get` and `put` never block
//! and never fail. Values are reset on the way in, not on the way out.

mod sequence;
mod value;

use core::fmt;
use core::ops::{Deref, DerefMut};

pub use sequence::SequencePool;
pub use value::ValuePool;

/// Interface shared by every pool in this module
pub trait SyncPool<T> {
    /// Take a value, recycled or freshly allocated
    fn get(&self) -> T;

    /// Reset `value` and make it available again
    fn put(&self, value: T);

    /// Values currently checked out
    fn len(&self) -> i64;

    /// Times the allocate policy has run
    fn cap(&self) -> i64;

    /// Whether no value is checked out
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take a value wrapped in a guard that puts it back on drop
    fn checkout(&self) -> Pooled<'_, Self, T>
    where
        Self: Sized,
    {
        Pooled {
            value: Some(self.get()),
            pool: self,
        }
    }
}

/// RAII wrapper for a checked-out value
///
/// The value goes back through [`SyncPool::put`] when the guard is dropped.
///
/// # Example
/// ```
/// use nebula_recycle::pool::{SyncPool, ValuePool};
///
/// let pool = ValuePool::new(String::new, |mut s: String| {
///     s.clear();
///     s
/// });
///
/// {
///     let mut s = pool.checkout();
///     s.push_str("Hello, World!");
///     assert_eq!(pool.len(), 1);
/// }
///
/// assert_eq!(pool.len(), 0);
/// assert_eq!(pool.get(), "");
/// ```
pub struct Pooled<'a, P: SyncPool<T>, T> {
    value: Option<T>,
    pool: &'a P,
}

impl<'a, P: SyncPool<T>, T> Pooled<'a, P, T> {
    /// Take the value out; it stays checked out until passed to `put`
    pub fn detach(mut self) -> T {
        match self.value.take() {
            Some(value) => value,
            None => unreachable!("pooled value taken twice"),
        }
    }

    /// Get reference to the pool
    pub fn pool(&self) -> &'a P {
        self.pool
    }
}

impl<P: SyncPool<T>, T> Deref for Pooled<'_, P, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match &self.value {
            Some(value) => value,
            None => unreachable!("pooled value used after detach"),
        }
    }
}

impl<P: SyncPool<T>, T> DerefMut for Pooled<'_, P, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match &mut self.value {
            Some(value) => value,
            None => unreachable!("pooled value used after detach"),
        }
    }
}

impl<P: SyncPool<T>, T> AsRef<T> for Pooled<'_, P, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<P: SyncPool<T>, T> AsMut<T> for Pooled<'_, P, T> {
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<P: SyncPool<T>, T> Drop for Pooled<'_, P, T> {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.pool.put(value);
        }
    }
}

impl<P: SyncPool<T>, T: fmt::Debug> fmt::Debug for Pooled<'_, P, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pooled").field(&self.value).finish()
    }
}
