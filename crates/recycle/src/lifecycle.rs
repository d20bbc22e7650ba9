//! Lifecycle policies consumed by the pools
//!
//! A pool never knows how to build or clean the values it recycles. It is
//! handed three operations instead:
//!
//! - *allocate* produces a fresh value,
//! - *reset* returns a value to the state *allocate* produces,
//! - *release* relinquishes a value's resources before it is discarded.
//!
//! A consumer must not be able to tell a freshly allocated value from a reset
//! one. *Release* never runs on a value that re-enters the pool.

use core::fmt;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::error::{PolicyKind, RecycleError, RecycleResult, fatal};

/// Allocate/reset/release triple for single values
///
/// Implement this on an adapter type to plug a value shape into
/// [`ValuePool`](crate::pool::ValuePool) without going through closures.
pub trait Lifecycle<T>: Send + Sync {
    /// Produce a fresh value. Must not fail.
    fn allocate(&self) -> T;

    /// Return `value` to the state produced by [`allocate`](Self::allocate)
    fn reset(&self, value: T) -> T;

    /// Relinquish the value's resources before it is discarded
    fn release(&self, value: T) {
        drop(value);
    }
}

/// Allocate/reset/release triple for whole sequences
pub trait SequenceLifecycle<T>: Send + Sync {
    /// Produce a sequence of `len` elements with room for `cap`
    fn allocate(&self, len: usize, cap: usize) -> Vec<T>;

    /// Truncate to length zero, keeping the allocated capacity
    fn reset(&self, seq: Vec<T>) -> Vec<T>;

    /// Release every element and give the backing storage back
    fn release(&self, seq: Vec<T>) -> Vec<T>;
}

/// Capability trait for types that know how to clean themselves
///
/// # Example
/// ```
/// use nebula_recycle::lifecycle::Poolable;
///
/// #[derive(Default)]
/// struct Frame {
///     seq: u64,
///     payload: Vec<u8>,
/// }
///
/// impl Poolable for Frame {
///     fn reset(&mut self) {
///         self.seq = 0;
///         self.payload.clear();
///     }
/// }
/// ```
pub trait Poolable: Send + 'static {
    /// Reset to the state `Default::default()` would produce
    ///
    /// Implementations may keep allocated capacity.
    fn reset(&mut self);

    /// Drop internal resources before the value is discarded
    fn release(&mut self) {}
}

impl Poolable for String {
    fn reset(&mut self) {
        self.clear();
    }

    fn release(&mut self) {
        *self = Self::new();
    }
}

impl<T: Send + 'static> Poolable for Vec<T> {
    fn reset(&mut self) {
        self.clear();
    }

    fn release(&mut self) {
        *self = Self::new();
    }
}

impl<T: Send + 'static> Poolable for VecDeque<T> {
    fn reset(&mut self) {
        self.clear();
    }

    fn release(&mut self) {
        *self = Self::new();
    }
}

impl<K, V> Poolable for HashMap<K, V>
where
    K: Send + 'static,
    V: Send + 'static,
{
    fn reset(&mut self) {
        self.clear();
    }

    fn release(&mut self) {
        *self = Self::new();
    }
}

type AllocateFn<T> = Arc<dyn Fn() -> T + Send + Sync>;
type ResetFn<T> = Arc<dyn Fn(T) -> T + Send + Sync>;
type ReleaseFn<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Closure-backed [`Lifecycle`]
///
/// Cloning shares the underlying closures.
///
/// # Example
/// ```
/// use nebula_recycle::lifecycle::{Lifecycle, LifecyclePolicy};
///
/// let policy = LifecyclePolicy::new(
///     || Vec::<u8>::with_capacity(64),
///     |mut v: Vec<u8>| {
///         v.clear();
///         v
///     },
/// );
///
/// let v = policy.reset(vec![1, 2, 3]);
/// assert!(v.is_empty());
/// ```
pub struct LifecyclePolicy<T> {
    allocate: AllocateFn<T>,
    reset: ResetFn<T>,
    release: Option<ReleaseFn<T>>,
}

impl<T: 'static> LifecyclePolicy<T> {
    /// Create a policy from allocate and reset closures; release drops
    pub fn new<A, R>(allocate: A, reset: R) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
        R: Fn(T) -> T + Send + Sync + 'static,
    {
        Self {
            allocate: Arc::new(allocate),
            reset: Arc::new(reset),
            release: None,
        }
    }

    /// Start a builder; allocate and reset are required
    pub fn builder() -> LifecyclePolicyBuilder<T> {
        LifecyclePolicyBuilder::default()
    }

    /// Set the release closure
    #[must_use = "builder methods must be chained or built"]
    pub fn with_release<D>(mut self, release: D) -> Self
    where
        D: Fn(T) + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(release));
        self
    }

    /// Allocate clones of `value`; reset replaces a value with a new clone
    pub fn from_value(value: T) -> Self
    where
        T: Clone + Send + Sync,
    {
        let template = Arc::new(value);
        let reset_template = Arc::clone(&template);
        Self::new(
            move || T::clone(&template),
            move |_| T::clone(&reset_template),
        )
    }

    /// Allocate and reset to `T::default()`
    pub fn default_values() -> Self
    where
        T: Default,
    {
        Self::new(T::default, |_| T::default())
    }
}

impl<T: Poolable + Default> LifecyclePolicy<T> {
    /// Policy for a [`Poolable`] type: allocate with `Default`, reset and
    /// release through the trait
    pub fn poolable() -> Self {
        Self::new(T::default, |mut value: T| {
            value.reset();
            value
        })
        .with_release(|mut value: T| value.release())
    }
}

impl<T> Lifecycle<T> for LifecyclePolicy<T> {
    fn allocate(&self) -> T {
        (self.allocate)()
    }

    fn reset(&self, value: T) -> T {
        (self.reset)(value)
    }

    fn release(&self, value: T) {
        match &self.release {
            Some(release) => release(value),
            None => drop(value),
        }
    }
}

impl<T> Clone for LifecyclePolicy<T> {
    fn clone(&self) -> Self {
        Self {
            allocate: Arc::clone(&self.allocate),
            reset: Arc::clone(&self.reset),
            release: self.release.clone(),
        }
    }
}

impl<T> fmt::Debug for LifecyclePolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecyclePolicy")
            .field("type", &core::any::type_name::<T>())
            .field("custom_release", &self.release.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`LifecyclePolicy`]
pub struct LifecyclePolicyBuilder<T> {
    label: String,
    allocate: Option<AllocateFn<T>>,
    reset: Option<ResetFn<T>>,
    release: Option<ReleaseFn<T>>,
}

impl<T> Default for LifecyclePolicyBuilder<T> {
    fn default() -> Self {
        Self {
            label: "ValuePool".to_string(),
            allocate: None,
            reset: None,
            release: None,
        }
    }
}

impl<T> LifecyclePolicyBuilder<T> {
    /// Name of the consumer, reported in missing-policy errors
    #[must_use = "builder methods must be chained or built"]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the allocate closure
    #[must_use = "builder methods must be chained or built"]
    pub fn allocate<A>(mut self, allocate: A) -> Self
    where
        A: Fn() -> T + Send + Sync + 'static,
    {
        self.allocate = Some(Arc::new(allocate));
        self
    }

    /// Set the reset closure
    #[must_use = "builder methods must be chained or built"]
    pub fn reset<R>(mut self, reset: R) -> Self
    where
        R: Fn(T) -> T + Send + Sync + 'static,
    {
        self.reset = Some(Arc::new(reset));
        self
    }

    /// Set the release closure; defaults to dropping the value
    #[must_use = "builder methods must be chained or built"]
    pub fn release<D>(mut self, release: D) -> Self
    where
        D: Fn(T) + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(release));
        self
    }

    /// Build the policy, reporting the first missing required closure
    pub fn try_build(self) -> RecycleResult<LifecyclePolicy<T>> {
        let Some(allocate) = self.allocate else {
            return Err(RecycleError::missing_policy(&self.label, PolicyKind::Allocate));
        };
        let Some(reset) = self.reset else {
            return Err(RecycleError::missing_policy(&self.label, PolicyKind::Reset));
        };
        Ok(LifecyclePolicy {
            allocate,
            reset,
            release: self.release,
        })
    }

    /// Build the policy, panicking if a required closure is missing
    #[track_caller]
    pub fn build(self) -> LifecyclePolicy<T> {
        fatal(self.try_build())
    }
}

type AllocateSeqFn<T> = Arc<dyn Fn(usize, usize) -> Vec<T> + Send + Sync>;
type ResetSeqFn<T> = Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;

/// Closure-backed [`SequenceLifecycle`]
pub struct SequencePolicy<T> {
    allocate: AllocateSeqFn<T>,
    reset: ResetSeqFn<T>,
    release: ResetSeqFn<T>,
}

impl<T: 'static> SequencePolicy<T> {
    /// Start a builder; allocate and reset are required
    pub fn builder() -> SequencePolicyBuilder<T> {
        SequencePolicyBuilder::default()
    }

    /// Derive the bulk operations from an element lifecycle
    ///
    /// - allocate fills `len` slots with `element.allocate()` in storage of
    ///   capacity `cap`,
    /// - reset releases every element and keeps the capacity,
    /// - release releases every element and frees the storage.
    ///
    /// Truncating a sequence discards its elements for good, which is why
    /// reset runs the element *release* rather than the element *reset*.
    pub fn from_elements<L>(element: L) -> Self
    where
        L: Lifecycle<T> + 'static,
    {
        let element = Arc::new(element);
        let for_reset = Arc::clone(&element);
        let for_release = Arc::clone(&element);
        Self {
            allocate: Arc::new(move |len, cap| {
                let mut seq = Vec::with_capacity(cap.max(len));
                seq.extend((0..len).map(|_| element.allocate()));
                seq
            }),
            reset: Arc::new(move |mut seq: Vec<T>| {
                for value in seq.drain(..) {
                    for_reset.release(value);
                }
                seq
            }),
            release: Arc::new(move |mut seq: Vec<T>| {
                for value in seq.drain(..) {
                    for_release.release(value);
                }
                Vec::new()
            }),
        }
    }

    /// Sequences of `T::default()` elements
    pub fn default_values() -> Self
    where
        T: Default + Send,
    {
        Self::from_elements(LifecyclePolicy::default_values())
    }
}

impl<T> SequenceLifecycle<T> for SequencePolicy<T> {
    fn allocate(&self, len: usize, cap: usize) -> Vec<T> {
        (self.allocate)(len, cap)
    }

    fn reset(&self, seq: Vec<T>) -> Vec<T> {
        (self.reset)(seq)
    }

    fn release(&self, seq: Vec<T>) -> Vec<T> {
        (self.release)(seq)
    }
}

impl<T> Clone for SequencePolicy<T> {
    fn clone(&self) -> Self {
        Self {
            allocate: Arc::clone(&self.allocate),
            reset: Arc::clone(&self.reset),
            release: Arc::clone(&self.release),
        }
    }
}

impl<T> fmt::Debug for SequencePolicy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequencePolicy")
            .field("element", &core::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

/// Builder for [`SequencePolicy`]
pub struct SequencePolicyBuilder<T> {
    label: String,
    allocate: Option<AllocateSeqFn<T>>,
    reset: Option<ResetSeqFn<T>>,
    release: Option<ResetSeqFn<T>>,
}

impl<T> Default for SequencePolicyBuilder<T> {
    fn default() -> Self {
        Self {
            label: "SequencePool".to_string(),
            allocate: None,
            reset: None,
            release: None,
        }
    }
}

impl<T: 'static> SequencePolicyBuilder<T> {
    /// Name of the consumer, reported in missing-policy errors
    #[must_use = "builder methods must be chained or built"]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Set the allocate closure, called with `(len, cap)`
    #[must_use = "builder methods must be chained or built"]
    pub fn allocate<A>(mut self, allocate: A) -> Self
    where
        A: Fn(usize, usize) -> Vec<T> + Send + Sync + 'static,
    {
        self.allocate = Some(Arc::new(allocate));
        self
    }

    /// Set the reset closure
    #[must_use = "builder methods must be chained or built"]
    pub fn reset<R>(mut self, reset: R) -> Self
    where
        R: Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static,
    {
        self.reset = Some(Arc::new(reset));
        self
    }

    /// Set the release closure; defaults to clearing and freeing the storage
    #[must_use = "builder methods must be chained or built"]
    pub fn release<D>(mut self, release: D) -> Self
    where
        D: Fn(Vec<T>) -> Vec<T> + Send + Sync + 'static,
    {
        self.release = Some(Arc::new(release));
        self
    }

    /// Build the policy, reporting the first missing required closure
    pub fn try_build(self) -> RecycleResult<SequencePolicy<T>> {
        let Some(allocate) = self.allocate else {
            return Err(RecycleError::missing_policy(&self.label, PolicyKind::Allocate));
        };
        let Some(reset) = self.reset else {
            return Err(RecycleError::missing_policy(&self.label, PolicyKind::Reset));
        };
        let release: ResetSeqFn<T> = match self.release {
            Some(release) => release,
            None => Arc::new(|_seq: Vec<T>| Vec::new()),
        };
        Ok(SequencePolicy {
            allocate,
            reset,
            release,
        })
    }

    /// Build the policy, panicking if a required closure is missing
    #[track_caller]
    pub fn build(self) -> SequencePolicy<T> {
        fatal(self.try_build())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Frame {
        seq: u64,
        payload: Vec<u8>,
    }

    impl Poolable for Frame {
        fn reset(&mut self) {
            self.seq = 0;
            self.payload.clear();
        }

        fn release(&mut self) {
            self.payload = Vec::new();
        }
    }

    #[test]
    fn test_string_poolable() {
        let mut s = String::from("hello world");
        s.reset();
        assert_eq!(s, "");
        assert!(s.capacity() > 0); // Capacity is preserved

        s.release();
        assert_eq!(s.capacity(), 0);
    }

    #[test]
    fn test_vec_poolable() {
        let mut v = vec![1, 2, 3, 4, 5];
        let cap = v.capacity();

        v.reset();
        assert!(v.is_empty());
        assert_eq!(v.capacity(), cap);
    }

    #[test]
    fn test_reset_matches_allocate() {
        let policy = LifecyclePolicy::<Frame>::poolable();
        let fresh = policy.allocate();

        let mut used = policy.allocate();
        used.seq = 9;
        used.payload.extend_from_slice(b"abc");
        let recycled = policy.reset(used);

        assert_eq!(recycled, fresh);
        assert!(recycled.payload.capacity() >= 3);
    }

    #[test]
    fn test_from_value() {
        let policy = LifecyclePolicy::from_value(7_u32);
        assert_eq!(policy.allocate(), 7);
        assert_eq!(policy.reset(99), 7);
    }

    #[test]
    fn test_default_release_drops() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let policy = LifecyclePolicy::<u8>::default_values()
            .with_release(move |_| {
                counter.fetch_add(1, Ordering::Relaxed);
            });

        policy.release(1);
        policy.release(2);
        assert_eq!(released.load(Ordering::Relaxed), 2);
        assert_eq!(policy.clone().allocate(), 0);
    }

    #[test]
    fn test_builder_reports_missing_policy() {
        let err = LifecyclePolicy::<u8>::builder()
            .reset(|_| 0)
            .try_build()
            .unwrap_err();
        assert_eq!(
            err,
            RecycleError::MissingPolicy {
                pool: "ValuePool".to_string(),
                policy: PolicyKind::Allocate,
            }
        );

        let err = LifecyclePolicy::<u8>::builder()
            .label("frames")
            .allocate(|| 0)
            .try_build()
            .unwrap_err();
        assert_eq!(err.to_string(), "reset policy is required for frames");
    }

    #[test]
    #[should_panic(expected = "allocate policy is required for ValuePool")]
    fn test_builder_build_panics() {
        let _ = LifecyclePolicy::<u8>::builder().build();
    }

    #[test]
    fn test_sequence_from_elements() {
        let policy = SequencePolicy::from_elements(LifecyclePolicy::from_value(5_i32));

        let seq = policy.allocate(2, 8);
        assert_eq!(seq, vec![5, 5]);
        assert_eq!(seq.capacity(), 8);

        let seq = policy.reset(vec![1, 2, 3]);
        assert!(seq.is_empty());
        assert!(seq.capacity() >= 3);

        let seq = policy.release(vec![1, 2, 3]);
        assert_eq!((seq.len(), seq.capacity()), (0, 0));
    }

    #[test]
    fn test_sequence_reset_releases_elements() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let element = LifecyclePolicy::<String>::poolable().with_release(move |_| {
            counter.fetch_add(1, Ordering::Relaxed);
        });
        let policy = SequencePolicy::from_elements(element);

        let seq = policy.reset(vec!["a".to_string(), "b".to_string()]);
        assert!(seq.is_empty());
        assert_eq!(released.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn test_sequence_builder() {
        let err = SequencePolicy::<u8>::builder()
            .allocate(|len, cap| {
                let mut v = Vec::with_capacity(cap);
                v.resize(len, 0);
                v
            })
            .try_build()
            .unwrap_err();
        assert_eq!(err.code(), "RECYCLE:CONFIG:MISSING_POLICY");

        let policy = SequencePolicy::<u8>::builder()
            .allocate(|len, cap| {
                let mut v = Vec::with_capacity(cap);
                v.resize(len, 0);
                v
            })
            .reset(|mut v| {
                v.clear();
                v
            })
            .build();
        let seq = policy.release(vec![1, 2]);
        assert_eq!(seq.capacity(), 0);
    }
}
