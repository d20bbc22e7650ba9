//! # nebula-recycle
//!
//! Object recycling and value deduplication for Nebula hot paths.
//!
//! This crate provides two independent primitives:
//! - Recycling pools that hand out reusable values and take them back,
//!   driven by allocate/reset/release lifecycle policies
//! - Intern tables that map equal values to one stable identifier and back
//!
//! ## Quick Start
//!
//! ```rust
//! use nebula_recycle::prelude::*;
//!
//! // Recycle buffers instead of reallocating them
//! let pool = SequencePool::<u8>::new(0, 4096);
//! let mut buf = pool.checkout();
//! buf.extend_from_slice(b"payload");
//! drop(buf); // truncated and returned to the pool
//! assert_eq!(pool.len(), 0);
//!
//! // Deduplicate repeated values
//! let mut names = InternTable::new();
//! let id = names.insert("workflow".to_string());
//! assert_eq!(names.insert("workflow".to_string()), id);
//! assert_eq!(names.value(id).map(String::as_str), Some("workflow"));
//! ```
//!
//! ## Features
//!
//! - `pool` (default): `ValuePool` and `SequencePool`
//! - `intern` (default): `InternTable` and `ConcurrentInternTable`
//! - `logging` (default): structured events through `tracing`
//! - `full`: Enable all features
//!
//! ## Architecture
//!
//! - Standalone error handling via [`error`] module
//! - Lifecycle policies in [`lifecycle`], separate from the pools that run them
//! - Pool sizing and naming in [`config`]
//! - Optional structured logging via `tracing` (feature: `logging`)

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Counters are i64 to match the signed outstanding count
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::return_self_not_must_use)]

// Error types
pub mod error;

// Core modules
pub mod config;
#[cfg(feature = "intern")]
#[cfg_attr(docsrs, doc(cfg(feature = "intern")))]
pub mod intern;
pub mod lifecycle;
#[cfg(feature = "pool")]
#[cfg_attr(docsrs, doc(cfg(feature = "pool")))]
pub mod pool;
#[cfg(feature = "pool")]
#[cfg_attr(docsrs, doc(cfg(feature = "pool")))]
pub mod stats;

// Re-export core types for convenience
pub use crate::config::{PoolConfig, SequenceConfig};
pub use crate::error::{RecycleError, RecycleResult};

// Public API exports
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::config::{PoolConfig, SequenceConfig};
    pub use crate::error::{PolicyKind, RecycleError, RecycleResult};
    pub use crate::lifecycle::{
        Lifecycle, LifecyclePolicy, Poolable, SequenceLifecycle, SequencePolicy,
    };

    #[cfg(feature = "pool")]
    pub use crate::pool::{Pooled, SequencePool, SyncPool, ValuePool};
    #[cfg(feature = "pool")]
    pub use crate::stats::PoolStats;

    #[cfg(feature = "intern")]
    pub use crate::intern::{ConcurrentInternTable, Intern, InternId, InternTable};
}
