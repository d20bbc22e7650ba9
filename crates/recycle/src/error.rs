//! Standalone error types for nebula-recycle
//!
//! Every variant here is a configuration error. Pools and tables have no
//! runtime failure modes: `get`, `put`, `insert`, `deduplicate` and `clear`
//! are total, and a lookup miss is an ordinary `None`.

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::error;

/// Lifecycle policy slot that can be missing from a pool configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyKind {
    /// Produces a fresh value
    Allocate,
    /// Returns a value to its canonical empty state
    Reset,
}

impl PolicyKind {
    /// Lower-case name used in messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allocate => "allocate",
            Self::Reset => "reset",
        }
    }
}

impl core::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recycling configuration errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecycleError {
    #[error("{policy} policy is required for {pool}")]
    MissingPolicy { pool: String, policy: PolicyKind },

    #[error("len({len}) must be <= cap({cap})")]
    InvalidSequenceShape { len: usize, cap: usize },

    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl RecycleError {
    /// Configuration errors halt construction; there is no partially usable pool.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::MissingPolicy { .. } | Self::InvalidSequenceShape { .. } | Self::InvalidConfig { .. }
        )
    }

    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingPolicy { .. } => "RECYCLE:CONFIG:MISSING_POLICY",
            Self::InvalidSequenceShape { .. } => "RECYCLE:CONFIG:SEQUENCE_SHAPE",
            Self::InvalidConfig { .. } => "RECYCLE:CONFIG:INVALID",
        }
    }

    /// Create missing policy error
    pub fn missing_policy(pool: &str, policy: PolicyKind) -> Self {
        let err = Self::MissingPolicy {
            pool: pool.to_string(),
            policy,
        };
        err.log();
        err
    }

    /// Create invalid sequence shape error
    pub fn invalid_sequence_shape(len: usize, cap: usize) -> Self {
        let err = Self::InvalidSequenceShape { len, cap };
        err.log();
        err
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        let err = Self::InvalidConfig {
            reason: reason.to_string(),
        };
        err.log();
        err
    }

    fn log(&self) {
        #[cfg(feature = "logging")]
        error!(code = self.code(), "{self}");
    }
}

/// Result type for recycling configuration
pub type RecycleResult<T> = Result<T, RecycleError>;

/// Unwraps a construction result, treating any error as fatal.
#[track_caller]
pub(crate) fn fatal<T>(result: RecycleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
