//! Configuration for recycling pools

use crate::error::{RecycleError, RecycleResult, fatal};

/// Configuration for value pools
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Name used in log events and configuration errors
    pub name: String,

    /// Number of values allocated eagerly at construction
    ///
    /// Pre-warmed values count toward the constructed high-water mark but not
    /// toward the outstanding count.
    pub pre_warm: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: "pool".to_string(),
            pre_warm: 0,
        }
    }
}

impl PoolConfig {
    /// Create a named configuration
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of pre-warmed values
    pub fn with_pre_warm(mut self, pre_warm: usize) -> Self {
        self.pre_warm = pre_warm;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> RecycleResult<()> {
        if self.name.is_empty() {
            return Err(RecycleError::invalid_config("pool name must not be empty"));
        }
        Ok(())
    }
}

/// Configuration for sequence pools
///
/// Every freshly allocated sequence has `default_len` elements and room for
/// `default_cap`. Recycled sequences keep whatever capacity they had.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceConfig {
    /// Name used in log events and configuration errors
    pub name: String,

    /// Length of a freshly allocated sequence
    pub default_len: usize,

    /// Capacity of a freshly allocated sequence
    pub default_cap: usize,

    /// Number of sequences allocated eagerly at construction
    pub pre_warm: usize,
}

impl SequenceConfig {
    /// Create a configuration, panicking if `default_len > default_cap`
    #[track_caller]
    pub fn new(default_len: usize, default_cap: usize) -> Self {
        fatal(Self::try_new(default_len, default_cap))
    }

    /// Create a configuration, rejecting `default_len > default_cap`
    pub fn try_new(default_len: usize, default_cap: usize) -> RecycleResult<Self> {
        let config = Self {
            name: "sequence pool".to_string(),
            default_len,
            default_cap,
            pre_warm: 0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the pool name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the number of pre-warmed sequences
    pub fn with_pre_warm(mut self, pre_warm: usize) -> Self {
        self.pre_warm = pre_warm;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> RecycleResult<()> {
        if self.default_len > self.default_cap {
            return Err(RecycleError::invalid_sequence_shape(
                self.default_len,
                self.default_cap,
            ));
        }
        if self.name.is_empty() {
            return Err(RecycleError::invalid_config("pool name must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.name, "pool");
        assert_eq!(config.pre_warm, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_pool_config_builders() {
        let config = PoolConfig::named("buffers").with_pre_warm(4);
        assert_eq!(config.name, "buffers");
        assert_eq!(config.pre_warm, 4);

        let config = config.with_name("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sequence_config_shape() {
        let config = SequenceConfig::new(2, 8);
        assert_eq!((config.default_len, config.default_cap), (2, 8));

        // len == cap is allowed
        assert!(SequenceConfig::try_new(8, 8).is_ok());

        let err = SequenceConfig::try_new(9, 8).unwrap_err();
        assert_eq!(err, RecycleError::InvalidSequenceShape { len: 9, cap: 8 });
    }

    #[test]
    #[should_panic(expected = "len(3) must be <= cap(1)")]
    fn test_sequence_config_new_panics() {
        let _ = SequenceConfig::new(3, 1);
    }
}
