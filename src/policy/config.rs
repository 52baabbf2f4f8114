//! Registry construction parameters.
//!
//! The parameters are fixed at construction. `params_hash` gives a stable
//! fingerprint of them so snapshots taken under different configurations
//! never compare equal.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::replenish::ReplenishPolicy;
use crate::canonical::canonical_hash_hex;

/// Default number of elements seeded at construction.
pub const DEFAULT_TARGET_SIZE: usize = 100;
/// Default per-call batch limit.
pub const DEFAULT_BATCH_LIMIT: usize = 10;
/// Default total size slack.
pub const DEFAULT_RANGE: usize = 20;

/// Error type for invalid registry configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Batch limit must allow at least one element per call.
    #[error("batch_limit must be at least 1")]
    ZeroBatchLimit,
    /// An environment variable could not be parsed.
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidEnv {
        /// Variable name.
        key: String,
        /// Raw value.
        value: String,
        /// Parse failure.
        reason: String,
    },
    /// A probability outside `[0, 1]`.
    #[error("Probability must be within [0, 1], got {0}")]
    InvalidProbability(f64),
    /// A store handed to the registry is larger than maintenance can shrink.
    #[error("Store holds {len} elements, more than the {max} allowed by target_size + range/2")]
    OversizedStore {
        /// Elements in the store.
        len: usize,
        /// `target_size + range/2`.
        max: usize,
    },
}

/// Immutable configuration of an element registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Size the store is seeded with and maintained around.
    pub target_size: usize,
    /// Max elements examined by a scan and processed by an execute call.
    pub batch_limit: usize,
    /// Total size slack; the store stays within `target_size ± range/2`.
    pub range: usize,
    /// Replenishment sizing.
    #[serde(default)]
    pub replenish: ReplenishPolicy,
}

impl RegistryConfig {
    /// Create a validated configuration with the default replenish policy.
    pub fn new(target_size: usize, batch_limit: usize, range: usize) -> Result<Self, ConfigError> {
        let config = Self {
            target_size,
            batch_limit,
            range,
            replenish: ReplenishPolicy::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the replenish policy.
    pub fn with_replenish(mut self, replenish: ReplenishPolicy) -> Self {
        self.replenish = replenish;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_limit == 0 {
            return Err(ConfigError::ZeroBatchLimit);
        }
        Ok(())
    }

    /// Half of the range, rounded down.
    pub fn half_range(&self) -> usize {
        self.range / 2
    }

    /// Largest length the registry tolerates, `target_size + range/2`.
    pub fn max_len(&self) -> usize {
        self.target_size.saturating_add(self.half_range())
    }

    /// Whether `len` is within `target_size ± range/2`.
    pub fn within_tolerance(&self, len: usize) -> bool {
        len.abs_diff(self.target_size) <= self.half_range()
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `REGISTRY_TARGET_SIZE`, `REGISTRY_BATCH_LIMIT`, `REGISTRY_RANGE`
    /// and `REGISTRY_REPLENISH`. Unset variables fall back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            target_size: env_or("REGISTRY_TARGET_SIZE", defaults.target_size)?,
            batch_limit: env_or("REGISTRY_BATCH_LIMIT", defaults.batch_limit)?,
            range: env_or("REGISTRY_RANGE", defaults.range)?,
            replenish: env_or("REGISTRY_REPLENISH", defaults.replenish)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Stable hash of the parameters.
    pub fn params_hash(&self) -> String {
        canonical_hash_hex(self)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            batch_limit: DEFAULT_BATCH_LIMIT,
            range: DEFAULT_RANGE,
            replenish: ReplenishPolicy::default(),
        }
    }
}

/// Parse an environment variable, or return `default` when it is unset.
pub fn env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
                key: key.to_string(),
                value,
                reason: e.to_string(),
            })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.target_size, 100);
        assert_eq!(config.batch_limit, 10);
        assert_eq!(config.range, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_batch_limit_rejected() {
        assert_eq!(RegistryConfig::new(10, 0, 4), Err(ConfigError::ZeroBatchLimit));
    }

    #[test]
    fn test_within_tolerance() {
        let config = RegistryConfig::default();
        assert!(config.within_tolerance(90));
        assert!(config.within_tolerance(110));
        assert!(!config.within_tolerance(89));
        assert!(!config.within_tolerance(111));
    }

    #[test]
    fn test_odd_range_rounds_down() {
        let config = RegistryConfig::new(10, 2, 5).unwrap();
        assert_eq!(config.half_range(), 2);
        assert!(config.within_tolerance(8));
        assert!(!config.within_tolerance(7));
    }

    #[test]
    fn test_params_hash_changes() {
        let a = RegistryConfig::default();
        let b = RegistryConfig::default().with_replenish(ReplenishPolicy::Tolerance);
        assert_eq!(a.params_hash(), RegistryConfig::default().params_hash());
        assert_ne!(a.params_hash(), b.params_hash());
    }

    #[test]
    fn test_env_or_parses_and_rejects() {
        std::env::set_var("ELEMENT_REGISTRY_TEST_ENV_OR", "17");
        assert_eq!(env_or("ELEMENT_REGISTRY_TEST_ENV_OR", 3usize), Ok(17));

        std::env::set_var("ELEMENT_REGISTRY_TEST_ENV_OR", "many");
        assert!(matches!(
            env_or("ELEMENT_REGISTRY_TEST_ENV_OR", 3usize),
            Err(ConfigError::InvalidEnv { .. })
        ));

        std::env::remove_var("ELEMENT_REGISTRY_TEST_ENV_OR");
        assert_eq!(env_or("ELEMENT_REGISTRY_TEST_ENV_OR", 3usize), Ok(3));
    }
}
