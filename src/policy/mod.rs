//! Registry configuration and replenishment policy.

pub mod config;
pub mod replenish;

pub use config::{env_or, ConfigError, RegistryConfig};
pub use replenish::{replenish_count, ReplenishPolicy};
