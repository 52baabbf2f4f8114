//! Service state management.

use crate::policy::{env_or, ConfigError};
use crate::predicate::ClosurePredicate;
use crate::registry::SharedRegistry;

/// Default cap on ids accepted by one perform request.
pub const DEFAULT_MAX_PERFORM_IDS: usize = 1_000;

/// Shared service state.
///
/// Holds the registry handle and the request-level budget that sits in front
/// of `perform_maintenance`.
pub struct ServiceState<P: ?Sized> {
    /// The element registry.
    pub registry: SharedRegistry<P>,
    /// Max ids accepted by one perform request.
    max_perform_ids: usize,
}

impl<P: ClosurePredicate + ?Sized> ServiceState<P> {
    /// Create service state with the default request budget.
    pub fn new(registry: SharedRegistry<P>) -> Self {
        Self::with_max_perform_ids(registry, DEFAULT_MAX_PERFORM_IDS)
    }

    /// Create service state with an explicit request budget.
    pub fn with_max_perform_ids(registry: SharedRegistry<P>, max_perform_ids: usize) -> Self {
        Self {
            registry,
            max_perform_ids,
        }
    }

    /// Create service state reading `MAX_PERFORM_IDS` from the environment.
    pub fn from_env(registry: SharedRegistry<P>) -> Result<Self, ConfigError> {
        let max_perform_ids = env_or("MAX_PERFORM_IDS", DEFAULT_MAX_PERFORM_IDS)?;
        Ok(Self::with_max_perform_ids(registry, max_perform_ids))
    }

    /// Max ids accepted by one perform request.
    pub fn max_perform_ids(&self) -> usize {
        self.max_perform_ids
    }
}

impl<P: ?Sized> Clone for ServiceState<P> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            max_perform_ids: self.max_perform_ids,
        }
    }
}
