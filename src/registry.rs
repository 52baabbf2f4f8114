//! Element registry: construction parameters plus the public entry points.
//!
//! ```text
//! keeper ──check_maintenance──▶ ClosureScanner ──▶ UpkeepCheck
//!        ──perform_maintenance─▶ ClosureExecutor ─▶ ElementStore (close + open)
//! readers ─get_* ─────────────▶ pagination ──────▶ ElementStore
//! ```
//!
//! [`ElementRegistry`] is single-owner: reads take `&self`, maintenance takes
//! `&mut self`. [`SharedRegistry`] puts it behind a read/write lock so
//! concurrent readers never observe a half-applied maintenance batch.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::executor::ClosureExecutor;
use crate::metrics::MaintenanceMetrics;
use crate::pagination;
use crate::policy::{ConfigError, RegistryConfig};
use crate::predicate::ClosurePredicate;
use crate::scanner::ClosureScanner;
use crate::snapshot::RegistrySnapshot;
use crate::store::{ElementStore, InMemoryElementStore};
use crate::types::{Element, ElementId, MaintenanceReport, Page, UpkeepCheck};

/// Error type for registry queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// No element with this id is open.
    #[error("Element not found: {0}")]
    NotFound(ElementId),
}

/// Bounded, self-replenishing element registry.
pub struct ElementRegistry<P: ?Sized, S = InMemoryElementStore> {
    store: S,
    predicate: Arc<P>,
    scanner: ClosureScanner,
    executor: ClosureExecutor,
}

impl<P: ClosurePredicate> ElementRegistry<P> {
    /// Create a registry seeded with `config.target_size` elements.
    pub fn new(config: RegistryConfig, predicate: P) -> Result<Self, ConfigError> {
        Self::with_shared_predicate(config, Arc::new(predicate))
    }
}

impl<P: ClosurePredicate + ?Sized> ElementRegistry<P> {
    /// Create a seeded registry whose predicate is also held elsewhere.
    pub fn with_shared_predicate(config: RegistryConfig, predicate: Arc<P>) -> Result<Self, ConfigError> {
        let store = InMemoryElementStore::seeded(config.target_size);
        Self::from_store(config, store, predicate)
    }
}

impl<P, S> ElementRegistry<P, S>
where
    P: ClosurePredicate + ?Sized,
    S: ElementStore,
{
    /// Create a registry over an existing store. The store is not seeded.
    ///
    /// Maintenance only ever grows a store through replenishment, so a store
    /// already above `target_size + range/2` is rejected.
    pub fn from_store(config: RegistryConfig, store: S, predicate: Arc<P>) -> Result<Self, ConfigError> {
        config.validate()?;
        if store.len() > config.max_len() {
            return Err(ConfigError::OversizedStore {
                len: store.len(),
                max: config.max_len(),
            });
        }

        tracing::info!(
            target_size = config.target_size,
            batch_limit = config.batch_limit,
            range = config.range,
            replenish = %config.replenish,
            length = store.len(),
            "element registry created"
        );

        Ok(Self {
            store,
            predicate,
            scanner: ClosureScanner::new(config.batch_limit),
            executor: ClosureExecutor::new(config),
        })
    }

    /// Report maintenance counters to a metrics backend.
    pub fn with_metrics(mut self, metrics: Arc<dyn MaintenanceMetrics>) -> Self {
        self.executor = ClosureExecutor::with_metrics(self.executor.config().clone(), metrics);
        self
    }

    /// Get an element by id.
    pub fn get_element(&self, id: ElementId) -> Result<Element, RegistryError> {
        self.store
            .get(id)
            .map(|record| Element::from_record(record, self.predicate.is_closable(record)))
            .ok_or(RegistryError::NotFound(id))
    }

    /// Number of open elements.
    pub fn get_all_elements_length(&self) -> usize {
        self.store.len()
    }

    /// Every open element in order.
    ///
    /// Unbounded: intended for bulk readers, not for keepers.
    pub fn get_all_elements(&self) -> Vec<Element> {
        self.store
            .all()
            .iter()
            .map(|record| Element::from_record(record, self.predicate.is_closable(record)))
            .collect()
    }

    /// One page of elements starting at `cursor`.
    pub fn get_elements_page(&self, cursor: usize, count: usize) -> Page {
        pagination::page(&self.store, self.predicate.as_ref(), cursor, count)
    }

    /// Scan one window for closable elements.
    pub fn check_maintenance(&self, cursor: usize, count: usize) -> UpkeepCheck {
        self.scanner.scan(&self.store, self.predicate.as_ref(), cursor, count)
    }

    /// Close the closable ids among `ids`, then replenish.
    pub fn perform_maintenance(&mut self, ids: &[ElementId]) -> MaintenanceReport {
        self.executor.execute(&mut self.store, self.predicate.as_ref(), ids)
    }

    /// Fingerprint of the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::compute(&self.store, self.executor.config())
    }

    /// Get the configuration.
    pub fn config(&self) -> &RegistryConfig {
        self.executor.config()
    }

    /// Get the closure predicate.
    pub fn predicate(&self) -> &Arc<P> {
        &self.predicate
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

/// Thread-safe handle to an [`ElementRegistry`].
///
/// Reads run concurrently under a shared lock. `perform_maintenance` holds
/// the exclusive lock for the whole close-and-replenish, so it is linearized
/// against every other call.
pub struct SharedRegistry<P: ?Sized, S = InMemoryElementStore> {
    inner: Arc<RwLock<ElementRegistry<P, S>>>,
}

impl<P: ?Sized, S> Clone for SharedRegistry<P, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P, S> SharedRegistry<P, S>
where
    P: ClosurePredicate + ?Sized,
    S: ElementStore,
{
    /// Wrap a registry.
    pub fn new(registry: ElementRegistry<P, S>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    /// Get an element by id.
    pub fn get_element(&self, id: ElementId) -> Result<Element, RegistryError> {
        self.inner.read().get_element(id)
    }

    /// Number of open elements.
    pub fn get_all_elements_length(&self) -> usize {
        self.inner.read().get_all_elements_length()
    }

    /// Every open element in order.
    pub fn get_all_elements(&self) -> Vec<Element> {
        self.inner.read().get_all_elements()
    }

    /// One page of elements starting at `cursor`.
    pub fn get_elements_page(&self, cursor: usize, count: usize) -> Page {
        self.inner.read().get_elements_page(cursor, count)
    }

    /// Scan one window for closable elements.
    pub fn check_maintenance(&self, cursor: usize, count: usize) -> UpkeepCheck {
        self.inner.read().check_maintenance(cursor, count)
    }

    /// Close the closable ids among `ids`, then replenish, atomically.
    pub fn perform_maintenance(&self, ids: &[ElementId]) -> MaintenanceReport {
        self.inner.write().perform_maintenance(ids)
    }

    /// Fingerprint of the current state.
    pub fn snapshot(&self) -> RegistrySnapshot {
        self.inner.read().snapshot()
    }

    /// Copy of the configuration.
    pub fn config(&self) -> RegistryConfig {
        self.inner.read().config().clone()
    }

    /// Get the closure predicate.
    pub fn predicate(&self) -> Arc<P> {
        Arc::clone(self.inner.read().predicate())
    }
}

impl<P, S> From<ElementRegistry<P, S>> for SharedRegistry<P, S>
where
    P: ClosurePredicate + ?Sized,
    S: ElementStore,
{
    fn from(registry: ElementRegistry<P, S>) -> Self {
        Self::new(registry)
    }
}
