//! Closure executor: close a candidate batch, then replenish.
//!
//! ## Algorithm
//!
//! 1. De-duplicate the submitted ids, keeping first occurrences
//! 2. Keep at most `batch_limit` of them; the rest are reported as truncated
//! 3. Close every kept id the predicate reports closable, skip the others
//! 4. Open `replenish_count(len)` fresh elements into the vacated slots
//!
//! Skipped ids are not errors. A keeper that submits a stale candidate list
//! simply closes fewer elements and picks the rest up on its next scan.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::metrics::{MaintenanceMetrics, NoOpMetrics};
use crate::policy::{replenish_count, RegistryConfig};
use crate::predicate::ClosurePredicate;
use crate::store::ElementStore;
use crate::types::{ElementId, MaintenanceReport};

/// Closure executor.
#[derive(Clone)]
pub struct ClosureExecutor {
    config: RegistryConfig,
    metrics: Arc<dyn MaintenanceMetrics>,
}

impl std::fmt::Debug for ClosureExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClosureExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ClosureExecutor {
    /// Create an executor without metrics.
    pub fn new(config: RegistryConfig) -> Self {
        Self::with_metrics(config, Arc::new(NoOpMetrics))
    }

    /// Create an executor reporting to a metrics backend.
    pub fn with_metrics(config: RegistryConfig, metrics: Arc<dyn MaintenanceMetrics>) -> Self {
        Self { config, metrics }
    }

    /// Get the configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Close the closable ids among `ids` and replenish the store.
    ///
    /// The caller must hold exclusive access to `store` for the whole call.
    pub fn execute<S, P>(&self, store: &mut S, predicate: &P, ids: &[ElementId]) -> MaintenanceReport
    where
        S: ElementStore,
        P: ClosurePredicate + ?Sized,
    {
        let length_before = store.len();
        let (batch, truncated) = self.admit(ids);

        if truncated > 0 {
            tracing::warn!(
                submitted = ids.len(),
                batch_limit = self.config.batch_limit,
                truncated,
                "maintenance batch exceeds batch limit, extra ids ignored"
            );
        }

        let outcome = store.close(&batch, predicate);
        let opened = store.open(replenish_count(store.len(), &self.config));

        let report = MaintenanceReport {
            run_id: Uuid::new_v4(),
            executed_at: Utc::now(),
            closed: outcome.closed,
            skipped: outcome.skipped,
            opened,
            truncated,
            length_before,
            length_after: store.len(),
        };

        tracing::info!(
            run_id = %report.run_id,
            closed = report.closed.len(),
            skipped = report.skipped.len(),
            opened = report.opened.len(),
            truncated = report.truncated,
            length_before = report.length_before,
            length_after = report.length_after,
            within_tolerance = self.config.within_tolerance(report.length_after),
            "maintenance performed"
        );

        self.metrics.record_report(&report);
        report
    }

    /// De-duplicate and cap the submitted ids.
    fn admit(&self, ids: &[ElementId]) -> (Vec<ElementId>, usize) {
        let mut seen = HashSet::with_capacity(ids.len().min(self.config.batch_limit));
        let mut batch = Vec::with_capacity(ids.len().min(self.config.batch_limit));
        let mut truncated = 0;

        for &id in ids {
            if !seen.insert(id) {
                continue;
            }
            if batch.len() < self.config.batch_limit {
                batch.push(id);
            } else {
                truncated += 1;
            }
        }

        (batch, truncated)
    }
}
