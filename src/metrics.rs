//! Maintenance counters.
//!
//! ## Metrics
//!
//! | Metric | Meaning |
//! |--------|---------|
//! | `element_registry_closed_total` | Elements closed |
//! | `element_registry_skipped_total` | Submitted ids left untouched |
//! | `element_registry_opened_total` | Elements opened by replenishment |
//! | `element_registry_truncated_total` | Submitted ids dropped by the batch limit |
//! | `element_registry_maintenance_runs_total` | `perform_maintenance` calls |
//!
//! Backends implement [`MaintenanceMetrics`]; the crate ships a no-op and an
//! in-memory implementation.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::MaintenanceReport;

/// Elements closed.
pub const CLOSED_TOTAL: &str = "element_registry_closed_total";
/// Submitted ids left untouched.
pub const SKIPPED_TOTAL: &str = "element_registry_skipped_total";
/// Elements opened by replenishment.
pub const OPENED_TOTAL: &str = "element_registry_opened_total";
/// Submitted ids dropped by the batch limit.
pub const TRUNCATED_TOTAL: &str = "element_registry_truncated_total";
/// Maintenance runs.
pub const RUNS_TOTAL: &str = "element_registry_maintenance_runs_total";

/// Counter interface for a metrics backend.
pub trait MaintenanceMetrics: Send + Sync {
    /// Increment a counter by `value`.
    fn increment_by(&self, metric_name: &str, value: u64, labels: &[(&str, &str)]);

    /// Increment a counter by 1.
    fn increment(&self, metric_name: &str, labels: &[(&str, &str)]) {
        self.increment_by(metric_name, 1, labels);
    }

    /// Record every counter for one maintenance run.
    fn record_report(&self, report: &MaintenanceReport) {
        let outcome = if report.mutated() { "mutated" } else { "noop" };
        self.increment(RUNS_TOTAL, &[("outcome", outcome)]);

        let counts = [
            (CLOSED_TOTAL, report.closed.len()),
            (SKIPPED_TOTAL, report.skipped.len()),
            (OPENED_TOTAL, report.opened.len()),
            (TRUNCATED_TOTAL, report.truncated),
        ];
        for (metric, count) in counts {
            if count > 0 {
                self.increment_by(metric, count as u64, &[]);
            }
        }
    }
}

/// No-op metrics implementation.
#[derive(Debug, Default)]
pub struct NoOpMetrics;

impl MaintenanceMetrics for NoOpMetrics {
    fn increment_by(&self, _metric_name: &str, _value: u64, _labels: &[(&str, &str)]) {}
}

/// In-memory metrics for testing.
#[derive(Debug, Default)]
pub struct TestMetrics {
    /// Counter values keyed by metric name and labels.
    pub counters: Mutex<HashMap<String, u64>>,
}

impl MaintenanceMetrics for TestMetrics {
    fn increment_by(&self, metric_name: &str, value: u64, labels: &[(&str, &str)]) {
        let key = format!("{}:{:?}", metric_name, labels);
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        *counters.entry(key).or_insert(0) += value;
    }
}

impl TestMetrics {
    /// Sum of a counter across all label sets.
    pub fn get_count(&self, metric_name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .iter()
            .filter(|(k, _)| k.split(':').next() == Some(metric_name))
            .map(|(_, v)| v)
            .sum()
    }
}
