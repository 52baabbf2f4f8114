//! Maintenance outcome reporting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::element::ElementId;

/// Outcome of a store `close` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloseOutcome {
    /// Ids that were closed; their slots were vacated.
    pub closed: Vec<ElementId>,
    /// Ids that were not found or not closable.
    pub skipped: Vec<ElementId>,
}

/// Outcome of one `perform_maintenance` call.
///
/// Skipped ids are not failures: callers are expected to re-check with a
/// fresh scan rather than act on per-id signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceReport {
    /// Unique id of this maintenance run.
    pub run_id: Uuid,
    /// When the run was executed.
    pub executed_at: DateTime<Utc>,
    /// Ids closed in this run.
    pub closed: Vec<ElementId>,
    /// Submitted ids left untouched.
    pub skipped: Vec<ElementId>,
    /// Ids opened by replenishment.
    pub opened: Vec<ElementId>,
    /// Submitted ids dropped because the batch exceeded the batch limit.
    pub truncated: usize,
    /// Store length before the run.
    pub length_before: usize,
    /// Store length after closing and replenishing.
    pub length_after: usize,
}

impl MaintenanceReport {
    /// Whether the run changed the store.
    pub fn mutated(&self) -> bool {
        !self.closed.is_empty() || !self.opened.is_empty()
    }
}
