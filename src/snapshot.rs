//! Registry snapshot identity.
//!
//! A `RegistrySnapshot` fingerprints membership and configuration. Two
//! snapshots compare equal exactly when the registry holds the same ids in
//! the same order, has handed out the same ids so far, and runs under the
//! same parameters. Keepers can use it to tell whether state moved between
//! a check and the matching perform.

use serde::{Deserialize, Serialize};

use crate::canonical::canonical_hash_hex;
use crate::policy::RegistryConfig;
use crate::store::ElementStore;
use crate::types::ElementId;
use crate::REGISTRY_SCHEMA_VERSION;

/// Deterministic fingerprint of registry state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySnapshot {
    /// Unique identifier for this state (xxh64 of all components).
    pub snapshot_id: String,
    /// Number of elements.
    pub length: usize,
    /// Next id the store will assign.
    pub next_id: ElementId,
    /// Hash of the ordered element ids.
    pub element_id_hash: String,
    /// Hash of the registry parameters.
    pub params_hash: String,
    /// Schema version of the snapshot format.
    pub schema_version: String,
}

impl RegistrySnapshot {
    /// Compute a snapshot of `store` under `config`.
    pub fn compute<S: ElementStore + ?Sized>(store: &S, config: &RegistryConfig) -> Self {
        let ids: Vec<ElementId> = store.all().iter().map(|e| e.id).collect();
        let element_id_hash = canonical_hash_hex(&ids);
        let params_hash = config.params_hash();
        let length = ids.len();
        let next_id = store.next_id();

        let snapshot_id = canonical_hash_hex(&(
            length,
            next_id,
            &element_id_hash,
            &params_hash,
            REGISTRY_SCHEMA_VERSION,
        ));

        Self {
            snapshot_id,
            length,
            next_id,
            element_id_hash,
            params_hash,
            schema_version: REGISTRY_SCHEMA_VERSION.to_string(),
        }
    }
}
