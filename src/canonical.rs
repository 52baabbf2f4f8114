//! Canonical serialization for deterministic fingerprints.
//!
//! Registry snapshots and configuration hashes are computed over canonical
//! JSON bytes so the same state always yields the same fingerprint.
//!
//! - Struct fields serialize in declaration order
//! - Vectors serialize in index order
//! - Only ordered collections are hashed

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes, reporting failures.
pub fn try_canonical_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(value)
}

/// Serialize a value to canonical JSON bytes.
///
/// Values hashed by this crate are plain structs, integers and strings, for
/// which serialization cannot fail. A failure is logged at `warn` and yields
/// an empty byte string; use [`try_canonical_bytes`] to handle it instead.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    match try_canonical_bytes(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                error = %e,
                type_name = std::any::type_name::<T>(),
                "canonical serialization failed, hashing empty bytes"
            );
            Vec::new()
        }
    }
}

/// Compute the canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute the canonical hash as a 16-character hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Window {
        cursor: usize,
        ids: Vec<u64>,
    }

    #[test]
    fn test_determinism() {
        let w = Window { cursor: 3, ids: vec![3, 4, 5] };
        assert_eq!(canonical_hash(&w), canonical_hash(&w));
        assert_eq!(canonical_hash_hex(&w).len(), 16);
    }

    #[test]
    fn test_serialization_failure_is_reported() {
        use std::collections::BTreeMap;

        // JSON object keys must be strings.
        let bad: BTreeMap<(u8, u8), u8> = BTreeMap::from([((1, 2), 3)]);
        assert!(try_canonical_bytes(&bad).is_err());
        assert!(to_canonical_bytes(&bad).is_empty());

        let w = Window { cursor: 1, ids: vec![1] };
        assert_eq!(try_canonical_bytes(&w).unwrap(), to_canonical_bytes(&w));
    }

    #[test]
    fn test_order_sensitive() {
        let a = Window { cursor: 0, ids: vec![1, 2] };
        let b = Window { cursor: 0, ids: vec![2, 1] };
        assert_ne!(canonical_hash(&a), canonical_hash(&b));
    }
}
