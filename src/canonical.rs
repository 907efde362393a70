//! Canonical serialization for fingerprints.
//!
//! Partition snapshots and scoring policies are fingerprinted so that a
//! store can tell whether a write was computed against the partition it is
//! about to modify.
//!
//! ## Determinism Guarantees
//!
//! - Struct fields serialize in declaration order
//! - Vectors serialize in index order
//! - No HashMap in fingerprinted data: use BTreeMap or sorted Vecs

use serde::Serialize;
use xxhash_rust::xxh64::xxh64;

/// Serialize a value to canonical JSON bytes for hashing.
///
/// Only used with plain data types (no maps with non-string keys), for which
/// JSON serialization cannot fail.
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> Vec<u8> {
    serde_json::to_vec(value).expect("Canonical serialization failed")
}

/// Compute canonical hash of a serializable value.
pub fn canonical_hash<T: Serialize>(value: &T) -> u64 {
    xxh64(&to_canonical_bytes(value), 0)
}

/// Compute canonical hash and return as a 16-digit hex string.
pub fn canonical_hash_hex<T: Serialize>(value: &T) -> String {
    format!("{:016x}", canonical_hash(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Ranks {
        scope: &'static str,
        ids: Vec<&'static str>,
    }

    #[test]
    fn test_determinism() {
        let r = Ranks {
            scope: "loved/track",
            ids: vec!["a", "b"],
        };
        assert_eq!(canonical_hash(&r), canonical_hash(&r));
    }

    #[test]
    fn test_vec_order_matters() {
        let r1 = Ranks { scope: "s", ids: vec!["a", "b"] };
        let r2 = Ranks { scope: "s", ids: vec!["b", "a"] };
        assert_ne!(canonical_hash(&r1), canonical_hash(&r2));
    }

    #[test]
    fn test_hex_is_16_chars() {
        assert_eq!(canonical_hash_hex(&42u32).len(), 16);
    }
}
