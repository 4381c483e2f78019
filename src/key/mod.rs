//! Cache key derivation
//!
//! Keys are built from a namespace and a serializable payload. The payload is
//! canonicalized first so two structurally equal payloads always map to the
//! same key, whatever the order their fields were inserted in.

mod canonical;

pub use canonical::{canonical_json, canonicalize};

use crate::error::{CacheError, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Separator between the namespace and the payload digest
pub const KEY_SEPARATOR: char = ':';

/// Derive the cache key for `payload` under `namespace`
///
/// The result has the form `"{namespace}:{sha256-hex}"`, so every key of a
/// namespace shares the `"{namespace}:"` prefix.
pub fn build_key<T>(namespace: &str, payload: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    if namespace.is_empty() {
        return Err(CacheError::InvalidNamespace);
    }

    let value = serde_json::to_value(payload)?;
    let digest = payload_digest(&canonical_json(&value));

    Ok(format!("{}{}{}", namespace, KEY_SEPARATOR, digest))
}

/// Prefix shared by every key built under `namespace`
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}{}", namespace, KEY_SEPARATOR)
}

fn payload_digest(canonical: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::{Error as _, Serializer};
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_field_order_does_not_matter() {
        let a = build_key("ns", &json!({"a": 1, "b": 2})).unwrap();
        let b = build_key("ns", &json!({"b": 2, "a": 1})).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_nested_field_order_does_not_matter() {
        #[derive(Serialize)]
        struct Filters {
            status: &'static str,
            page: u32,
        }
        #[derive(Serialize)]
        struct Query {
            owner_id: u64,
            filters: Filters,
        }

        let typed = build_key(
            "freelancer:operations-hq",
            &Query {
                owner_id: 7,
                filters: Filters { status: "open", page: 2 },
            },
        )
        .unwrap();
        let loose = build_key(
            "freelancer:operations-hq",
            &json!({"filters": {"page": 2, "status": "open"}, "owner_id": 7}),
        )
        .unwrap();

        assert_eq!(typed, loose);
    }

    #[test]
    fn test_distinct_payloads_distinct_keys() {
        let a = build_key("ns", &json!({"a": 1})).unwrap();
        let b = build_key("ns", &json!({"a": 2})).unwrap();
        let c = build_key("ns", &json!([1, 2])).unwrap();
        let d = build_key("ns", &json!([2, 1])).unwrap();

        assert_ne!(a, b);
        assert_ne!(c, d);
    }

    #[test]
    fn test_key_format() {
        let key = build_key("catalog:insights", &json!({"id": 1})).unwrap();
        let digest = key.strip_prefix(&namespace_prefix("catalog:insights")).unwrap();

        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_namespace_changes_key() {
        let a = build_key("finance", &json!({"id": 1})).unwrap();
        let b = build_key("support", &json!({"id": 1})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let err = build_key("", &json!({})).unwrap_err();
        assert!(matches!(err, CacheError::InvalidNamespace));
    }

    #[test]
    fn test_unserializable_map_keys_rejected() {
        let mut payload = HashMap::new();
        payload.insert((1, 2), "pair");

        let err = build_key("ns", &payload).unwrap_err();
        assert!(matches!(err, CacheError::Unserializable(_)));
    }

    #[test]
    fn test_failing_serialize_rejected() {
        struct Broken;

        impl Serialize for Broken {
            fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
                Err(S::Error::custom("cannot serialize"))
            }
        }

        let err = build_key("ns", &Broken).unwrap_err();
        assert!(matches!(err, CacheError::Unserializable(_)));
    }
}
