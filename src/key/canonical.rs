//! Canonical JSON rendering

use serde_json::{Map, Value};

/// Rebuild `value` with every object's keys sorted, recursively
///
/// Arrays keep their order; only object members are reordered.
pub fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut members: Vec<(&String, &Value)> = map.iter().collect();
            members.sort_by(|a, b| a.0.cmp(b.0));

            let mut sorted = Map::with_capacity(members.len());
            for (key, member) in members {
                sorted.insert(key.clone(), canonicalize(member));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        scalar => scalar.clone(),
    }
}

/// Compact JSON text of the canonical form of `value`
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}
