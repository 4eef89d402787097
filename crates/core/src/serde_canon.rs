//! Canonical JSON serialization for model artifacts
//!
//! Object keys are sorted recursively and output carries no whitespace, so a
//! model and schema always serialize to the same bytes and hash to the same
//! BLAKE3 digest.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Serialize a value to canonical JSON (sorted keys, no whitespace)
pub fn to_canonical_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let canonical = canonicalize_value(serde_json::to_value(value)?);
    serde_json::to_string(&canonical)
}

/// Sort all object keys recursively; arrays keep their order
fn canonicalize_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize_value(v)))
                .collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize_value).collect()),
        other => other,
    }
}

/// BLAKE3 of the canonical JSON representation, hex encoded
pub fn hash_canonical_hex<T: Serialize>(value: &T) -> serde_json::Result<String> {
    let json = to_canonical_json(value)?;
    Ok(hex::encode(blake3::hash(json.as_bytes()).as_bytes()))
}
