//! Response envelope unwrapping shared by the JSON adapters.
//!
//! Upstream response shapes are not guaranteed, so every helper here degrades to
//! an empty record list plus a warning instead of failing.

use crate::types::RawRecord;
use serde_json::Value;
use tracing::warn;

/// Follow `path` through nested objects and return the item list found there.
pub fn records_at(source: &str, payload: &Value, path: &[&str]) -> Vec<RawRecord> {
    let mut current = payload;
    for key in path {
        match current.get(*key) {
            Some(next) => current = next,
            None => {
                warn!(
                    source = %source,
                    "Response envelope has no '{}' (expected path '{}'); treating as zero records",
                    key,
                    path.join(".")
                );
                return Vec::new();
            }
        }
    }
    records_from_list(source, current)
}

/// Convert a JSON array into raw records, dropping items that are not objects.
pub fn records_from_list(source: &str, value: &Value) -> Vec<RawRecord> {
    let Some(items) = value.as_array() else {
        warn!(
            source = %source,
            "Expected a list of records but found {}; treating as zero records",
            kind_of(value)
        );
        return Vec::new();
    };

    let mut records = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map.clone()),
            other => warn!(source = %source, "Dropping item {} of kind {}", i, kind_of(other)),
        }
    }
    records
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
