//! Forward conversion: Value → JSON value.
//!
//! This module renders mapping-core `Value`s and records as JSON, the shape
//! JSON-based storage adapters and the command line write out.

use base64::Engine;
use mapping_core::{Record, Value};
use serde_json::json;

/// Wrapper for JSON values.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonValue(pub serde_json::Value);

impl JsonValue {
    /// Get the inner JSON value.
    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }

    /// Get a reference to the inner JSON value.
    pub fn as_inner(&self) -> &serde_json::Value {
        &self.0
    }
}

impl From<Value> for JsonValue {
    fn from(value: Value) -> Self {
        JsonValue(value_to_json(&value))
    }
}

impl From<&Value> for JsonValue {
    fn from(value: &Value) -> Self {
        JsonValue(value_to_json(value))
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => json!(*b),
        Value::Int(i) => json!(*i),
        // Non-finite floats have no JSON form
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        // Decimal - store as string to preserve precision
        Value::Decimal(d) => json!(d.to_string()),
        Value::String(s) => json!(s),
        Value::Bytes(b) => {
            let encoded = base64::engine::general_purpose::STANDARD.encode(b);
            json!(encoded)
        }
        Value::Uuid(u) => json!(u.to_string()),
        Value::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
        Value::Time(t) => json!(t.format("%H:%M:%S%.f").to_string()),
        Value::DateTime(dt) => json!(dt.to_rfc3339()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(map) => {
            let mut obj = serde_json::Map::new();
            for (key, item) in map {
                obj.insert(key.clone(), value_to_json(item));
            }
            serde_json::Value::Object(obj)
        }
        Value::Custom(custom) => value_to_json(&custom.to_raw()),
    }
}

/// Convert a record to a JSON object, keeping the record's field order.
pub fn record_to_json(record: &Record) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    for (name, value) in record {
        obj.insert(name.clone(), value_to_json(value));
    }
    serde_json::Value::Object(obj)
}

/// Convert a record to a JSONL line (JSON string with newline).
pub fn record_to_jsonl(record: &Record) -> Result<String, serde_json::Error> {
    let line = serde_json::to_string(&record_to_json(record))?;
    Ok(format!("{line}\n"))
}
