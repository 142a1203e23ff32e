//! Reverse conversion: JSON value → Value.
//!
//! JSON carries no type information beyond its own scalars, so values are
//! converted structurally; the coercer's primitive steps give them their
//! final type afterwards.

use mapping_core::{Attributes, Record, Value};

/// Error type for JSON record conversion.
#[derive(Debug, thiserror::Error)]
pub enum JsonRecordError {
    /// The line is not valid JSON
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The document is valid JSON but not an object
    #[error("Expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Convert a JSON value to a Value without type context.
///
/// Integers that fit in `i64` become `Int`, every other number `Float`.
pub fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => {
            Value::Array(items.into_iter().map(json_to_value).collect())
        }
        serde_json::Value::Object(obj) => Value::Map(json_object_to_map(obj)),
    }
}

fn json_object_to_map(obj: serde_json::Map<String, serde_json::Value>) -> Attributes {
    obj.into_iter()
        .map(|(key, value)| (key, json_to_value(value)))
        .collect()
}

/// Convert a JSON object to a record.
pub fn json_to_record(value: serde_json::Value) -> Result<Record, JsonRecordError> {
    match value {
        serde_json::Value::Object(obj) => Ok(json_object_to_map(obj)),
        other => Err(JsonRecordError::NotAnObject(json_kind(&other))),
    }
}

/// Parse a JSONL line into a record.
pub fn parse_jsonl_line(line: &str) -> Result<Record, JsonRecordError> {
    let value: serde_json::Value = serde_json::from_str(line)?;
    json_to_record(value)
}
