//! JSON type conversions for mapping-core values.
//!
//! This crate provides the bridge between mapping-core's `Value` and
//! `Record` and JSON, for storage adapters that speak JSON and for the
//! command line.
//!
//! # Modules
//!
//! - [`forward`] - Value → JSON value conversion
//! - [`reverse`] - JSON value → Value conversion
//!
//! # Example
//!
//! ```
//! use json_types::{json_to_record, record_to_json, JsonValue};
//! use mapping_core::Value;
//!
//! // Forward: Value → JSON value
//! let json_val: JsonValue = Value::from("hello").into();
//! assert_eq!(json_val.into_inner(), serde_json::json!("hello"));
//!
//! // Reverse: JSON object → Record
//! let record = json_to_record(serde_json::json!({"id": 7})).unwrap();
//! assert_eq!(record.get("id"), Some(&Value::Int(7)));
//! assert_eq!(record_to_json(&record), serde_json::json!({"id": 7}));
//! ```

pub mod forward;
pub mod reverse;

pub use forward::{record_to_json, record_to_jsonl, JsonValue};
pub use reverse::{json_to_record, json_to_value, parse_jsonl_line, JsonRecordError};
