//! Built-in scalar coercion functions.
//!
//! Every function takes one raw value and returns the value converted to its
//! primitive kind. `Null` passes through all of them unchanged; value
//! objects are coerced through their raw form.

use crate::error::CoercionError;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use indexmap::IndexMap;
use mapping_core::{PrimitiveKind, Value};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

/// Signature shared by all primitive coercions.
pub type CoercionFn = fn(Value) -> Result<Value, CoercionError>;

/// The built-in coercion function for `kind`.
pub fn default_coercion(kind: PrimitiveKind) -> CoercionFn {
    match kind {
        PrimitiveKind::Boolean => coerce_boolean,
        PrimitiveKind::Integer => coerce_integer,
        PrimitiveKind::Float => coerce_float,
        PrimitiveKind::Decimal => coerce_decimal,
        PrimitiveKind::String => coerce_string,
        PrimitiveKind::Binary => coerce_binary,
        PrimitiveKind::Date => coerce_date,
        PrimitiveKind::Time => coerce_time,
        PrimitiveKind::DateTime => coerce_datetime,
        PrimitiveKind::Uuid => coerce_uuid,
        PrimitiveKind::Array => coerce_array,
        PrimitiveKind::Set => coerce_set,
        PrimitiveKind::Map => coerce_map,
    }
}

fn invalid(value: &Value, kind: PrimitiveKind, message: impl Into<String>) -> CoercionError {
    CoercionError::new(value, kind.name(), message)
}

fn unsupported(value: &Value, kind: PrimitiveKind) -> CoercionError {
    invalid(
        value,
        kind,
        format!("cannot coerce a {} value", value.kind_label()),
    )
}

/// Coerce to boolean.
///
/// Numbers are true when greater than zero; strings are parsed leniently.
pub fn coerce_boolean(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Bool(_) => Ok(value),
        Value::Int(i) => Ok(Value::Bool(i > 0)),
        Value::Float(f) => Ok(Value::Bool(f > 0.0)),
        Value::Decimal(d) => Ok(Value::Bool(d > Decimal::ZERO)),
        Value::String(ref s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "t" | "y" | "on" => Ok(Value::Bool(true)),
            "false" | "0" | "no" | "f" | "n" | "off" => Ok(Value::Bool(false)),
            _ => Err(invalid(&value, PrimitiveKind::Boolean, "Invalid boolean value")),
        },
        Value::Custom(c) => coerce_boolean(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Boolean)),
    }
}

/// Coerce to a 64-bit integer. Floats and decimals are truncated.
pub fn coerce_integer(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Int(_) => Ok(value),
        Value::Float(f) => {
            if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
                Ok(Value::Int(f.trunc() as i64))
            } else {
                Err(invalid(&value, PrimitiveKind::Integer, "Float out of integer range"))
            }
        }
        Value::Decimal(d) => d
            .trunc()
            .to_i64()
            .map(Value::Int)
            .ok_or_else(|| invalid(&value, PrimitiveKind::Integer, "Decimal out of integer range")),
        Value::String(ref s) => s
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| invalid(&value, PrimitiveKind::Integer, "Invalid integer")),
        Value::Custom(c) => coerce_integer(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Integer)),
    }
}

/// Coerce to a 64-bit float.
pub fn coerce_float(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Float(_) => Ok(value),
        Value::Int(i) => Ok(Value::Float(i as f64)),
        Value::Decimal(d) => d
            .to_f64()
            .map(Value::Float)
            .ok_or_else(|| invalid(&value, PrimitiveKind::Float, "Decimal out of float range")),
        Value::String(ref s) => match s.trim().parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(Value::Float(f)),
            _ => Err(invalid(&value, PrimitiveKind::Float, "Invalid float")),
        },
        Value::Custom(c) => coerce_float(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Float)),
    }
}

/// Coerce to an exact decimal.
pub fn coerce_decimal(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Decimal(_) => Ok(value),
        Value::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
        Value::Float(f) => Decimal::from_f64(f)
            .map(Value::Decimal)
            .ok_or_else(|| invalid(&value, PrimitiveKind::Decimal, "Float is not representable as a decimal")),
        Value::String(ref s) => {
            let trimmed = s.trim();
            Decimal::from_str(trimmed)
                .or_else(|_| Decimal::from_scientific(trimmed))
                .map(Value::Decimal)
                .map_err(|_| invalid(&value, PrimitiveKind::Decimal, "Invalid decimal"))
        }
        Value::Custom(c) => coerce_decimal(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Decimal)),
    }
}

/// Coerce to text. Scalars are rendered, bytes must be UTF-8.
pub fn coerce_string(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::String(_) => Ok(value),
        Value::Bool(b) => Ok(Value::String(b.to_string())),
        Value::Int(i) => Ok(Value::String(i.to_string())),
        Value::Float(f) => Ok(Value::String(f.to_string())),
        Value::Decimal(d) => Ok(Value::String(d.to_string())),
        Value::Uuid(u) => Ok(Value::String(u.to_string())),
        Value::Date(d) => Ok(Value::String(d.format("%Y-%m-%d").to_string())),
        Value::Time(t) => Ok(Value::String(t.format("%H:%M:%S%.f").to_string())),
        Value::DateTime(dt) => Ok(Value::String(dt.to_rfc3339())),
        Value::Bytes(b) => String::from_utf8(b).map(Value::String).map_err(|e| {
            CoercionError {
                value: format!("<{} bytes>", e.as_bytes().len()),
                expected: PrimitiveKind::String.name().to_string(),
                message: "Invalid UTF-8".to_string(),
            }
        }),
        Value::Custom(c) => coerce_string(c.to_raw()),
        Value::Array(_) | Value::Map(_) => Err(unsupported(&value, PrimitiveKind::String)),
    }
}

/// Coerce to bytes. Strings are read as standard base64.
pub fn coerce_binary(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Bytes(_) => Ok(value),
        Value::String(ref s) => base64::engine::general_purpose::STANDARD
            .decode(s.trim())
            .map(Value::Bytes)
            .map_err(|_| invalid(&value, PrimitiveKind::Binary, "Invalid base64")),
        Value::Uuid(u) => Ok(Value::Bytes(u.as_bytes().to_vec())),
        Value::Array(ref items) => items
            .iter()
            .map(|item| item.as_i64().and_then(|i| u8::try_from(i).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Value::Bytes)
            .ok_or_else(|| invalid(&value, PrimitiveKind::Binary, "Expected an array of bytes (0-255)")),
        Value::Custom(c) => coerce_binary(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Binary)),
    }
}

/// Coerce to a calendar date.
pub fn coerce_date(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Date(_) => Ok(value),
        Value::DateTime(dt) => Ok(Value::Date(dt.date_naive())),
        Value::String(ref s) => {
            let trimmed = s.trim();
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                return Ok(Value::Date(date));
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(Value::Date(dt.with_timezone(&Utc).date_naive()));
            }
            Err(invalid(
                &value,
                PrimitiveKind::Date,
                "Invalid date format (expected YYYY-MM-DD)",
            ))
        }
        Value::Custom(c) => coerce_date(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Date)),
    }
}

/// Coerce to a time of day.
pub fn coerce_time(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Time(_) => Ok(value),
        Value::DateTime(dt) => Ok(Value::Time(dt.time())),
        Value::String(ref s) => {
            let trimmed = s.trim();
            for format in ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"] {
                if let Ok(time) = NaiveTime::parse_from_str(trimmed, format) {
                    return Ok(Value::Time(time));
                }
            }
            Err(invalid(
                &value,
                PrimitiveKind::Time,
                "Invalid time format (expected HH:MM:SS)",
            ))
        }
        Value::Custom(c) => coerce_time(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Time)),
    }
}

/// Coerce to a UTC timestamp.
///
/// Dates become midnight UTC, integers are Unix seconds. Strings are tried
/// as RFC 3339 first, then as naive timestamps assumed to be UTC.
pub fn coerce_datetime(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::DateTime(_) => Ok(value),
        Value::Date(d) => Ok(Value::DateTime(d.and_time(NaiveTime::default()).and_utc())),
        Value::Int(secs) => DateTime::from_timestamp(secs, 0)
            .map(Value::DateTime)
            .ok_or_else(|| invalid(&value, PrimitiveKind::DateTime, "Timestamp out of range")),
        Value::String(ref s) => {
            let trimmed = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
                return Ok(Value::DateTime(dt.with_timezone(&Utc)));
            }
            for format in [
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%d %H:%M:%S",
            ] {
                if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, format) {
                    return Ok(Value::DateTime(ndt.and_utc()));
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
                return Ok(Value::DateTime(
                    date.and_time(NaiveTime::default()).and_utc(),
                ));
            }
            Err(invalid(&value, PrimitiveKind::DateTime, "Invalid datetime format"))
        }
        Value::Custom(c) => coerce_datetime(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::DateTime)),
    }
}

/// Coerce to a UUID.
pub fn coerce_uuid(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Uuid(_) => Ok(value),
        Value::String(ref s) => Uuid::parse_str(s.trim())
            .map(Value::Uuid)
            .map_err(|_| invalid(&value, PrimitiveKind::Uuid, "Invalid UUID")),
        Value::Bytes(ref b) => Uuid::from_slice(b)
            .map(Value::Uuid)
            .map_err(|_| invalid(&value, PrimitiveKind::Uuid, "Expected 16 bytes")),
        Value::Custom(c) => coerce_uuid(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Uuid)),
    }
}

/// Coerce to an array.
///
/// Maps become `[key, value]` pairs; any other value becomes a one-element
/// array.
pub fn coerce_array(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Array(_) => Ok(value),
        Value::Map(map) => Ok(Value::Array(
            map.into_iter()
                .map(|(key, item)| Value::Array(vec![Value::String(key), item]))
                .collect(),
        )),
        other => Ok(Value::Array(vec![other])),
    }
}

/// Coerce to an array without duplicates, keeping first occurrences.
pub fn coerce_set(value: Value) -> Result<Value, CoercionError> {
    match coerce_array(value)? {
        Value::Array(items) => {
            let mut unique: Vec<Value> = Vec::with_capacity(items.len());
            for item in items {
                if !unique.contains(&item) {
                    unique.push(item);
                }
            }
            Ok(Value::Array(unique))
        }
        other => Ok(other),
    }
}

/// Coerce to a map. Arrays must hold `[string, value]` pairs.
pub fn coerce_map(value: Value) -> Result<Value, CoercionError> {
    match value {
        Value::Null | Value::Map(_) => Ok(value),
        Value::Array(ref items) => {
            let mut map = IndexMap::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Array(pair) => match pair.as_slice() {
                        [Value::String(key), entry] => {
                            map.insert(key.clone(), entry.clone());
                        }
                        _ => {
                            return Err(invalid(
                                &value,
                                PrimitiveKind::Map,
                                "Expected [key, value] pairs with string keys",
                            ))
                        }
                    },
                    _ => {
                        return Err(invalid(
                            &value,
                            PrimitiveKind::Map,
                            "Expected [key, value] pairs with string keys",
                        ))
                    }
                }
            }
            Ok(Value::Map(map))
        }
        Value::Custom(c) => coerce_map(c.to_raw()),
        _ => Err(unsupported(&value, PrimitiveKind::Map)),
    }
}
