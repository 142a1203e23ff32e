//! Target types for attribute mappings.
//!
//! This module defines `PrimitiveKind`, the closed set of built-in scalar
//! coercions, and `TypeName`, the type reference stored in every attribute
//! mapping. A `TypeName` is resolved exactly once, when a coercer is built:
//! either to a primitive kind known by the coercion registry, or to a value
//! type registered on the schema.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Built-in scalar coercion kinds.
///
/// # YAML Format
///
/// Kinds are written as plain strings; common aliases are accepted:
/// ```yaml
/// type: integer   # or: int
/// type: string    # or: text
/// type: datetime  # or: date_time, timestamp
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    /// Boolean value
    Boolean,

    /// 64-bit signed integer
    Integer,

    /// 64-bit IEEE 754 floating point
    Float,

    /// Exact decimal
    Decimal,

    /// UTF-8 text
    String,

    /// Raw bytes
    Binary,

    /// Calendar date (YYYY-MM-DD)
    Date,

    /// Time of day (HH:MM:SS)
    Time,

    /// UTC timestamp
    DateTime,

    /// UUID (128-bit)
    Uuid,

    /// Ordered list of values
    Array,

    /// Ordered list of values without duplicates
    Set,

    /// String-keyed map of values
    Map,
}

impl PrimitiveKind {
    /// Every primitive kind, in declaration order.
    pub const ALL: [PrimitiveKind; 13] = [
        Self::Boolean,
        Self::Integer,
        Self::Float,
        Self::Decimal,
        Self::String,
        Self::Binary,
        Self::Date,
        Self::Time,
        Self::DateTime,
        Self::Uuid,
        Self::Array,
        Self::Set,
        Self::Map,
    ];

    /// Canonical name used in schema files and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Decimal => "decimal",
            Self::String => "string",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::Time => "time",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Array => "array",
            Self::Set => "set",
            Self::Map => "map",
        }
    }

    /// Look up a kind by canonical name or alias (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Some(Self::Boolean),
            "integer" | "int" | "bigint" | "big_int" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "decimal" | "bigdecimal" | "big_decimal" | "numeric" => Some(Self::Decimal),
            "string" | "text" => Some(Self::String),
            "binary" | "bytes" | "blob" => Some(Self::Binary),
            "date" => Some(Self::Date),
            "time" => Some(Self::Time),
            "datetime" | "date_time" | "timestamp" => Some(Self::DateTime),
            "uuid" => Some(Self::Uuid),
            "array" | "list" => Some(Self::Array),
            "set" => Some(Self::Set),
            "map" | "hash" | "object" => Some(Self::Map),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Target type reference of an attribute mapping.
///
/// Either the name (or alias) of a [`PrimitiveKind`] or the name of a value
/// type registered on the schema. Which one it is gets decided when a coercer
/// is built, not when the schema is parsed, so a schema file can name value
/// types the program registers afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeName(String);

impl TypeName {
    /// Create a type reference from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The referenced name as written.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The primitive kind this name refers to, if any.
    pub fn primitive(&self) -> Option<PrimitiveKind> {
        PrimitiveKind::from_name(&self.0)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PrimitiveKind> for TypeName {
    fn from(kind: PrimitiveKind) -> Self {
        Self(kind.name().to_string())
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for TypeName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Serialize for TypeName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TypeName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Error;

        let name = String::deserialize(deserializer)?;
        if name.trim().is_empty() {
            return Err(D::Error::custom("type name must not be empty"));
        }
        Ok(Self(name))
    }
}
