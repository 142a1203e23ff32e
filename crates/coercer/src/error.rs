use coercions::CoercionError;
use mapping_core::SchemaError;
use std::fmt;

/// Which side of a conversion lacked a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSide {
    /// The entity passed to `to_record`
    Entity,
    /// The record passed to `from_record`
    Record,
}

impl fmt::Display for FieldSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entity => f.write_str("entity"),
            Self::Record => f.write_str("record"),
        }
    }
}

/// Error type for building and running a coercer.
#[derive(Debug, thiserror::Error)]
pub enum CoercerError {
    /// The schema violates its invariants
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// A target type is neither a primitive nor a registered value type
    #[error("Cannot resolve type '{type_name}' of field '{field}' in collection '{collection}': not a primitive coercion or a registered value type")]
    SchemaResolution {
        collection: String,
        field: String,
        type_name: String,
    },

    /// A value was rejected by its field's coercion
    #[error("Failed to coerce field '{field}': {source}")]
    Coercion {
        field: String,
        #[source]
        source: CoercionError,
    },

    /// An expected field is absent from the input
    #[error("Missing field '{field}' on {side}")]
    MissingField { field: String, side: FieldSide },

    /// The record field is not mapped by this coercer
    #[error("Unknown record field: {0}")]
    UnknownField(String),

    /// The entity constructor rejected the coerced attributes
    #[error(transparent)]
    EntityConstruction(Box<dyn std::error::Error + Send + Sync>),
}

impl CoercerError {
    /// The coercion error behind this error, if it is one.
    pub fn as_coercion(&self) -> Option<&CoercionError> {
        match self {
            Self::Coercion { source, .. } => Some(source),
            _ => None,
        }
    }
}
