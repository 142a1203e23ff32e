//! Entity contract used by the coercer.

use mapping_core::{Attributes, Value};
use std::convert::Infallible;

/// A domain entity the coercer can read from and construct.
///
/// `read` must answer for every mapped non-identity field; `None` means the
/// entity does not expose the field at all, which is an error, while
/// `Some(Value::Null)` is an unset field. An absent identity reads the same
/// as an unset one.
pub trait Entity: Sized {
    /// Error returned by the constructor.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read a field by entity field name.
    fn read(&self, field: &str) -> Option<Value>;

    /// Construct an entity from coerced attributes.
    fn construct(attributes: Attributes) -> Result<Self, Self::Error>;
}

/// Entity backed by an ordered attribute map.
///
/// Useful wherever no dedicated entity type exists, such as command-line
/// tools and generic adapters. Every attribute handed to `construct` is
/// kept; fields that were never set read as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DynamicEntity {
    attributes: Attributes,
}

impl DynamicEntity {
    /// Create an entity without attributes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an attribute.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(field.into(), value.into());
        self
    }

    /// Set an attribute in place.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(field.into(), value.into());
    }

    /// Get an attribute.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.attributes.get(field)
    }

    /// All attributes, in insertion order.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Take the attributes out of the entity.
    pub fn into_attributes(self) -> Attributes {
        self.attributes
    }
}

impl From<Attributes> for DynamicEntity {
    fn from(attributes: Attributes) -> Self {
        Self { attributes }
    }
}

impl Entity for DynamicEntity {
    type Error = Infallible;

    fn read(&self, field: &str) -> Option<Value> {
        self.attributes.get(field).cloned()
    }

    fn construct(attributes: Attributes) -> Result<Self, Self::Error> {
        Ok(Self { attributes })
    }
}
