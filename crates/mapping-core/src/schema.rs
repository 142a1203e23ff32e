//! Attribute schema definitions.
//!
//! An [`AttributeSchema`] describes one collection: which entity field maps
//! to which record field, the target type of every mapping, and which field
//! carries the entity identity. Schemas are built either in code with
//! [`AttributeSchema::builder`] or loaded from YAML:
//!
//! ```yaml
//! collection: users
//! entity: User
//! identity: id
//! attributes:
//!   - name: id
//!     type: integer
//!   - name: name
//!     as: full_name
//!     type: string
//! ```
//!
//! Every construction path validates the schema invariants; a schema that
//! exists is a schema whose field names are unique and whose identity field
//! is mapped.

use crate::types::TypeName;
use crate::values::{ValueObject, ValueType, ValueTypes};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

// ============================================================================
// Error Types
// ============================================================================

/// Error type for schema operations.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Error reading schema file
    #[error("Failed to read schema file: {0}")]
    IoError(#[from] std::io::Error),

    /// Error parsing YAML
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// Two mappings share an entity field
    #[error("Entity field '{field}' is mapped more than once in collection '{collection}'")]
    DuplicateEntityField { collection: String, field: String },

    /// Two mappings share a record field
    #[error("Record field '{field}' is mapped more than once in collection '{collection}'")]
    DuplicateRecordField { collection: String, field: String },

    /// No mapping for the identity field
    #[error("Identity field '{identity}' is not mapped in collection '{collection}'")]
    IdentityNotMapped { collection: String, identity: String },

    /// A collection, entity or field name is empty
    #[error("Empty {what} name in collection '{collection}'")]
    EmptyName {
        collection: String,
        what: &'static str,
    },
}

// ============================================================================
// Mappings
// ============================================================================

/// One entity field <-> record field <-> target type triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "AttributeMappingDef", into = "AttributeMappingDef")]
pub struct AttributeMapping {
    /// Field name on the entity
    pub entity_field: String,

    /// Field name in the record
    pub record_field: String,

    /// Target type of the coercion
    pub target_type: TypeName,
}

impl AttributeMapping {
    /// Create a mapping whose record field is named like the entity field.
    pub fn new(entity_field: impl Into<String>, target_type: impl Into<TypeName>) -> Self {
        let entity_field = entity_field.into();
        Self {
            record_field: entity_field.clone(),
            entity_field,
            target_type: target_type.into(),
        }
    }

    /// Create a mapping with a distinct record field name.
    pub fn mapped(
        entity_field: impl Into<String>,
        record_field: impl Into<String>,
        target_type: impl Into<TypeName>,
    ) -> Self {
        Self {
            entity_field: entity_field.into(),
            record_field: record_field.into(),
            target_type: target_type.into(),
        }
    }
}

/// Serialized form of an attribute mapping: `as` defaults to `name`.
#[derive(Serialize, Deserialize)]
struct AttributeMappingDef {
    name: String,
    #[serde(rename = "as", default, skip_serializing_if = "Option::is_none")]
    record_field: Option<String>,
    #[serde(rename = "type")]
    target_type: TypeName,
}

impl From<AttributeMappingDef> for AttributeMapping {
    fn from(def: AttributeMappingDef) -> Self {
        Self {
            record_field: def.record_field.unwrap_or_else(|| def.name.clone()),
            entity_field: def.name,
            target_type: def.target_type,
        }
    }
}

impl From<AttributeMapping> for AttributeMappingDef {
    fn from(mapping: AttributeMapping) -> Self {
        let record_field =
            (mapping.record_field != mapping.entity_field).then_some(mapping.record_field);
        Self {
            name: mapping.entity_field,
            record_field,
            target_type: mapping.target_type,
        }
    }
}

// ============================================================================
// Schema
// ============================================================================

fn default_identity() -> String {
    "id".to_string()
}

/// Attribute schema of one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributeSchema {
    /// Collection name
    pub collection: String,

    /// Entity type name
    pub entity: String,

    /// Entity field that carries the identity
    #[serde(default = "default_identity")]
    pub identity: String,

    /// Attribute mappings, in declaration order
    pub attributes: Vec<AttributeMapping>,

    /// Value types the mappings may name (not serialized)
    #[serde(skip)]
    value_types: ValueTypes,
}

impl AttributeSchema {
    /// Start building a schema in code.
    pub fn builder(collection: impl Into<String>, entity: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            collection: collection.into(),
            entity: entity.into(),
            identity: default_identity(),
            attributes: Vec::new(),
            value_types: ValueTypes::new(),
        }
    }

    /// Load schema from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SchemaError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse schema from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, SchemaError> {
        let schema: AttributeSchema = serde_yaml::from_str(yaml)?;
        schema.validate()?;
        Ok(schema)
    }

    /// Register a value type the mappings can reference by name.
    ///
    /// Used with schemas loaded from files, whose type names are plain
    /// strings until the program supplies the matching value types.
    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_types.register(value_type);
        self
    }

    /// Value types known to this schema.
    pub fn value_types(&self) -> &ValueTypes {
        &self.value_types
    }

    /// Check the schema invariants.
    pub fn validate(&self) -> Result<(), SchemaError> {
        if self.collection.trim().is_empty() {
            return Err(SchemaError::EmptyName {
                collection: self.collection.clone(),
                what: "collection",
            });
        }
        if self.entity.trim().is_empty() {
            return Err(self.empty_name("entity"));
        }
        if self.identity.trim().is_empty() {
            return Err(self.empty_name("identity"));
        }

        let mut entity_fields = HashSet::new();
        let mut record_fields = HashSet::new();
        for mapping in &self.attributes {
            if mapping.entity_field.trim().is_empty() {
                return Err(self.empty_name("entity field"));
            }
            if mapping.record_field.trim().is_empty() {
                return Err(self.empty_name("record field"));
            }
            if !entity_fields.insert(mapping.entity_field.as_str()) {
                return Err(SchemaError::DuplicateEntityField {
                    collection: self.collection.clone(),
                    field: mapping.entity_field.clone(),
                });
            }
            if !record_fields.insert(mapping.record_field.as_str()) {
                return Err(SchemaError::DuplicateRecordField {
                    collection: self.collection.clone(),
                    field: mapping.record_field.clone(),
                });
            }
        }

        if !entity_fields.contains(self.identity.as_str()) {
            return Err(SchemaError::IdentityNotMapped {
                collection: self.collection.clone(),
                identity: self.identity.clone(),
            });
        }

        Ok(())
    }

    fn empty_name(&self, what: &'static str) -> SchemaError {
        SchemaError::EmptyName {
            collection: self.collection.clone(),
            what,
        }
    }

    /// Get the mapping of an entity field.
    pub fn get_attribute(&self, entity_field: &str) -> Option<&AttributeMapping> {
        self.attributes
            .iter()
            .find(|m| m.entity_field == entity_field)
    }

    /// Get the mapping of a record field.
    pub fn get_record_field(&self, record_field: &str) -> Option<&AttributeMapping> {
        self.attributes
            .iter()
            .find(|m| m.record_field == record_field)
    }

    /// Get the mapping of the identity field.
    pub fn identity_mapping(&self) -> Option<&AttributeMapping> {
        self.get_attribute(&self.identity)
    }

    /// Get all entity field names, in declaration order.
    pub fn entity_fields(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .map(|m| m.entity_field.as_str())
            .collect()
    }

    /// Get all record field names, in declaration order.
    pub fn record_fields(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .map(|m| m.record_field.as_str())
            .collect()
    }
}

/// Builder for [`AttributeSchema`].
pub struct SchemaBuilder {
    collection: String,
    entity: String,
    identity: String,
    attributes: Vec<AttributeMapping>,
    value_types: ValueTypes,
}

impl SchemaBuilder {
    /// Set the identity field (defaults to `id`).
    pub fn identity(mut self, field: impl Into<String>) -> Self {
        self.identity = field.into();
        self
    }

    /// Map an entity field to a record field of the same name.
    pub fn attribute(
        mut self,
        entity_field: impl Into<String>,
        target_type: impl Into<TypeName>,
    ) -> Self {
        self.attributes
            .push(AttributeMapping::new(entity_field, target_type));
        self
    }

    /// Map an entity field to a differently named record field.
    pub fn attribute_as(
        mut self,
        entity_field: impl Into<String>,
        record_field: impl Into<String>,
        target_type: impl Into<TypeName>,
    ) -> Self {
        self.attributes.push(AttributeMapping::mapped(
            entity_field,
            record_field,
            target_type,
        ));
        self
    }

    /// Map an entity field to a record field through the value type `T`.
    pub fn value_attribute<T: ValueObject>(
        mut self,
        entity_field: impl Into<String>,
        record_field: impl Into<String>,
    ) -> Self {
        self.value_types.register(ValueType::of::<T>());
        self.attributes.push(AttributeMapping::mapped(
            entity_field,
            record_field,
            T::TYPE_NAME,
        ));
        self
    }

    /// Register a value type without mapping a field to it.
    pub fn value_type(mut self, value_type: ValueType) -> Self {
        self.value_types.register(value_type);
        self
    }

    /// Validate and build the schema.
    pub fn build(self) -> Result<AttributeSchema, SchemaError> {
        let schema = AttributeSchema {
            collection: self.collection,
            entity: self.entity,
            identity: self.identity,
            attributes: self.attributes,
            value_types: self.value_types,
        };
        schema.validate()?;
        Ok(schema)
    }
}
