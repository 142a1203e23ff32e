//! Core types for the record-mapper workspace.
//!
//! This crate provides the foundational types shared by the coercion
//! registry, the coercer and the storage bridges:
//!
//! - [`Value`] - Loosely-typed value carried by records and entities
//! - [`Record`] / [`Attributes`] - Ordered field maps on either side of a coercion
//! - [`ValueObject`] / [`CustomValue`] / [`ValueType`] - Value objects for custom coercions
//! - [`PrimitiveKind`] / [`TypeName`] - Target types of attribute mappings
//! - [`AttributeSchema`] - Attribute mappings of one collection, loadable from YAML
//!
//! # Architecture
//!
//! ```text
//! mapping-core (this crate)
//!    │
//!    ├─── coercions    (primitive coercion registry)
//!    ├─── coercer      (compiles a schema into entity <-> record conversions)
//!    └─── json-types   (Value <-> JSON for adapters and the CLI)
//! ```
//!
//! # Example
//!
//! ```rust
//! use mapping_core::{AttributeSchema, PrimitiveKind};
//!
//! let schema = AttributeSchema::builder("users", "User")
//!     .attribute("id", PrimitiveKind::Integer)
//!     .attribute_as("name", "full_name", PrimitiveKind::String)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(schema.record_fields(), vec!["id", "full_name"]);
//! ```

pub mod schema;
pub mod types;
pub mod values;

pub use schema::{AttributeMapping, AttributeSchema, SchemaBuilder, SchemaError};
pub use types::{PrimitiveKind, TypeName};
pub use values::{
    Attributes, BoxError, CustomValue, Record, Value, ValueObject, ValueType, ValueTypes,
};
