//! Entity <-> record coercion.
//!
//! A [`Coercer`] is compiled once from an
//! [`AttributeSchema`](mapping_core::AttributeSchema) and a
//! [`PrimitiveCoercionRegistry`](coercions::PrimitiveCoercionRegistry). Each
//! mapping's target type is resolved at build time to either a primitive
//! coercion or a value-object constructor, so a misconfigured schema fails
//! before any data is converted.
//!
//! # Modules
//!
//! - [`coercer`] - [`Coercer`] and its compiled [`FieldCoercer`]s
//! - [`entity`] - The [`Entity`] contract and [`DynamicEntity`]
//! - [`config`] - [`CoercerConfig`]
//! - [`error`] - [`CoercerError`]
//!
//! # Conversions
//!
//! - `to_record` reads every mapped field from the entity, coerces it and
//!   stores it under its record field name. The identity field is omitted
//!   while the entity's identity is unset.
//! - `from_record` coerces every mapped record field and hands the resulting
//!   attributes to the entity constructor.
//! - `deserialize` coerces one bare value as a given record field would be.

pub mod coercer;
pub mod config;
pub mod entity;
pub mod error;

pub use coercer::{Coercer, CoercionKind, FieldCoercer};
pub use config::{CoercerConfig, MissingKeyPolicy};
pub use entity::{DynamicEntity, Entity};
pub use error::{CoercerError, FieldSide};
