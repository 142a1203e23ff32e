//! Primitive coercion registry.
//!
//! This crate provides the closed set of built-in scalar coercions the
//! coercer binds to attribute mappings whose target type names a
//! [`PrimitiveKind`].
//!
//! # Modules
//!
//! - [`primitive`] - The coercion functions, one per kind
//! - [`error`] - [`CoercionError`]
//!
//! # Example
//!
//! ```
//! use coercions::PrimitiveCoercionRegistry;
//! use mapping_core::Value;
//!
//! let registry = PrimitiveCoercionRegistry::standard();
//! let integer = registry.resolve("int").unwrap();
//!
//! assert_eq!(integer.apply(Value::from("42")).unwrap(), Value::Int(42));
//! assert!(integer.apply(Value::from("abc")).is_err());
//! ```

pub mod error;
pub mod primitive;

pub use error::CoercionError;
pub use primitive::{default_coercion, CoercionFn};

use mapping_core::{PrimitiveKind, Value};
use std::collections::BTreeMap;

/// A primitive coercion bound to its kind.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveCoercion {
    kind: PrimitiveKind,
    func: CoercionFn,
}

impl PrimitiveCoercion {
    /// The kind this coercion produces.
    pub fn kind(&self) -> PrimitiveKind {
        self.kind
    }

    /// Apply the coercion to a raw value.
    pub fn apply(&self, value: Value) -> Result<Value, CoercionError> {
        (self.func)(value)
    }
}

/// Named primitive coercion functions.
///
/// The standard registry binds every [`PrimitiveKind`] to its built-in
/// function. A coercer queries the registry once per mapping while it is
/// built and keeps the resolved function; the registry is never consulted on
/// the conversion path.
///
/// Substitute registries restrict or replace kinds:
///
/// ```
/// use coercions::{primitive, PrimitiveCoercionRegistry};
/// use mapping_core::PrimitiveKind;
///
/// let registry = PrimitiveCoercionRegistry::empty()
///     .with(PrimitiveKind::String, primitive::coerce_string);
///
/// assert!(registry.resolve("string").is_some());
/// assert!(registry.resolve("integer").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PrimitiveCoercionRegistry {
    entries: BTreeMap<PrimitiveKind, CoercionFn>,
}

impl PrimitiveCoercionRegistry {
    /// Registry with the built-in function for every kind.
    pub fn standard() -> Self {
        PrimitiveKind::ALL
            .into_iter()
            .fold(Self::empty(), |registry, kind| {
                registry.with(kind, default_coercion(kind))
            })
    }

    /// Registry without any kind.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Bind `kind` to `func`, replacing a previous binding.
    pub fn with(mut self, kind: PrimitiveKind, func: CoercionFn) -> Self {
        self.entries.insert(kind, func);
        self
    }

    /// Get the coercion bound to `kind`.
    pub fn get(&self, kind: PrimitiveKind) -> Option<PrimitiveCoercion> {
        self.entries
            .get(&kind)
            .map(|&func| PrimitiveCoercion { kind, func })
    }

    /// Resolve a type name (canonical or alias) to a bound coercion.
    pub fn resolve(&self, name: &str) -> Option<PrimitiveCoercion> {
        PrimitiveKind::from_name(name).and_then(|kind| self.get(kind))
    }

    /// Check whether `kind` is bound.
    pub fn contains(&self, kind: PrimitiveKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Bound kinds, in declaration order.
    pub fn kinds(&self) -> Vec<PrimitiveKind> {
        self.entries.keys().copied().collect()
    }

    /// Number of bound kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no kind is bound.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for PrimitiveCoercionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
