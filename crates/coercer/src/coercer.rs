//! Schema-compiled entity <-> record conversions.

use crate::config::{CoercerConfig, MissingKeyPolicy};
use crate::entity::Entity;
use crate::error::{CoercerError, FieldSide};
use coercions::{CoercionError, PrimitiveCoercion, PrimitiveCoercionRegistry};
use mapping_core::{
    AttributeMapping, AttributeSchema, Attributes, PrimitiveKind, Record, SchemaError, TypeName,
    Value, ValueType,
};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace};

type Step = Arc<dyn Fn(Value) -> Result<Value, CoercionError> + Send + Sync>;

/// How a field's target type was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionKind {
    /// Built-in scalar coercion from the registry
    Primitive(PrimitiveKind),
    /// Value-object construction
    Custom,
}

impl fmt::Display for CoercionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "primitive({kind})"),
            Self::Custom => f.write_str("custom"),
        }
    }
}

/// Compiled coercion of one mapped field.
#[derive(Clone)]
pub struct FieldCoercer {
    entity_field: String,
    record_field: String,
    type_name: TypeName,
    kind: CoercionKind,
    step: Step,
}

impl FieldCoercer {
    /// Field name on the entity.
    pub fn entity_field(&self) -> &str {
        &self.entity_field
    }

    /// Field name in the record.
    pub fn record_field(&self) -> &str {
        &self.record_field
    }

    /// Target type as named by the mapping.
    pub fn type_name(&self) -> &TypeName {
        &self.type_name
    }

    /// How the target type was resolved.
    pub fn kind(&self) -> CoercionKind {
        self.kind
    }

    /// Apply this field's coercion to a bare value.
    pub fn coerce(&self, value: Value) -> Result<Value, CoercionError> {
        (self.step)(value)
    }

    fn coerce_named(&self, field: &str, value: Value) -> Result<Value, CoercerError> {
        self.coerce(value).map_err(|source| CoercerError::Coercion {
            field: field.to_string(),
            source,
        })
    }
}

impl fmt::Debug for FieldCoercer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldCoercer")
            .field("entity_field", &self.entity_field)
            .field("record_field", &self.record_field)
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

fn primitive_step(coercion: PrimitiveCoercion) -> Step {
    Arc::new(move |value| coercion.apply(value))
}

fn custom_step(value_type: ValueType) -> Step {
    Arc::new(move |value| {
        let existing =
            matches!(&value, Value::Custom(custom) if value_type.is_instance(custom));
        if existing || value.is_null() {
            return Ok(value);
        }

        let rendered = value.to_string();
        value_type
            .construct(value)
            .map(Value::Custom)
            .map_err(|e| CoercionError {
                value: rendered,
                expected: value_type.name().to_string(),
                message: e.to_string(),
            })
    })
}

fn bind_field(
    schema: &AttributeSchema,
    mapping: &AttributeMapping,
    registry: &PrimitiveCoercionRegistry,
) -> Result<FieldCoercer, CoercerError> {
    let type_name = mapping.target_type.as_str();
    let primitive = mapping
        .target_type
        .primitive()
        .and_then(|kind| registry.get(kind));
    let (kind, step) = if let Some(coercion) = primitive {
        (CoercionKind::Primitive(coercion.kind()), primitive_step(coercion))
    } else if let Some(value_type) = schema.value_types().get(type_name) {
        (CoercionKind::Custom, custom_step(value_type.clone()))
    } else {
        return Err(CoercerError::SchemaResolution {
            collection: schema.collection.clone(),
            field: mapping.entity_field.clone(),
            type_name: type_name.to_string(),
        });
    };

    debug!(
        collection = %schema.collection,
        entity_field = %mapping.entity_field,
        record_field = %mapping.record_field,
        %kind,
        "Bound field coercion"
    );

    Ok(FieldCoercer {
        entity_field: mapping.entity_field.clone(),
        record_field: mapping.record_field.clone(),
        type_name: mapping.target_type.clone(),
        kind,
        step,
    })
}

/// Entity <-> record converter for one collection.
///
/// Built once from an [`AttributeSchema`]: every mapping's target type is
/// resolved against the primitive registry, then against the schema's value
/// types, and the resulting coercion is stored per field. Conversions only
/// run the stored steps. The coercer is immutable after construction and can
/// be shared between threads.
///
/// # Example
///
/// ```
/// use coercer::{Coercer, DynamicEntity};
/// use coercions::PrimitiveCoercionRegistry;
/// use mapping_core::{AttributeSchema, PrimitiveKind, Value};
///
/// let schema = AttributeSchema::builder("users", "User")
///     .attribute("id", PrimitiveKind::Integer)
///     .attribute_as("name", "full_name", PrimitiveKind::String)
///     .build()
///     .unwrap();
/// let coercer: Coercer<DynamicEntity> =
///     Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();
///
/// let unsaved = DynamicEntity::new().with("id", Value::Null).with("name", "Ann");
/// let record = coercer.to_record(&unsaved).unwrap();
/// assert_eq!(record.keys().collect::<Vec<_>>(), vec!["full_name"]);
///
/// let saved = DynamicEntity::new().with("id", 7).with("name", "Ann");
/// let record = coercer.to_record(&saved).unwrap();
/// assert_eq!(record.get("id"), Some(&Value::Int(7)));
///
/// let entity = coercer.from_record(&record).unwrap();
/// assert_eq!(entity, saved);
/// ```
pub struct Coercer<E> {
    collection: String,
    identity: usize,
    fields: Vec<FieldCoercer>,
    by_record_field: HashMap<String, usize>,
    config: CoercerConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Coercer<E> {
    /// Build a coercer with the default configuration.
    pub fn new(
        schema: &AttributeSchema,
        registry: &PrimitiveCoercionRegistry,
    ) -> Result<Self, CoercerError> {
        Self::with_config(schema, registry, CoercerConfig::default())
    }

    /// Build a coercer.
    ///
    /// Fails if the schema is invalid or if a target type resolves neither
    /// to a primitive in `registry` nor to a value type of `schema`.
    pub fn with_config(
        schema: &AttributeSchema,
        registry: &PrimitiveCoercionRegistry,
        config: CoercerConfig,
    ) -> Result<Self, CoercerError> {
        schema.validate()?;

        let fields = schema
            .attributes
            .iter()
            .map(|mapping| bind_field(schema, mapping, registry))
            .collect::<Result<Vec<_>, _>>()?;

        let identity = fields
            .iter()
            .position(|f| f.entity_field == schema.identity)
            .ok_or_else(|| SchemaError::IdentityNotMapped {
                collection: schema.collection.clone(),
                identity: schema.identity.clone(),
            })?;

        let by_record_field = fields
            .iter()
            .enumerate()
            .map(|(idx, f)| (f.record_field.clone(), idx))
            .collect();

        debug!(
            collection = %schema.collection,
            entity = %schema.entity,
            identity = %schema.identity,
            fields = fields.len(),
            missing_keys = ?config.missing_keys,
            "Compiled coercer"
        );

        Ok(Self {
            collection: schema.collection.clone(),
            identity,
            fields,
            by_record_field,
            config,
            _entity: PhantomData,
        })
    }

    /// Collection this coercer was built for.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Configuration in effect.
    pub fn config(&self) -> &CoercerConfig {
        &self.config
    }

    /// Compiled fields, in schema order.
    pub fn fields(&self) -> &[FieldCoercer] {
        &self.fields
    }

    /// Compiled identity field.
    pub fn identity(&self) -> &FieldCoercer {
        &self.fields[self.identity]
    }

    /// Compiled field for a record field name.
    pub fn field(&self, record_field: &str) -> Option<&FieldCoercer> {
        self.by_record_field
            .get(record_field)
            .map(|&idx| &self.fields[idx])
    }

    /// Coerce one bare value as the given record field would be coerced.
    ///
    /// Lets callers convert single columns without building an entity.
    pub fn deserialize(&self, record_field: &str, value: Value) -> Result<Value, CoercerError> {
        let field = self
            .field(record_field)
            .ok_or_else(|| CoercerError::UnknownField(record_field.to_string()))?;
        field.coerce_named(record_field, value)
    }
}

impl<E: Entity> Coercer<E> {
    /// Convert an entity into a record.
    ///
    /// Fields appear in schema order. The identity field is left out when
    /// the entity's identity is absent or unset, so a record for an entity
    /// that was never persisted carries no identity.
    pub fn to_record(&self, entity: &E) -> Result<Record, CoercerError> {
        let persisted = entity
            .read(&self.identity().entity_field)
            .is_some_and(|value| value.is_present());
        trace!(collection = %self.collection, persisted, "Converting entity to record");

        let mut record = Record::with_capacity(self.fields.len());
        for (idx, field) in self.fields.iter().enumerate() {
            if idx == self.identity && !persisted {
                continue;
            }
            let raw = read_field(entity, field)?;
            let value = field.coerce_named(&field.entity_field, raw)?;
            record.insert(field.record_field.clone(), value);
        }
        Ok(record)
    }

    /// Convert a record into a new entity.
    ///
    /// Keys the schema does not map are ignored. A mapped key that is absent
    /// fails or reads as null depending on [`CoercerConfig::missing_keys`].
    pub fn from_record(&self, record: &Record) -> Result<E, CoercerError> {
        trace!(collection = %self.collection, keys = record.len(), "Converting record to entity");

        let mut attributes = Attributes::with_capacity(self.fields.len());
        for field in &self.fields {
            let raw = match record.get(&field.record_field) {
                Some(value) => value.clone(),
                None => match self.config.missing_keys {
                    MissingKeyPolicy::Fail => {
                        return Err(CoercerError::MissingField {
                            field: field.record_field.clone(),
                            side: FieldSide::Record,
                        })
                    }
                    MissingKeyPolicy::Null => Value::Null,
                },
            };
            let value = field.coerce_named(&field.record_field, raw)?;
            attributes.insert(field.entity_field.clone(), value);
        }

        E::construct(attributes).map_err(|e| CoercerError::EntityConstruction(Box::new(e)))
    }
}

fn read_field<E: Entity>(entity: &E, field: &FieldCoercer) -> Result<Value, CoercerError> {
    entity
        .read(&field.entity_field)
        .ok_or_else(|| CoercerError::MissingField {
            field: field.entity_field.clone(),
            side: FieldSide::Entity,
        })
}

impl<E> fmt::Debug for Coercer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coercer")
            .field("collection", &self.collection)
            .field("identity", &self.identity().entity_field)
            .field("fields", &self.fields)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::DynamicEntity;
    use mapping_core::ValueObject;

    #[derive(Debug, PartialEq)]
    struct Email(String);

    #[derive(Debug, thiserror::Error)]
    #[error("missing '@' in {0}")]
    struct InvalidEmail(String);

    impl ValueObject for Email {
        const TYPE_NAME: &'static str = "Email";
        type Error = InvalidEmail;

        fn from_raw(raw: Value) -> Result<Self, Self::Error> {
            match raw {
                Value::String(s) if s.contains('@') => Ok(Email(s)),
                other => Err(InvalidEmail(other.to_string())),
            }
        }

        fn to_raw(&self) -> Value {
            Value::String(self.0.clone())
        }
    }

    fn users_schema() -> AttributeSchema {
        AttributeSchema::builder("users", "User")
            .attribute("id", PrimitiveKind::Integer)
            .attribute_as("name", "full_name", PrimitiveKind::String)
            .value_attribute::<Email>("email", "email_address")
            .build()
            .unwrap()
    }

    fn coercer() -> Coercer<DynamicEntity> {
        Coercer::new(&users_schema(), &PrimitiveCoercionRegistry::standard()).unwrap()
    }

    #[test]
    fn test_fields_are_compiled_in_schema_order() {
        let coercer = coercer();
        let plan: Vec<_> = coercer
            .fields()
            .iter()
            .map(|f| (f.entity_field(), f.record_field(), f.kind()))
            .collect();

        assert_eq!(
            plan,
            vec![
                ("id", "id", CoercionKind::Primitive(PrimitiveKind::Integer)),
                ("name", "full_name", CoercionKind::Primitive(PrimitiveKind::String)),
                ("email", "email_address", CoercionKind::Custom),
            ]
        );
        assert_eq!(coercer.identity().entity_field(), "id");
        assert_eq!(coercer.collection(), "users");
    }

    #[test]
    fn test_unresolvable_type_fails_build() {
        let schema = AttributeSchema::builder("users", "User")
            .attribute("id", PrimitiveKind::Integer)
            .attribute("balance", "Money")
            .build()
            .unwrap();

        let err = Coercer::<DynamicEntity>::new(&schema, &PrimitiveCoercionRegistry::standard())
            .unwrap_err();
        assert!(matches!(
            err,
            CoercerError::SchemaResolution { ref field, ref type_name, .. }
                if field == "balance" && type_name == "Money"
        ));
    }

    #[test]
    fn test_substitute_registry_limits_primitives() {
        let registry = PrimitiveCoercionRegistry::empty()
            .with(PrimitiveKind::Integer, coercions::primitive::coerce_integer);

        let err = Coercer::<DynamicEntity>::new(&users_schema(), &registry).unwrap_err();
        assert!(matches!(
            err,
            CoercerError::SchemaResolution { ref type_name, .. } if type_name == "string"
        ));
    }

    #[test]
    fn test_custom_step_constructs_and_passes_through() {
        let coercer = coercer();

        let built = coercer
            .deserialize("email_address", Value::from("ann@example.com"))
            .unwrap();
        assert_eq!(
            built.downcast_ref::<Email>(),
            Some(&Email("ann@example.com".to_string()))
        );

        let again = coercer.deserialize("email_address", built.clone()).unwrap();
        assert!(again.as_custom().unwrap().ptr_eq(built.as_custom().unwrap()));

        assert_eq!(
            coercer.deserialize("email_address", Value::Null).unwrap(),
            Value::Null
        );
    }

    #[test]
    fn test_custom_step_reports_constructor_errors() {
        let err = coercer()
            .deserialize("email_address", Value::from("nobody"))
            .unwrap_err();

        let coercion = err.as_coercion().unwrap();
        assert_eq!(coercion.expected, "Email");
        assert_eq!(coercion.message, "missing '@' in \"nobody\"");
    }

    #[test]
    fn test_deserialize_unknown_field() {
        let err = coercer().deserialize("name", Value::from("Ann")).unwrap_err();
        assert!(matches!(err, CoercerError::UnknownField(ref f) if f == "name"));
    }

    #[test]
    fn test_coercer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Coercer<DynamicEntity>>();
    }
}
