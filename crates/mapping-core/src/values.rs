//! Value representations exchanged between entities and records.
//!
//! This module defines the loosely-typed [`Value`] carried by records and
//! entity attributes, and the value-object machinery ([`ValueObject`],
//! [`CustomValue`], [`ValueType`]) used by custom coercions.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Boxed error returned by value-object constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Flat record as produced and consumed by a storage adapter
/// (record field name -> raw value).
pub type Record = IndexMap<String, Value>;

/// Entity attributes handed to an entity constructor
/// (entity field name -> coerced value).
pub type Attributes = IndexMap<String, Value>;

/// Loosely-typed value.
///
/// `Value` is what a storage adapter hands over before coercion and what the
/// coercer hands back after it. Primitive coercions turn one variant into the
/// variant matching their [`PrimitiveKind`](crate::PrimitiveKind); custom
/// coercions wrap values into [`Value::Custom`].
#[derive(Debug, Clone)]
pub enum Value {
    /// Absent value
    Null,

    /// Boolean value
    Bool(bool),

    /// 64-bit signed integer
    Int(i64),

    /// 64-bit floating point
    Float(f64),

    /// Exact decimal
    Decimal(Decimal),

    /// String value
    String(String),

    /// Binary data
    Bytes(Vec<u8>),

    /// UUID value
    Uuid(Uuid),

    /// Calendar date
    Date(NaiveDate),

    /// Time of day
    Time(NaiveTime),

    /// UTC timestamp
    DateTime(DateTime<Utc>),

    /// Ordered list of values
    Array(Vec<Value>),

    /// String-keyed map of values, in insertion order
    Map(IndexMap<String, Value>),

    /// Value object produced by a custom coercion
    Custom(CustomValue),
}

impl Value {
    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Check if this value counts as assigned.
    ///
    /// `Null` and the empty string are unassigned; everything else is present.
    /// The coercer uses this to decide whether an entity has an identity.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Null => false,
            Self::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Decimal(_) => "decimal",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Uuid(_) => "uuid",
            Self::Date(_) => "date",
            Self::Time(_) => "time",
            Self::DateTime(_) => "datetime",
            Self::Array(_) => "array",
            Self::Map(_) => "map",
            Self::Custom(_) => "custom",
        }
    }

    /// Try to get this value as an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Try to get this value as a string reference.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a value object.
    pub fn as_custom(&self) -> Option<&CustomValue> {
        match self {
            Self::Custom(c) => Some(c),
            _ => None,
        }
    }

    /// Try to get this value as a value object of type `T`.
    pub fn downcast_ref<T: ValueObject>(&self) -> Option<&T> {
        self.as_custom().and_then(CustomValue::downcast_ref)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Decimal(a), Self::Decimal(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Time(a), Self::Time(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Custom(a), Self::Custom(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Decimal(d) => write!(f, "{d}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Time(t) => write!(f, "{}", t.format("%H:%M:%S%.f")),
            Self::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Self::Array(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (idx, (key, item)) in map.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {item}")?;
                }
                f.write_str("}")
            }
            Self::Custom(c) => write!(f, "{}({})", c.type_name(), c.to_raw()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Self::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(b)
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Self::Time(t)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}

impl From<CustomValue> for Value {
    fn from(c: CustomValue) -> Self {
        Self::Custom(c)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// Value objects
// ============================================================================

/// A domain value type built from a single raw value.
///
/// Implementors are the targets of custom coercions: `from_raw` is the
/// single-argument constructor, `to_raw` gives back the storage form.
///
/// ```
/// use mapping_core::{Value, ValueObject};
///
/// #[derive(Debug, PartialEq)]
/// struct Email(String);
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("not an email: {0}")]
/// struct InvalidEmail(String);
///
/// impl ValueObject for Email {
///     const TYPE_NAME: &'static str = "Email";
///     type Error = InvalidEmail;
///
///     fn from_raw(raw: Value) -> Result<Self, Self::Error> {
///         match raw {
///             Value::String(s) if s.contains('@') => Ok(Email(s)),
///             other => Err(InvalidEmail(other.to_string())),
///         }
///     }
///
///     fn to_raw(&self) -> Value {
///         Value::String(self.0.clone())
///     }
/// }
///
/// let email = Email::from_raw(Value::from("ann@example.com")).unwrap();
/// assert_eq!(email.to_raw(), Value::from("ann@example.com"));
/// ```
pub trait ValueObject: fmt::Debug + PartialEq + Send + Sync + Sized + 'static {
    /// Name under which the type is referenced from attribute mappings.
    const TYPE_NAME: &'static str;

    /// Error returned when a raw value cannot be turned into this type.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Construct an instance from a raw value.
    ///
    /// Never called with [`Value::Null`]: a coercer passes null through
    /// unchanged, so an unset field stays null instead of being constructed.
    fn from_raw(raw: Value) -> Result<Self, Self::Error>;

    /// Storage representation of this instance.
    fn to_raw(&self) -> Value;
}

/// Object-safe view of a [`ValueObject`].
trait DynValueObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &'static str;
    fn value_type_id(&self) -> TypeId;
    fn to_raw(&self) -> Value;
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynValueObject) -> bool;
}

impl<T: ValueObject> DynValueObject for T {
    fn type_name(&self) -> &'static str {
        T::TYPE_NAME
    }

    fn value_type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn to_raw(&self) -> Value {
        ValueObject::to_raw(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynValueObject) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

/// Shared handle to a value-object instance.
///
/// Cloning is cheap and keeps pointing at the same instance, which is how a
/// custom coercion hands an existing value object back unchanged.
#[derive(Debug, Clone)]
pub struct CustomValue(Arc<dyn DynValueObject>);

impl CustomValue {
    /// Wrap a value object.
    pub fn new<T: ValueObject>(value: T) -> Self {
        Self(Arc::new(value))
    }

    /// Name of the value type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// Check whether this instance is of type `T`.
    pub fn is<T: ValueObject>(&self) -> bool {
        self.0.value_type_id() == TypeId::of::<T>()
    }

    /// Borrow the instance as `T`.
    pub fn downcast_ref<T: ValueObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Storage representation of the instance.
    pub fn to_raw(&self) -> Value {
        self.0.to_raw()
    }

    /// Check whether both handles point at the same instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn value_type_id(&self) -> TypeId {
        self.0.value_type_id()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0.dyn_eq(other.0.as_ref())
    }
}

type Constructor = dyn Fn(Value) -> Result<CustomValue, BoxError> + Send + Sync;

/// Constructible value type: the target of a custom coercion.
///
/// Carries the type identity used for the "already an instance" check and
/// the single-argument constructor.
#[derive(Clone)]
pub struct ValueType {
    name: &'static str,
    type_id: TypeId,
    construct: Arc<Constructor>,
}

impl ValueType {
    /// Reference to the value type `T`.
    pub fn of<T: ValueObject>() -> Self {
        Self {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            construct: Arc::new(|raw| {
                T::from_raw(raw)
                    .map(CustomValue::new)
                    .map_err(|e| Box::new(e) as BoxError)
            }),
        }
    }

    /// Name under which the type is referenced.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check whether `value` already is an instance of this type.
    pub fn is_instance(&self, value: &CustomValue) -> bool {
        value.value_type_id() == self.type_id
    }

    /// Construct a new instance from a raw value.
    pub fn construct(&self, raw: Value) -> Result<CustomValue, BoxError> {
        (self.construct)(raw)
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueType")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Constructible value types known to one schema, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ValueTypes {
    types: IndexMap<String, ValueType>,
}

impl ValueTypes {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a value type under its name, replacing a previous one.
    pub fn register(&mut self, value_type: ValueType) {
        self.types.insert(value_type.name().to_string(), value_type);
    }

    /// Get a value type by name.
    pub fn get(&self, name: &str) -> Option<&ValueType> {
        self.types.get(name)
    }

    /// Get all registered names.
    pub fn names(&self) -> Vec<&str> {
        self.types.keys().map(String::as_str).collect()
    }

    /// Number of registered types.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if no type is registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Cents(i64);

    #[derive(Debug, thiserror::Error)]
    #[error("expected an integer amount, got {0}")]
    struct NotAnAmount(String);

    impl ValueObject for Cents {
        const TYPE_NAME: &'static str = "Cents";
        type Error = NotAnAmount;

        fn from_raw(raw: Value) -> Result<Self, Self::Error> {
            raw.as_i64()
                .map(Cents)
                .ok_or_else(|| NotAnAmount(raw.to_string()))
        }

        fn to_raw(&self) -> Value {
            Value::Int(self.0)
        }
    }

    #[test]
    fn test_value_presence() {
        assert!(!Value::Null.is_present());
        assert!(!Value::from("").is_present());
        assert!(Value::from("x").is_present());
        assert!(Value::Int(0).is_present());
        assert!(Value::Bool(false).is_present());
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Int(42).as_i64(), Some(42));
        assert_eq!(Value::from("test").as_str(), Some("test"));
        assert_eq!(Value::Bool(true).as_i64(), None);
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Int(3));
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("Ann").to_string(), "\"Ann\"");
        assert_eq!(
            Value::Array(vec![Value::Int(1), Value::Null]).to_string(),
            "[1, null]"
        );
        assert_eq!(
            Value::Custom(CustomValue::new(Cents(5))).to_string(),
            "Cents(5)"
        );
    }

    #[test]
    fn test_custom_value_equality_and_identity() {
        let a = CustomValue::new(Cents(10));
        let b = CustomValue::new(Cents(10));
        let c = a.clone();

        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        assert!(a.ptr_eq(&c));
        assert_ne!(a, CustomValue::new(Cents(11)));
        assert!(a.is::<Cents>());
        assert_eq!(a.downcast_ref::<Cents>(), Some(&Cents(10)));
    }

    #[test]
    fn test_value_type_construct() {
        let cents = ValueType::of::<Cents>();
        assert_eq!(cents.name(), "Cents");

        let built = cents.construct(Value::Int(250)).unwrap();
        assert!(cents.is_instance(&built));
        assert_eq!(built.to_raw(), Value::Int(250));

        let err = cents.construct(Value::from("ten")).unwrap_err();
        assert!(err.to_string().contains("expected an integer amount"));
    }

    #[test]
    fn test_value_types_registry() {
        let mut types = ValueTypes::new();
        assert!(types.is_empty());

        types.register(ValueType::of::<Cents>());
        assert_eq!(types.len(), 1);
        assert_eq!(types.names(), vec!["Cents"]);
        assert!(types.get("Cents").is_some());
        assert!(types.get("Money").is_none());
    }
}
