use chrono::NaiveDate;
use coercer::{Coercer, CoercerConfig, CoercerError, DynamicEntity, Entity, FieldSide, MissingKeyPolicy};
use coercions::PrimitiveCoercionRegistry;
use mapping_core::{
    AttributeSchema, Attributes, CustomValue, PrimitiveKind, Record, Value, ValueObject, ValueType,
};
use rust_decimal::prelude::ToPrimitive;

#[derive(Debug, Clone, PartialEq)]
struct Money {
    cents: i64,
}

#[derive(Debug, thiserror::Error)]
#[error("not an amount: {0}")]
struct InvalidMoney(String);

impl ValueObject for Money {
    const TYPE_NAME: &'static str = "Money";
    type Error = InvalidMoney;

    fn from_raw(raw: Value) -> Result<Self, Self::Error> {
        match raw {
            Value::Int(cents) => Ok(Money { cents }),
            Value::Decimal(d) => (d * rust_decimal::Decimal::ONE_HUNDRED)
                .trunc()
                .to_i64()
                .map(|cents| Money { cents })
                .ok_or_else(|| InvalidMoney(d.to_string())),
            other => Err(InvalidMoney(other.to_string())),
        }
    }

    fn to_raw(&self) -> Value {
        Value::Int(self.cents)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct User {
    id: Option<i64>,
    name: String,
    balance: Option<Money>,
    joined: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
enum UserError {
    #[error("user has no name")]
    MissingName,
    #[error("unexpected value for {0}")]
    WrongType(&'static str),
}

impl Entity for User {
    type Error = UserError;

    fn read(&self, field: &str) -> Option<Value> {
        match field {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.as_str().into()),
            "balance" => Some(self.balance.clone().map(CustomValue::new).into()),
            "joined" => Some(self.joined.into()),
            _ => None,
        }
    }

    fn construct(attributes: Attributes) -> Result<Self, Self::Error> {
        let id = match attributes.get("id") {
            None | Some(Value::Null) => None,
            Some(Value::Int(id)) => Some(*id),
            Some(_) => return Err(UserError::WrongType("id")),
        };
        let name = attributes
            .get("name")
            .and_then(Value::as_str)
            .ok_or(UserError::MissingName)?
            .to_string();
        let balance = match attributes.get("balance") {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                value
                    .downcast_ref::<Money>()
                    .cloned()
                    .ok_or(UserError::WrongType("balance"))?,
            ),
        };
        let joined = match attributes.get("joined") {
            None | Some(Value::Null) => None,
            Some(Value::Date(date)) => Some(*date),
            Some(_) => return Err(UserError::WrongType("joined")),
        };
        Ok(User {
            id,
            name,
            balance,
            joined,
        })
    }
}

fn users_schema() -> AttributeSchema {
    AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute_as("name", "full_name", PrimitiveKind::String)
        .value_attribute::<Money>("balance", "balance_cents")
        .attribute_as("joined", "joined_on", PrimitiveKind::Date)
        .build()
        .unwrap()
}

fn user_coercer() -> Coercer<User> {
    Coercer::new(&users_schema(), &PrimitiveCoercionRegistry::standard()).unwrap()
}

fn ann(id: Option<i64>) -> User {
    User {
        id,
        name: "Ann".to_string(),
        balance: Some(Money { cents: 1250 }),
        joined: NaiveDate::from_ymd_opt(2024, 3, 1),
    }
}

fn record(pairs: &[(&str, Value)]) -> Record {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn test_unsaved_entity_omits_identity() {
    let schema = AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute_as("name", "full_name", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let unsaved = DynamicEntity::new().with("id", Value::Null).with("name", "Ann");
    assert_eq!(
        coercer.to_record(&unsaved).unwrap(),
        record(&[("full_name", Value::from("Ann"))])
    );

    let saved = DynamicEntity::new().with("id", 7).with("name", "Ann");
    assert_eq!(
        coercer.to_record(&saved).unwrap(),
        record(&[("id", Value::Int(7)), ("full_name", Value::from("Ann"))])
    );
}

#[test]
fn test_absent_identity_counts_as_unset() {
    let schema = AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute_as("name", "full_name", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let never_saved = DynamicEntity::new().with("name", "Ann");
    assert_eq!(
        coercer.to_record(&never_saved).unwrap(),
        record(&[("full_name", Value::from("Ann"))])
    );
}

#[test]
fn test_empty_string_identity_counts_as_unset() {
    let schema = AttributeSchema::builder("tags", "Tag")
        .identity("slug")
        .attribute("slug", PrimitiveKind::String)
        .attribute("label", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let entity = DynamicEntity::new().with("slug", "").with("label", "Rust");
    let record = coercer.to_record(&entity).unwrap();
    assert!(!record.contains_key("slug"));
    assert_eq!(record.get("label"), Some(&Value::from("Rust")));
}

#[test]
fn test_to_record_keeps_schema_order() {
    let record = user_coercer().to_record(&ann(Some(7))).unwrap();

    assert_eq!(
        record.keys().collect::<Vec<_>>(),
        vec!["id", "full_name", "balance_cents", "joined_on"]
    );
    assert_eq!(record.get("id"), Some(&Value::Int(7)));
    assert_eq!(
        record.get("balance_cents").unwrap().downcast_ref::<Money>(),
        Some(&Money { cents: 1250 })
    );
    assert_eq!(
        record.get("joined_on"),
        Some(&Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
    );
}

#[test]
fn test_round_trip() {
    let coercer = user_coercer();
    let user = ann(Some(7));

    let record = coercer.to_record(&user).unwrap();
    assert_eq!(coercer.from_record(&record).unwrap(), user);

    let sparse = User {
        balance: None,
        joined: None,
        ..ann(Some(8))
    };
    let record = coercer.to_record(&sparse).unwrap();
    assert_eq!(record.get("balance_cents"), Some(&Value::Null));
    assert_eq!(coercer.from_record(&record).unwrap(), sparse);
}

#[test]
fn test_from_record_coerces_raw_values() {
    let raw = record(&[
        ("id", Value::from("7")),
        ("full_name", Value::from("Ann")),
        ("balance_cents", Value::Int(1250)),
        ("joined_on", Value::from("2024-03-01")),
        ("ignored", Value::Bool(true)),
    ]);

    assert_eq!(user_coercer().from_record(&raw).unwrap(), ann(Some(7)));
}

#[test]
fn test_from_record_minimal_example() {
    let schema = AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute_as("name", "full_name", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let entity = coercer
        .from_record(&record(&[("id", Value::Int(7)), ("full_name", Value::from("Ann"))]))
        .unwrap();
    assert_eq!(entity.get("id"), Some(&Value::Int(7)));
    assert_eq!(entity.get("name"), Some(&Value::from("Ann")));
}

#[test]
fn test_custom_coercion_is_idempotent() {
    let coercer = user_coercer();
    let existing = CustomValue::new(Money { cents: 99 });

    let coerced = coercer
        .deserialize("balance_cents", Value::Custom(existing.clone()))
        .unwrap();
    assert!(coerced.as_custom().unwrap().ptr_eq(&existing));

    let built = coercer.deserialize("balance_cents", Value::Int(99)).unwrap();
    assert!(!built.as_custom().unwrap().ptr_eq(&existing));
    assert_eq!(built.downcast_ref::<Money>(), Some(&Money { cents: 99 }));
}

#[test]
fn test_conversions_are_deterministic() {
    let coercer = user_coercer();
    let user = ann(Some(7));

    let first = coercer.to_record(&user).unwrap();
    let second = coercer.to_record(&user).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_missing_record_field_fails_by_default() {
    let raw = record(&[("id", Value::Int(7)), ("full_name", Value::from("Ann"))]);

    let err = user_coercer().from_record(&raw).unwrap_err();
    assert!(matches!(
        err,
        CoercerError::MissingField { ref field, side: FieldSide::Record } if field == "balance_cents"
    ));
}

#[test]
fn test_missing_record_field_reads_as_null_when_configured() {
    let coercer: Coercer<User> = Coercer::with_config(
        &users_schema(),
        &PrimitiveCoercionRegistry::standard(),
        CoercerConfig::new().with_missing_keys(MissingKeyPolicy::Null),
    )
    .unwrap();
    let raw = record(&[("id", Value::Int(7)), ("full_name", Value::from("Ann"))]);

    let user = coercer.from_record(&raw).unwrap();
    assert_eq!(user.balance, None);
    assert_eq!(user.joined, None);
}

#[test]
fn test_entity_without_mapped_field_fails() {
    let schema = AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute("name", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let err = coercer
        .to_record(&DynamicEntity::new().with("id", 1))
        .unwrap_err();
    assert!(matches!(
        err,
        CoercerError::MissingField { ref field, side: FieldSide::Entity } if field == "name"
    ));
}

#[test]
fn test_coercion_failure_names_field() {
    let raw = record(&[
        ("id", Value::from("seven")),
        ("full_name", Value::from("Ann")),
        ("balance_cents", Value::Null),
        ("joined_on", Value::Null),
    ]);

    let err = user_coercer().from_record(&raw).unwrap_err();
    assert!(matches!(err, CoercerError::Coercion { ref field, .. } if field == "id"));
    assert_eq!(err.as_coercion().unwrap().expected, "integer");
}

#[test]
fn test_to_record_coercion_failure_names_entity_field() {
    let schema = AttributeSchema::builder("users", "User")
        .attribute("id", PrimitiveKind::Integer)
        .attribute_as("name", "full_name", PrimitiveKind::String)
        .build()
        .unwrap();
    let coercer: Coercer<DynamicEntity> =
        Coercer::new(&schema, &PrimitiveCoercionRegistry::standard()).unwrap();

    let entity = DynamicEntity::new()
        .with("id", 7)
        .with("name", Value::Array(vec![]));
    let err = coercer.to_record(&entity).unwrap_err();
    assert!(matches!(err, CoercerError::Coercion { ref field, .. } if field == "name"));
    assert_eq!(err.as_coercion().unwrap().expected, "string");
}

#[test]
fn test_deserialize_primitive_field() {
    let coercer = user_coercer();

    assert_eq!(coercer.deserialize("id", Value::from("7")).unwrap(), Value::Int(7));
    assert_eq!(
        coercer.deserialize("joined_on", Value::from("2024-03-01")).unwrap(),
        Value::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    );
}

#[test]
fn test_custom_coercion_failure() {
    let err = user_coercer()
        .deserialize("balance_cents", Value::from("lots"))
        .unwrap_err();

    let coercion = err.as_coercion().unwrap();
    assert_eq!(coercion.expected, "Money");
    assert!(coercion.message.contains("not an amount"));
}

#[test]
fn test_entity_construction_error_is_exposed() {
    let raw = record(&[
        ("id", Value::Int(7)),
        ("full_name", Value::Null),
        ("balance_cents", Value::Null),
        ("joined_on", Value::Null),
    ]);

    let err = user_coercer().from_record(&raw).unwrap_err();
    match err {
        CoercerError::EntityConstruction(source) => {
            assert!(matches!(
                source.downcast_ref::<UserError>(),
                Some(UserError::MissingName)
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_yaml_schema_with_value_type() {
    let yaml = r#"
collection: users
entity: User
attributes:
  - name: id
    type: integer
  - name: name
    as: full_name
    type: text
  - name: balance
    as: balance_cents
    type: Money
  - name: joined
    as: joined_on
    type: date
"#;
    let registry = PrimitiveCoercionRegistry::standard();
    let schema = AttributeSchema::from_yaml(yaml).unwrap();
    assert!(matches!(
        Coercer::<User>::new(&schema, &registry),
        Err(CoercerError::SchemaResolution { .. })
    ));

    let schema = schema.with_value_type(ValueType::of::<Money>());
    let coercer = Coercer::<User>::new(&schema, &registry).unwrap();
    let user = ann(Some(3));
    assert_eq!(
        coercer
            .from_record(&coercer.to_record(&user).unwrap())
            .unwrap(),
        user
    );
}

#[test]
fn test_concurrent_conversions() {
    let coercer = user_coercer();

    std::thread::scope(|scope| {
        for id in 0..4 {
            let coercer = &coercer;
            scope.spawn(move || {
                for n in 0..100 {
                    let user = ann(Some(id * 1000 + n));
                    let record = coercer.to_record(&user).unwrap();
                    assert_eq!(coercer.from_record(&record).unwrap(), user);
                }
            });
        }
    });
}
