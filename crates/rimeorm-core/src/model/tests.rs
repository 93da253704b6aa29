use super::*;
use std::{
    collections::HashMap,
    sync::{
        LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

static USER: LazyLock<TableModel> = LazyLock::new(|| {
    TableModel::define("user")
        .field(FieldDef::new("id").primary().autoincrement())
        .field(FieldDef::new("name"))
        .field(FieldDef::new("age").nullable())
        .build()
        .unwrap()
});

#[derive(Default)]
struct User {
    values: HashMap<String, Value>,
}

impl Record for User {
    fn model() -> &'static TableModel {
        &USER
    }

    fn get(&self, field: &str) -> Option<Value> {
        self.values.get(field).cloned()
    }

    fn set(&mut self, field: &str, value: Value) {
        self.values.insert(field.to_string(), value);
    }
}

#[test]
fn build_keeps_declaration_order() {
    let names: Vec<&str> = USER.fields().iter().map(FieldRef::name).collect();
    assert_eq!(names, vec!["id", "name", "age"]);
    assert_eq!(USER.name(), "user");
}

#[test]
fn build_partitions_primary_and_petty() {
    let primary: Vec<&str> = USER.primary_fields().map(FieldRef::name).collect();
    let petty: Vec<&str> = USER.petty_fields().map(FieldRef::name).collect();

    assert_eq!(primary, vec!["id"]);
    assert_eq!(petty, vec!["name", "age"]);
}

#[test]
fn autoincrement_field_is_tracked_and_nullable() {
    let inc = USER.autoincrement_field().unwrap();
    assert_eq!(inc.name(), "id");
    assert!(inc.is_primary());
    // unassigned keys start out unset
    assert!(inc.is_nullable());
}

#[test]
fn get_field_resolves_declared_names_only() {
    assert!(USER.get_field("name").is_some());
    assert!(USER.get_field("missing").is_none());
}

#[test]
fn field_falls_back_to_bound_synthetic() {
    let declared = USER.field("name");
    assert!(declared.is_declared());
    assert_eq!(declared.qualified(), "user.name");

    let synthetic = USER.field("missing");
    assert!(!synthetic.is_declared());
    assert_eq!(synthetic.table(), Some("user"));
    assert_eq!(synthetic.qualified(), "user.missing");
}

#[test]
fn synthetic_paths_stay_raw() {
    let dotted = FieldRef::synthetic("user.age");
    assert_eq!(dotted.table(), None);
    assert_eq!(dotted.qualified(), "user.age");
}

#[test]
fn build_rejects_duplicate_fields() {
    let err = TableModel::define("t")
        .field(FieldDef::new("a").primary())
        .field(FieldDef::new("a"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefineError::DuplicateField {
            table: "t".to_string(),
            field: "a".to_string(),
        }
    );
}

#[test]
fn build_rejects_autoincrement_with_default() {
    let err = TableModel::define("t")
        .field(FieldDef::new("id").primary().autoincrement().default_value(1_i64))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefineError::FieldAttributeConflict {
            table: "t".to_string(),
            field: "id".to_string(),
        }
    );
}

#[test]
fn build_rejects_second_autoincrement() {
    let err = TableModel::define("t")
        .field(FieldDef::new("a").primary().autoincrement())
        .field(FieldDef::new("b").autoincrement())
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefineError::AutoIncrementFieldExists {
            table: "t".to_string(),
            field: "b".to_string(),
        }
    );
}

#[test]
fn build_requires_a_primary_key() {
    let err = TableModel::define("t")
        .field(FieldDef::new("a"))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        DefineError::PrimaryKeyMissing {
            table: "t".to_string()
        }
    );
}

#[test]
fn abstract_tables_skip_the_primary_key_check() {
    let model = TableModel::define("base")
        .abstract_table()
        .field(FieldDef::new("created_at"))
        .build()
        .unwrap();
    assert!(model.primary_fields().next().is_none());
}

//
// record helpers
//

#[test]
fn apply_auto_increment_writes_once() {
    let mut user = User::default();
    assert!(apply_auto_increment(&mut user, 7));
    assert_eq!(user.get("id"), Some(Value::Uint(7)));

    // second write-back is a no-op
    assert!(!apply_auto_increment(&mut user, 8));
    assert_eq!(user.get("id"), Some(Value::Uint(7)));
}

#[test]
fn apply_defaults_prefers_literal_then_factories() {
    static MODEL: LazyLock<TableModel> = LazyLock::new(|| {
        TableModel::define("t")
            .field(FieldDef::new("id").primary())
            .field(FieldDef::new("a").default_value("lit"))
            .field(FieldDef::new("b").default_factory(|| Value::Int(9)))
            .field(FieldDef::new("c").update_factory(|| Value::Int(1)))
            .build()
            .unwrap()
    });

    struct Rec(HashMap<String, Value>);
    impl Record for Rec {
        fn model() -> &'static TableModel {
            &MODEL
        }
        fn get(&self, field: &str) -> Option<Value> {
            self.0.get(field).cloned()
        }
        fn set(&mut self, field: &str, value: Value) {
            self.0.insert(field.to_string(), value);
        }
    }

    let mut rec = Rec(HashMap::from([("a".to_string(), Value::Int(5))]));
    apply_defaults(&mut rec);

    // already-set fields keep their value
    assert_eq!(rec.get("a"), Some(Value::Int(5)));
    assert_eq!(rec.get("b"), Some(Value::Int(9)));
    // hot fields start out stamped
    assert_eq!(rec.get("c"), Some(Value::Int(1)));
    assert_eq!(rec.get("id"), None);
}

#[test]
fn assign_guards_primary_key_and_nullability() {
    let mut user = User::default();

    assign(&mut user, "id", Value::Uint(1)).unwrap();
    let err = assign(&mut user, "id", Value::Uint(2)).unwrap_err();
    assert_eq!(
        err,
        ModelError::PrimaryKeyModify {
            field: "id".to_string()
        }
    );

    let err = assign(&mut user, "name", Value::Null).unwrap_err();
    assert_eq!(
        err,
        ModelError::NotNullable {
            field: "name".to_string()
        }
    );
    assign(&mut user, "age", Value::Null).unwrap();

    let err = assign(&mut user, "missing", Value::Int(1)).unwrap_err();
    assert_eq!(
        err,
        ModelError::UnknownField {
            table: "user".to_string(),
            field: "missing".to_string(),
        }
    );
}

#[test]
fn assign_restamps_hot_fields() {
    static TICKS: AtomicU64 = AtomicU64::new(0);
    fn tick() -> Value {
        Value::Uint(TICKS.fetch_add(1, Ordering::Relaxed))
    }

    static MODEL: LazyLock<TableModel> = LazyLock::new(|| {
        TableModel::define("doc")
            .field(FieldDef::new("id").primary())
            .field(FieldDef::new("body").nullable())
            .field(FieldDef::new("updated").update_factory(tick))
            .build()
            .unwrap()
    });

    struct Doc(HashMap<String, Value>);
    impl Record for Doc {
        fn model() -> &'static TableModel {
            &MODEL
        }
        fn get(&self, field: &str) -> Option<Value> {
            self.0.get(field).cloned()
        }
        fn set(&mut self, field: &str, value: Value) {
            self.0.insert(field.to_string(), value);
        }
    }

    let mut doc = Doc(HashMap::new());
    assign(&mut doc, "body", Value::Text("a".to_string())).unwrap();
    let first = doc.get("updated").unwrap();

    assign(&mut doc, "body", Value::Text("b".to_string())).unwrap();
    let second = doc.get("updated").unwrap();
    assert_ne!(first, second);

    // assigning the same value again is a no-op and leaves the stamp alone
    assign(&mut doc, "body", Value::Text("b".to_string())).unwrap();
    assert_eq!(doc.get("updated").unwrap(), second);
}
