use super::*;
use serde_json::json;

#[test]
fn from_json_scalars() {
    assert_eq!(Value::from_json(&json!(null)), Value::Null);
    assert_eq!(Value::from_json(&json!(true)), Value::Bool(true));
    assert_eq!(Value::from_json(&json!(7)), Value::Int(7));
    assert_eq!(Value::from_json(&json!(u64::MAX)), Value::Uint(u64::MAX));
    assert_eq!(Value::from_json(&json!(1.5)), Value::Float(1.5));
    assert_eq!(
        Value::from_json(&json!("abc")),
        Value::Text("abc".to_string())
    );
}

#[test]
fn from_json_array_is_elementwise() {
    assert_eq!(
        Value::from_json(&json!([1, "a", null])),
        Value::List(vec![Value::Int(1), Value::Text("a".to_string()), Value::Null])
    );
}

#[test]
fn from_json_object_stays_opaque() {
    let doc = json!({"a": 1, "b": [2, 3]});
    assert_eq!(Value::from_json(&doc), Value::Json(doc.clone()));
    assert_eq!(Value::from_json(&doc).to_json(), doc);
}

#[test]
fn to_json_round_trips_scalars() {
    for value in [
        Value::Null,
        Value::Bool(false),
        Value::Int(-3),
        Value::Float(0.25),
        Value::Text("x".to_string()),
        Value::List(vec![Value::Int(1), Value::Int(2)]),
    ] {
        assert_eq!(Value::from_json(&value.to_json()), value);
    }
}

#[test]
fn field_value_conversions() {
    assert_eq!(5_i32.to_value(), Value::Int(5));
    assert_eq!(5_u8.to_value(), Value::Uint(5));
    assert_eq!(1.5_f32.to_value(), Value::Float(1.5));
    assert_eq!("s".to_value(), Value::Text("s".to_string()));
    assert_eq!(String::from("s").to_value(), Value::Text("s".to_string()));
    assert_eq!(true.to_value(), Value::Bool(true));
    assert_eq!(Option::<i64>::None.to_value(), Value::Null);
    assert_eq!(Some(2_i64).to_value(), Value::Int(2));
    assert_eq!(Value::Uint(9).to_value(), Value::Uint(9));
}

#[test]
fn null_default() {
    assert_eq!(Value::default(), Value::Null);
    assert!(Value::Null.is_null());
    assert!(!Value::Int(0).is_null());
}
