use crate::{
    expr::{Expr, Predicate, and_, or_},
    model::FieldRef,
    operator::{self as op, OPERATOR_PREFIX, Operator},
    value::Value,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, json};
use thiserror::Error as ThisError;

///
/// Document syntax
///
/// `encode` turns a json filter document into a predicate, `decode` goes the
/// other way. The grammar:
///
/// - `{"field": v}`                  -> field = v
/// - `{"field": {"$op": x}}`         -> field $op x
/// - `{"field": {"$arith": [a, b]}}` -> (field $arith a) = b
/// - `{"$op": [a, b]}`               -> operator applied positionally
/// - `{"$and": [..]}` / `{"$or": [..]}` / `[..]` -> logic combinations
///
/// Entries of one object, and elements of an array, combine with `$and`.
/// Inside an operator array, only the first operand is identifier position:
/// a string there names a column, a string anywhere else is a text literal.
///

///
/// EncodeError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EncodeError {
    #[error("unknown operator: '{token}'")]
    UnknownOperator { token: String },

    #[error("operator '{token}' expects a sequence of sub-documents")]
    ExpectedSequence { token: String },

    #[error("field '{field}' cannot take the logic operator '{token}'")]
    LogicUnderField { field: String, token: String },

    #[error("cannot encode document shape: {doc}")]
    UnsupportedShape { doc: String },
}

/// Parse a filter document into a predicate.
pub fn encode(doc: &serde_json::Value) -> Result<Predicate, EncodeError> {
    match doc {
        serde_json::Value::Object(map) => {
            let mut preds = Vec::new();
            for (key, value) in map {
                if key.starts_with(OPERATOR_PREFIX) {
                    let operator = op::registered(key).ok_or_else(|| {
                        EncodeError::UnknownOperator {
                            token: key.clone(),
                        }
                    })?;
                    encode_operator_entry(operator, value, &mut preds)?;
                } else {
                    encode_field_entry(key, value, &mut preds)?;
                }
            }
            collapse(preds, doc)
        }
        serde_json::Value::Array(items) => {
            let mut preds = Vec::with_capacity(items.len());
            for item in items {
                preds.push(encode(item)?);
            }
            collapse(preds, doc)
        }
        other => Err(EncodeError::UnsupportedShape {
            doc: other.to_string(),
        }),
    }
}

/// Render a predicate back into operator-keyed document form, e.g.
/// `{"$eq": ["user.id", 1]}`. Inverse of [`encode`] on its normalized range.
#[must_use]
pub fn decode(pred: &Predicate) -> serde_json::Value {
    let operands: Vec<serde_json::Value> = pred.values.iter().map(decode_operand).collect();

    let mut doc = Map::with_capacity(1);
    doc.insert(pred.op.token().to_string(), serde_json::Value::Array(operands));

    serde_json::Value::Object(doc)
}

fn decode_operand(expr: &Expr) -> serde_json::Value {
    match expr {
        Expr::Value(value) => value.to_json(),
        Expr::Field(field) => json!(field.qualified()),
        Expr::Pred(pred) => decode(pred),
    }
}

fn collapse(mut preds: Vec<Predicate>, doc: &serde_json::Value) -> Result<Predicate, EncodeError> {
    match preds.len() {
        0 => Err(EncodeError::UnsupportedShape {
            doc: doc.to_string(),
        }),
        1 => Ok(preds.remove(0)),
        _ => Ok(and_(preds)),
    }
}

fn encode_operator_entry(
    operator: Operator,
    value: &serde_json::Value,
    out: &mut Vec<Predicate>,
) -> Result<(), EncodeError> {
    if operator == op::AND {
        // conjunction splices into the surrounding entry list
        for item in as_sequence(operator, value)? {
            out.push(encode(item)?);
        }
        return Ok(());
    }
    if operator == op::OR {
        let mut children = Vec::new();
        for item in as_sequence(operator, value)? {
            children.push(encode(item)?);
        }
        out.push(or_(children));
        return Ok(());
    }

    let pred = match value {
        serde_json::Value::Array(items) => {
            let mut operands = Vec::with_capacity(items.len());
            for (pos, item) in items.iter().enumerate() {
                operands.push(encode_operand(item, pos == 0)?);
            }
            Predicate::new(operator, operands)
        }
        other => Predicate::new(operator, vec![encode_operand(other, true)?]),
    };
    out.push(pred);

    Ok(())
}

fn encode_field_entry(
    field: &str,
    value: &serde_json::Value,
    out: &mut Vec<Predicate>,
) -> Result<(), EncodeError> {
    let lhs = || Expr::Field(FieldRef::synthetic(field));

    match value {
        serde_json::Value::Object(map) if is_operator_doc(map) => {
            for (token, rhs) in map {
                let operator =
                    op::registered(token).ok_or_else(|| EncodeError::UnknownOperator {
                        token: token.clone(),
                    })?;
                if op::LOGIC.contains(operator) {
                    return Err(EncodeError::LogicUnderField {
                        field: field.to_string(),
                        token: token.clone(),
                    });
                }

                if op::ARITHMETIC.contains(operator) {
                    if let serde_json::Value::Array(pair) = rhs {
                        if pair.len() == 2 {
                            // (field $arith a) compared against b
                            let computed = Predicate::new(
                                operator,
                                vec![lhs(), Expr::Value(Value::from_json(&pair[0]))],
                            );
                            out.push(Predicate::new(
                                op::EQ,
                                vec![
                                    Expr::Pred(computed),
                                    Expr::Value(Value::from_json(&pair[1])),
                                ],
                            ));
                            continue;
                        }
                    }
                }

                let rhs_expr = match rhs {
                    serde_json::Value::Object(inner) if is_operator_doc(inner) => {
                        Expr::Pred(encode(rhs)?)
                    }
                    other => Expr::Value(Value::from_json(other)),
                };
                out.push(Predicate::new(operator, vec![lhs(), rhs_expr]));
            }
        }
        // plain values, arrays, and operator-free objects are literals
        other => out.push(Predicate::new(
            op::EQ,
            vec![lhs(), Expr::Value(Value::from_json(other))],
        )),
    }

    Ok(())
}

fn encode_operand(json: &serde_json::Value, identifier_position: bool) -> Result<Expr, EncodeError> {
    match json {
        serde_json::Value::Object(map) if is_operator_doc(map) => Ok(Expr::Pred(encode(json)?)),
        serde_json::Value::String(path) if identifier_position => {
            Ok(Expr::Field(FieldRef::synthetic(path)))
        }
        other => Ok(Expr::Value(Value::from_json(other))),
    }
}

fn as_sequence<'a>(
    operator: Operator,
    value: &'a serde_json::Value,
) -> Result<&'a Vec<serde_json::Value>, EncodeError> {
    match value {
        serde_json::Value::Array(items) => Ok(items),
        _ => Err(EncodeError::ExpectedSequence {
            token: operator.token().to_string(),
        }),
    }
}

fn is_operator_doc(map: &Map<String, serde_json::Value>) -> bool {
    map.keys().any(|key| key.starts_with(OPERATOR_PREFIX))
}

// The wire form of a predicate is its document syntax.

impl Serialize for Predicate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        decode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Predicate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let doc = serde_json::Value::deserialize(deserializer)?;

        encode(&doc).map_err(serde::de::Error::custom)
    }
}
