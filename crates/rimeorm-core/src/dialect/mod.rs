use crate::{
    expr::{Expr, Predicate, and_},
    operator::{self as op, ARITHMETIC, COMPARE, LOGIC, Operator},
    query::{Delete, Insert, Query, SelectItem, Update},
    value::Value,
};
use std::sync::Once;
use thiserror::Error as ThisError;

mod mysql;
mod postgres;
#[cfg(test)]
mod tests;

pub use mysql::MySql;
pub use postgres::Postgres;

///
/// Dialect compilers
///
/// Compile statement descriptions into `(sql, params)` pairs. SQL text is
/// built as a token stream joined by single spaces, so the output is byte
/// stable; values only ever leave through the parameter vector, never
/// through string formatting.
///

/// Ordered bound parameters for one statement.
pub type Params = Vec<Value>;

/// DBAPI-style positional placeholder; the driver substitutes it.
pub const PLACEHOLDER: &str = "%s";

// SQL pattern-match operators; registered as comparisons the first time a
// dialect is constructed.
pub const LIKE: Operator = Operator::from_static("$like");
pub const NOT_LIKE: Operator = Operator::from_static("$not_like");

static REGISTER_SQL_OPERATORS: Once = Once::new();

fn register_sql_operators() {
    REGISTER_SQL_OPERATORS.call_once(|| {
        COMPARE.extend(&[LIKE, NOT_LIKE]);
    });
}

///
/// CompileError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum CompileError {
    #[error("the {dialect} dialect has no spelling for operator '{token}'")]
    UnregisteredOperator { dialect: &'static str, token: String },

    #[error("unsupported expression: {detail}")]
    UnsupportedExpression { detail: String },
}

///
/// Dialect
///

pub trait Dialect {
    fn name(&self) -> &'static str;

    fn query(&self, query: &Query) -> Result<(String, Params), CompileError>;

    fn update(&self, update: &Update) -> Result<(String, Params), CompileError>;

    fn delete(&self, delete: &Delete) -> Result<(String, Params), CompileError>;

    /// Multi-row statement: one SQL string, one parameter vector per row.
    fn insert(&self, insert: &Insert) -> Result<(String, Vec<Params>), CompileError>;

    /// Compile a bare predicate, e.g. for logging or diagnostics.
    fn predicate(&self, predicate: &Predicate) -> Result<(String, Params), CompileError>;

    /// Pass-through for hand-written SQL.
    fn raw(&self, sql: &str) -> (String, Params) {
        (sql.to_string(), Params::new())
    }
}

///
/// SqlStyle
///
/// The per-dialect knobs the shared emitter is parameterized over:
/// identifier spelling, operator symbols, and insert column policy.
///

pub(crate) trait SqlStyle {
    const NAME: &'static str;

    /// Drop primary-key columns whose value in the first row is null,
    /// leaving id assignment to the database.
    const DROP_UNSET_PRIMARY: bool;

    fn table_ident(table: &str) -> String;

    fn field_ident(field: &crate::model::FieldRef) -> String;

    fn symbol(operator: Operator) -> Option<&'static str>;
}

fn unregistered<S: SqlStyle>(operator: Operator) -> CompileError {
    CompileError::UnregisteredOperator {
        dialect: S::NAME,
        token: operator.token().to_string(),
    }
}

fn unsupported(detail: impl Into<String>) -> CompileError {
    CompileError::UnsupportedExpression {
        detail: detail.into(),
    }
}

pub(crate) fn compile_query<S: SqlStyle>(query: &Query) -> Result<(String, Params), CompileError> {
    let mut sql = vec!["select".to_string()];
    let mut params = Params::new();

    let projection: Vec<String> = query.fields.iter().map(select_item::<S>).collect();
    sql.push(projection.join(", "));
    sql.push("from".to_string());
    sql.push(S::table_ident(query.table().name()));

    push_where::<S>(&query.filters, &mut sql, &mut params)?;

    if !query.sorts.is_empty() {
        sql.push("order".to_string());
        sql.push("by".to_string());
        let keys: Vec<String> = query
            .sorts
            .iter()
            .map(|(field, ascending)| {
                let direction = if *ascending { "asc" } else { "desc" };
                format!("{} {direction}", S::field_ident(field))
            })
            .collect();
        sql.push(keys.join(", "));
    }

    if let Some(rows) = query.rows.filter(|rows| *rows > 0) {
        sql.push("limit".to_string());
        match query.offset {
            Some(offset) if offset > 0 => sql.push(format!("{offset}, {rows}")),
            _ => sql.push(rows.to_string()),
        }
    }

    Ok((sql.join(" "), params))
}

pub(crate) fn compile_update<S: SqlStyle>(
    update: &Update,
) -> Result<(String, Params), CompileError> {
    let mut sql = vec![
        "update".to_string(),
        S::table_ident(update.table().name()),
        "set".to_string(),
    ];
    let mut params = Params::new();

    let changes: Vec<String> = update
        .changes
        .iter()
        .map(|(field, value)| {
            params.push(value.clone());
            format!("{} = {PLACEHOLDER}", S::field_ident(field))
        })
        .collect();
    sql.push(changes.join(", "));

    push_where::<S>(&update.filters, &mut sql, &mut params)?;

    Ok((sql.join(" "), params))
}

pub(crate) fn compile_delete<S: SqlStyle>(
    delete: &Delete,
) -> Result<(String, Params), CompileError> {
    let mut sql = vec![
        "delete".to_string(),
        "from".to_string(),
        S::table_ident(delete.table().name()),
    ];
    let mut params = Params::new();

    push_where::<S>(&delete.filters, &mut sql, &mut params)?;

    Ok((sql.join(" "), params))
}

pub(crate) fn compile_insert<S: SqlStyle>(
    insert: &Insert,
) -> Result<(String, Vec<Params>), CompileError> {
    let model = insert.table();
    let mut keep: Vec<usize> = (0..model.fields().len()).collect();

    if S::DROP_UNSET_PRIMARY {
        if let Some(first) = insert.rows.first() {
            keep.retain(|pos| !(model.fields()[*pos].is_primary() && first[*pos].is_null()));
        }
    }

    let columns: Vec<String> = keep
        .iter()
        .map(|pos| S::field_ident(&model.fields()[*pos]))
        .collect();
    let placeholders = vec![PLACEHOLDER; keep.len()].join(", ");

    let sql = [
        "insert".to_string(),
        "into".to_string(),
        S::table_ident(model.name()),
        format!("({})", columns.join(", ")),
        "values".to_string(),
        format!("({placeholders})"),
    ]
    .join(" ");

    let rows = insert
        .rows
        .iter()
        .map(|row| keep.iter().map(|pos| row[*pos].clone()).collect())
        .collect();

    Ok((sql, rows))
}

pub(crate) fn compile_predicate<S: SqlStyle>(
    predicate: &Predicate,
) -> Result<(String, Params), CompileError> {
    let mut sql = Vec::new();
    let mut params = Params::new();

    emit_predicate::<S>(predicate, &mut sql, &mut params)?;

    Ok((sql.join(" "), params))
}

fn push_where<S: SqlStyle>(
    filters: &[Predicate],
    sql: &mut Vec<String>,
    params: &mut Params,
) -> Result<(), CompileError> {
    if filters.is_empty() {
        return Ok(());
    }

    sql.push("where".to_string());
    emit_predicate::<S>(&and_(filters.to_vec()), sql, params)
}

fn emit_predicate<S: SqlStyle>(
    pred: &Predicate,
    sql: &mut Vec<String>,
    params: &mut Params,
) -> Result<(), CompileError> {
    if LOGIC.contains(pred.op) {
        let joiner = S::symbol(pred.op).ok_or_else(|| unregistered::<S>(pred.op))?;
        for (pos, operand) in pred.values.iter().enumerate() {
            if pos > 0 {
                sql.push(joiner.to_string());
            }
            // a logic subtree with a different joiner keeps its own parens
            let bracket =
                matches!(operand, Expr::Pred(child) if LOGIC.contains(child.op) && child.op != pred.op);
            if bracket {
                sql.push("(".to_string());
            }
            emit_operand::<S>(operand, sql, params)?;
            if bracket {
                sql.push(")".to_string());
            }
        }
        return Ok(());
    }

    if ARITHMETIC.contains(pred.op) {
        let [lhs, rhs] = pred.values.as_slice() else {
            return Err(unsupported(format!(
                "arithmetic operator '{}' expects two operands",
                pred.op
            )));
        };
        let symbol = S::symbol(pred.op).ok_or_else(|| unregistered::<S>(pred.op))?;

        emit_operand::<S>(lhs, sql, params)?;
        sql.push(symbol.to_string());
        match rhs {
            Expr::Value(value) => {
                sql.push(PLACEHOLDER.to_string());
                params.push(value.clone());
            }
            _ => return Err(unsupported("arithmetic right-hand side must be a literal")),
        }
        return Ok(());
    }

    if COMPARE.contains(pred.op) {
        let [lhs, rhs] = pred.values.as_slice() else {
            return Err(unsupported(format!(
                "comparison operator '{}' expects two operands",
                pred.op
            )));
        };

        match rhs {
            Expr::Value(Value::Null) if pred.op == op::EQ => {
                emit_operand::<S>(lhs, sql, params)?;
                sql.push("is null".to_string());
            }
            Expr::Value(Value::Null) if pred.op == op::NE => {
                emit_operand::<S>(lhs, sql, params)?;
                sql.push("is not null".to_string());
            }
            Expr::Value(value) => {
                let symbol = S::symbol(pred.op).ok_or_else(|| unregistered::<S>(pred.op))?;
                emit_operand::<S>(lhs, sql, params)?;
                sql.push(symbol.to_string());
                sql.push(PLACEHOLDER.to_string());
                params.push(value.clone());
            }
            _ => return Err(unsupported("comparison right-hand side must be a literal")),
        }
        return Ok(());
    }

    Err(unregistered::<S>(pred.op))
}

fn emit_operand<S: SqlStyle>(
    operand: &Expr,
    sql: &mut Vec<String>,
    params: &mut Params,
) -> Result<(), CompileError> {
    match operand {
        Expr::Field(field) => {
            sql.push(S::field_ident(field));
            Ok(())
        }
        Expr::Pred(pred) => emit_predicate::<S>(pred, sql, params),
        Expr::Value(_) => Err(unsupported("literal in identifier position")),
    }
}

fn select_item<S: SqlStyle>(item: &SelectItem) -> String {
    match item {
        SelectItem::Field(field) => S::field_ident(field),
        SelectItem::Count(inner) => format!("count({})", select_item::<S>(inner)),
        SelectItem::Distinct(inner) => format!("distinct {}", select_item::<S>(inner)),
        SelectItem::Star => "*".to_string(),
        SelectItem::One => "1".to_string(),
    }
}
