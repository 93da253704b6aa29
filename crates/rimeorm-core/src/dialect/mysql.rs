use crate::{
    dialect::{
        CompileError, Dialect, PLACEHOLDER, Params, SqlStyle, compile_delete, compile_insert,
        compile_predicate, compile_query, compile_update, register_sql_operators,
    },
    expr::Predicate,
    model::{FieldRef, Record},
    operator::Operator,
    query::{Delete, Insert, Query, Update},
    value::Value,
};

///
/// MySql
///
/// Backtick-quoted, table-qualified identifiers. Declared fields render as
/// `` `table`.`field` ``; raw dotted paths quote each segment.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct MySql;

impl MySql {
    #[must_use]
    pub fn new() -> Self {
        register_sql_operators();
        Self
    }

    /// `insert .. on duplicate key update` over the record's table: every
    /// column is inserted, every non-primary column is updated on conflict.
    pub fn upsert<R: Record>(&self, record: &R) -> Result<(String, Params), CompileError> {
        let model = R::model();

        let columns: Vec<String> = model.fields().iter().map(Self::field_ident).collect();
        let placeholders = vec![PLACEHOLDER; columns.len()].join(", ");
        let updates: Vec<String> = model
            .petty_fields()
            .map(|field| format!("{} = {PLACEHOLDER}", Self::field_ident(field)))
            .collect();

        let sql = [
            "insert".to_string(),
            "into".to_string(),
            Self::table_ident(model.name()),
            format!("({})", columns.join(", ")),
            "values".to_string(),
            format!("({placeholders})"),
            "on".to_string(),
            "duplicate".to_string(),
            "key".to_string(),
            "update".to_string(),
            updates.join(", "),
        ]
        .join(" ");

        let mut params: Params = model
            .fields()
            .iter()
            .map(|field| record.get(field.name()).unwrap_or(Value::Null))
            .collect();
        for field in model.petty_fields() {
            params.push(record.get(field.name()).unwrap_or(Value::Null));
        }

        Ok((sql, params))
    }
}

fn quote(part: &str) -> String {
    format!("`{part}`")
}

impl SqlStyle for MySql {
    const NAME: &'static str = "mysql";
    const DROP_UNSET_PRIMARY: bool = false;

    fn table_ident(table: &str) -> String {
        quote(table)
    }

    fn field_ident(field: &FieldRef) -> String {
        match field.table() {
            Some(table) => format!("{}.{}", quote(table), quote(field.name())),
            None => field
                .name()
                .split('.')
                .map(quote)
                .collect::<Vec<_>>()
                .join("."),
        }
    }

    fn symbol(operator: Operator) -> Option<&'static str> {
        let symbol = match operator.token() {
            "$add" => "+",
            "$sub" => "-",
            "$mul" => "*",
            // historical symbol table: true division spells `div`
            "$truediv" => "div",
            "$floordiv" => "/",
            "$mod" => "%",
            "$gt" => ">",
            "$gte" => ">=",
            "$lt" => "<",
            "$lte" => "<=",
            "$eq" => "=",
            "$ne" => "!=",
            "$in" => "in",
            "$nin" => "not in",
            "$regex" => "REGEXP",
            "$like" => "like",
            "$not_like" => "not like",
            "$and" => "and",
            "$or" => "or",
            _ => return None,
        };

        Some(symbol)
    }
}

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn query(&self, query: &Query) -> Result<(String, Params), CompileError> {
        compile_query::<Self>(query)
    }

    fn update(&self, update: &Update) -> Result<(String, Params), CompileError> {
        compile_update::<Self>(update)
    }

    fn delete(&self, delete: &Delete) -> Result<(String, Params), CompileError> {
        compile_delete::<Self>(delete)
    }

    fn insert(&self, insert: &Insert) -> Result<(String, Vec<Params>), CompileError> {
        compile_insert::<Self>(insert)
    }

    fn predicate(&self, predicate: &Predicate) -> Result<(String, Params), CompileError> {
        compile_predicate::<Self>(predicate)
    }
}
