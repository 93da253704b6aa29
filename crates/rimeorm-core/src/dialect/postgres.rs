use crate::{
    dialect::{
        CompileError, Dialect, Params, SqlStyle, compile_delete, compile_insert,
        compile_predicate, compile_query, compile_update, register_sql_operators,
    },
    expr::Predicate,
    model::FieldRef,
    operator::Operator,
    query::{Delete, Insert, Query, Update},
};

///
/// Postgres
///
/// Unquoted, unqualified identifiers; raw dotted paths pass through as
/// written. Insert drops primary-key columns left null in the first row so
/// the database assigns them.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Postgres;

impl Postgres {
    #[must_use]
    pub fn new() -> Self {
        register_sql_operators();
        Self
    }
}

impl SqlStyle for Postgres {
    const NAME: &'static str = "postgresql";
    const DROP_UNSET_PRIMARY: bool = true;

    fn table_ident(table: &str) -> String {
        table.to_string()
    }

    fn field_ident(field: &FieldRef) -> String {
        field.name().to_string()
    }

    fn symbol(operator: Operator) -> Option<&'static str> {
        let symbol = match operator.token() {
            "$add" => "+",
            "$sub" => "-",
            "$mul" => "*",
            "$truediv" => "/",
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
            "$regex" => "~",
            "$like" => "like",
            "$not_like" => "not like",
            "$and" => "and",
            "$or" => "or",
            _ => return None,
        };

        Some(symbol)
    }
}

impl Dialect for Postgres {
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
