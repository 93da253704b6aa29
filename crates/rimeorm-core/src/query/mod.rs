use crate::{
    expr::{Predicate, eq},
    model::{FieldRef, Record, TableModel},
    value::{FieldValue, Value},
};
use thiserror::Error as ThisError;


///
/// Query builders
///
/// Value-semantics statement descriptions. Builders validate field names
/// eagerly, so a bad name fails where it is written, never inside a
/// compiler; the compilers may assume a well-formed statement.
///

///
/// QueryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("table '{table}' has no field '{field}'")]
    FieldNotFound { table: String, field: String },

    #[error("filter document must be a json object, got: {got}")]
    FilterShape { got: String },
}

///
/// SelectItem
///
/// One projection column. `Star` and `One` exist so `count(*)` and
/// `count(1)` render without identifier quoting.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SelectItem {
    Field(FieldRef),
    Count(Box<SelectItem>),
    Distinct(Box<SelectItem>),
    Star,
    One,
}

impl From<FieldRef> for SelectItem {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<&FieldRef> for SelectItem {
    fn from(field: &FieldRef) -> Self {
        Self::Field(field.clone())
    }
}

///
/// FieldArg
///
/// Builder argument: either a resolved handle or a raw name to resolve
/// against the statement's table.
///

#[derive(Clone, Debug)]
pub enum FieldArg {
    Ref(FieldRef),
    Name(String),
}

impl From<FieldRef> for FieldArg {
    fn from(field: FieldRef) -> Self {
        Self::Ref(field)
    }
}

impl From<&FieldRef> for FieldArg {
    fn from(field: &FieldRef) -> Self {
        Self::Ref(field.clone())
    }
}

impl From<&str> for FieldArg {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldArg {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

///
/// CountArg
///

#[derive(Clone, Debug)]
pub enum CountArg {
    Star,
    One,
    Ref(FieldRef),
    Name(String),
}

impl From<&str> for CountArg {
    fn from(name: &str) -> Self {
        match name {
            "*" => Self::Star,
            "1" => Self::One,
            _ => Self::Name(name.to_string()),
        }
    }
}

impl From<i32> for CountArg {
    fn from(value: i32) -> Self {
        if value == 1 {
            Self::One
        } else {
            Self::Name(value.to_string())
        }
    }
}

impl From<FieldRef> for CountArg {
    fn from(field: FieldRef) -> Self {
        Self::Ref(field)
    }
}

impl From<&FieldRef> for CountArg {
    fn from(field: &FieldRef) -> Self {
        Self::Ref(field.clone())
    }
}

///
/// Query
///
/// A select statement: projection, filters, sort keys, and window. The
/// projection defaults to every declared field.
///

#[derive(Clone, Debug)]
pub struct Query {
    table: &'static TableModel,
    pub(crate) fields: Vec<SelectItem>,
    pub(crate) filters: Vec<Predicate>,
    pub(crate) sorts: Vec<(FieldRef, bool)>,
    pub(crate) offset: Option<u64>,
    pub(crate) rows: Option<u64>,
}

impl Query {
    #[must_use]
    pub fn new(table: &'static TableModel) -> Self {
        Self {
            table,
            fields: table.fields().iter().map(SelectItem::from).collect(),
            filters: Vec::new(),
            sorts: Vec::new(),
            offset: None,
            rows: None,
        }
    }

    #[must_use]
    pub const fn table(&self) -> &'static TableModel {
        self.table
    }

    #[must_use]
    pub fn fields(&self) -> &[SelectItem] {
        &self.fields
    }

    #[must_use]
    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    /// Replace the projection.
    pub fn select<I>(mut self, fields: I) -> Result<Self, QueryError>
    where
        I: IntoIterator,
        I::Item: Into<FieldArg>,
    {
        let mut items = Vec::new();
        for arg in fields {
            items.push(SelectItem::Field(self.resolve(arg.into())?));
        }
        self.fields = items;

        Ok(self)
    }

    /// Append filter predicates; they combine with `and` at compile time.
    #[must_use]
    pub fn filter(mut self, preds: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(preds);
        self
    }

    /// Alias for [`filter`](Self::filter).
    #[must_use]
    pub fn where_(self, preds: impl IntoIterator<Item = Predicate>) -> Self {
        self.filter(preds)
    }

    /// Name-resolving equality shorthand.
    pub fn filter_eq(mut self, name: &str, value: impl FieldValue) -> Result<Self, QueryError> {
        let field = self.resolve_name(name)?;
        self.filters.push(eq(field, value.to_value()));

        Ok(self)
    }

    /// Equality filters from a `{"field": value}` document.
    pub fn filter_map(mut self, doc: &serde_json::Value) -> Result<Self, QueryError> {
        let serde_json::Value::Object(map) = doc else {
            return Err(QueryError::FilterShape {
                got: doc.to_string(),
            });
        };

        for (name, value) in map {
            let field = self.resolve_name(name)?;
            self.filters.push(eq(field, Value::from_json(value)));
        }

        Ok(self)
    }

    /// Append sort keys; `true` is ascending.
    #[must_use]
    pub fn order_by(mut self, keys: impl IntoIterator<Item = (FieldRef, bool)>) -> Self {
        self.sorts.extend(keys);
        self
    }

    pub fn order_by_field(mut self, name: &str, ascending: bool) -> Result<Self, QueryError> {
        let field = self.resolve_name(name)?;
        self.sorts.push((field, ascending));

        Ok(self)
    }

    #[must_use]
    pub const fn limit(mut self, offset: u64, rows: u64) -> Self {
        self.offset = Some(offset);
        self.rows = Some(rows);
        self
    }

    #[must_use]
    pub const fn first(mut self) -> Self {
        self.offset = None;
        self.rows = Some(1);
        self
    }

    #[must_use]
    pub const fn all(mut self) -> Self {
        self.offset = None;
        self.rows = None;
        self
    }

    /// Window onto page `page` (1-indexed) of size `page_size`.
    #[must_use]
    pub const fn paginate(self, page: u64, page_size: u64) -> Self {
        self.limit(page.saturating_sub(1).saturating_mul(page_size), page_size)
    }

    /// Replace the projection with a single `count(..)` column.
    #[must_use]
    pub fn count(mut self, arg: impl Into<CountArg>) -> Self {
        let inner = match arg.into() {
            CountArg::Star => SelectItem::Star,
            CountArg::One => SelectItem::One,
            CountArg::Ref(field) => SelectItem::Field(field),
            CountArg::Name(name) => SelectItem::Field(self.table.field(&name)),
        };
        self.fields = vec![SelectItem::Count(Box::new(inner))];
        self
    }

    /// Replace the projection with `distinct <field>`.
    #[must_use]
    pub fn distinct(mut self, arg: impl Into<FieldArg>) -> Self {
        let field = self.resolve_lenient(arg.into());
        self.fields = vec![SelectItem::Distinct(Box::new(SelectItem::Field(field)))];
        self
    }

    /// Replace the projection with `count(distinct <field>)`.
    #[must_use]
    pub fn count_distinct(mut self, arg: impl Into<FieldArg>) -> Self {
        let field = self.resolve_lenient(arg.into());
        self.fields = vec![SelectItem::Count(Box::new(SelectItem::Distinct(Box::new(
            SelectItem::Field(field),
        ))))];
        self
    }

    fn resolve(&self, arg: FieldArg) -> Result<FieldRef, QueryError> {
        match arg {
            FieldArg::Ref(field) => Ok(field),
            FieldArg::Name(name) => self.resolve_name(&name),
        }
    }

    fn resolve_name(&self, name: &str) -> Result<FieldRef, QueryError> {
        self.table
            .get_field(name)
            .cloned()
            .ok_or_else(|| QueryError::FieldNotFound {
                table: self.table.name().to_string(),
                field: name.to_string(),
            })
    }

    // projections may name columns the model does not declare
    fn resolve_lenient(&self, arg: FieldArg) -> FieldRef {
        match arg {
            FieldArg::Ref(field) => field,
            FieldArg::Name(name) => self.table.field(&name),
        }
    }
}

///
/// Update
///

#[derive(Clone, Debug)]
pub struct Update {
    table: &'static TableModel,
    pub(crate) filters: Vec<Predicate>,
    pub(crate) changes: Vec<(FieldRef, Value)>,
}

impl Update {
    #[must_use]
    pub const fn new(table: &'static TableModel) -> Self {
        Self {
            table,
            filters: Vec::new(),
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &'static TableModel {
        self.table
    }

    /// Set one column. Assigning the same column twice keeps the last value
    /// and its original position.
    pub fn set(mut self, name: &str, value: impl FieldValue) -> Result<Self, QueryError> {
        let field = self
            .table
            .get_field(name)
            .cloned()
            .ok_or_else(|| QueryError::FieldNotFound {
                table: self.table.name().to_string(),
                field: name.to_string(),
            })?;

        let value = value.to_value();
        if let Some(entry) = self.changes.iter_mut().find(|(f, _)| f.name() == name) {
            entry.1 = value;
        } else {
            self.changes.push((field, value));
        }

        Ok(self)
    }

    #[must_use]
    pub fn filter(mut self, preds: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(preds);
        self
    }
}

///
/// Delete
///

#[derive(Clone, Debug)]
pub struct Delete {
    table: &'static TableModel,
    pub(crate) filters: Vec<Predicate>,
}

impl Delete {
    #[must_use]
    pub const fn new(table: &'static TableModel) -> Self {
        Self {
            table,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub const fn table(&self) -> &'static TableModel {
        self.table
    }

    #[must_use]
    pub fn filter(mut self, preds: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(preds);
        self
    }
}

///
/// Insert
///
/// Rows are snapshotted in declaration order when added, so later record
/// mutation cannot change the statement.
///

#[derive(Clone, Debug)]
pub struct Insert {
    table: &'static TableModel,
    pub(crate) rows: Vec<Vec<Value>>,
}

impl Insert {
    #[must_use]
    pub const fn new(table: &'static TableModel) -> Self {
        Self {
            table,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn of<R: Record>() -> Self {
        Self::new(R::model())
    }

    #[must_use]
    pub const fn table(&self) -> &'static TableModel {
        self.table
    }

    #[must_use]
    pub fn row<R: Record>(mut self, record: &R) -> Self {
        let values = self
            .table
            .fields()
            .iter()
            .map(|field| record.get(field.name()).unwrap_or(Value::Null))
            .collect();
        self.rows.push(values);
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
