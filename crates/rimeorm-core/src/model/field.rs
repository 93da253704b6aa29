use crate::{
    expr::{self, Predicate},
    model::FieldDef,
    query::SelectItem,
    value::{FieldValue, Value},
};
use std::{fmt, sync::Arc};

///
/// ValueFactory
///
/// Produces a value at instance time (defaults) or on every mutation
/// (hot fields).
///

pub type ValueFactory = fn() -> Value;

///
/// FieldRef
///
/// Shared, immutable handle to one column. Two kinds exist:
///
/// - declared: created by `TableModel::define`, carries table binding and
///   attributes;
/// - synthetic: wraps a raw (possibly dotted) path so ad hoc expressions can
///   reference columns no model declares.
///
/// Cloning is an `Arc` bump; every builder method returns a fresh predicate
/// or select item and leaves the field untouched.
///

#[derive(Clone, Debug)]
pub struct FieldRef {
    inner: Arc<FieldInner>,
}

#[derive(Debug)]
struct FieldInner {
    name: String,
    table: String,
    primary: bool,
    autoincrement: bool,
    nullable: bool,
    default: Option<Value>,
    default_factory: Option<ValueFactory>,
    update_factory: Option<ValueFactory>,
    declared: bool,
}

impl FieldRef {
    pub(crate) fn declared(table: &str, def: FieldDef) -> Self {
        // unassigned auto-increment keys start out unset
        let nullable = def.nullable || def.autoincrement;

        Self {
            inner: Arc::new(FieldInner {
                name: def.name,
                table: table.to_string(),
                primary: def.primary,
                autoincrement: def.autoincrement,
                nullable,
                default: def.default,
                default_factory: def.default_factory,
                update_factory: def.update_factory,
                declared: true,
            }),
        }
    }

    /// Wrap a raw column path, e.g. `"age"` or `"user.age"`.
    #[must_use]
    pub fn synthetic(path: &str) -> Self {
        Self {
            inner: Arc::new(FieldInner {
                name: path.to_string(),
                table: String::new(),
                primary: false,
                autoincrement: false,
                nullable: true,
                default: None,
                default_factory: None,
                update_factory: None,
                declared: false,
            }),
        }
    }

    pub(crate) fn synthetic_on(table: &str, name: &str) -> Self {
        Self {
            inner: Arc::new(FieldInner {
                name: name.to_string(),
                table: table.to_string(),
                primary: false,
                autoincrement: false,
                nullable: true,
                default: None,
                default_factory: None,
                update_factory: None,
                declared: false,
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Table binding, if any. Unbound synthetic fields have none.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        if self.inner.table.is_empty() {
            None
        } else {
            Some(&self.inner.table)
        }
    }

    #[must_use]
    pub fn is_declared(&self) -> bool {
        self.inner.declared
    }

    #[must_use]
    pub fn is_primary(&self) -> bool {
        self.inner.primary
    }

    #[must_use]
    pub fn is_autoincrement(&self) -> bool {
        self.inner.autoincrement
    }

    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.inner.nullable
    }

    /// A field is hot when it has an update factory, re-evaluated on every
    /// mutation of its record.
    #[must_use]
    pub fn is_hot(&self) -> bool {
        self.inner.update_factory.is_some()
    }

    #[must_use]
    pub fn default(&self) -> Option<&Value> {
        self.inner.default.as_ref()
    }

    #[must_use]
    pub fn default_factory(&self) -> Option<ValueFactory> {
        self.inner.default_factory
    }

    #[must_use]
    pub fn update_factory(&self) -> Option<ValueFactory> {
        self.inner.update_factory
    }

    /// The dotted path this field stands for: `table.name` when bound,
    /// the raw path otherwise.
    #[must_use]
    pub fn qualified(&self) -> String {
        match self.table() {
            Some(table) => format!("{table}.{}", self.inner.name),
            None => self.inner.name.clone(),
        }
    }

    //
    // comparison builders
    //

    #[must_use]
    pub fn eq(&self, value: impl FieldValue) -> Predicate {
        expr::eq(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn ne(&self, value: impl FieldValue) -> Predicate {
        expr::ne(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn gt(&self, value: impl FieldValue) -> Predicate {
        expr::gt(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn gte(&self, value: impl FieldValue) -> Predicate {
        expr::gte(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn lt(&self, value: impl FieldValue) -> Predicate {
        expr::lt(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn lte(&self, value: impl FieldValue) -> Predicate {
        expr::lte(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn in_list(&self, values: impl IntoIterator<Item = impl FieldValue>) -> Predicate {
        expr::in_(self.clone(), values)
    }

    #[must_use]
    pub fn not_in(&self, values: impl IntoIterator<Item = impl FieldValue>) -> Predicate {
        expr::nin(self.clone(), values)
    }

    #[must_use]
    pub fn matches(&self, pattern: impl Into<String>) -> Predicate {
        expr::matches(self.clone(), pattern)
    }

    /// SQL pattern match. Compiles only against dialects that register the
    /// `$like` operators, which both shipped dialects do on construction.
    #[must_use]
    pub fn like(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::new(
            crate::dialect::LIKE,
            vec![self.clone().into(), Value::Text(pattern.into()).into()],
        )
    }

    #[must_use]
    pub fn not_like(&self, pattern: impl Into<String>) -> Predicate {
        Predicate::new(
            crate::dialect::NOT_LIKE,
            vec![self.clone().into(), Value::Text(pattern.into()).into()],
        )
    }

    //
    // arithmetic builders
    //

    #[must_use]
    pub fn add(&self, value: impl FieldValue) -> Predicate {
        expr::add(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn sub(&self, value: impl FieldValue) -> Predicate {
        expr::sub(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn mul(&self, value: impl FieldValue) -> Predicate {
        expr::mul(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn truediv(&self, value: impl FieldValue) -> Predicate {
        expr::truediv(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn floordiv(&self, value: impl FieldValue) -> Predicate {
        expr::floordiv(self.clone(), value.to_value())
    }

    #[must_use]
    pub fn rem(&self, value: impl FieldValue) -> Predicate {
        expr::rem(self.clone(), value.to_value())
    }

    //
    // sort / select builders
    //

    #[must_use]
    pub fn asc(&self) -> (Self, bool) {
        (self.clone(), true)
    }

    #[must_use]
    pub fn desc(&self) -> (Self, bool) {
        (self.clone(), false)
    }

    #[must_use]
    pub fn count(&self) -> SelectItem {
        SelectItem::Count(Box::new(SelectItem::Field(self.clone())))
    }

    #[must_use]
    pub fn distinct(&self) -> SelectItem {
        SelectItem::Distinct(Box::new(SelectItem::Field(self.clone())))
    }
}

impl PartialEq for FieldRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.declared == other.inner.declared
            && self.inner.table == other.inner.table
            && self.inner.name == other.inner.name
    }
}

impl Eq for FieldRef {}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}
