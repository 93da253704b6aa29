use crate::value::Value;
use std::collections::HashMap;
use thiserror::Error as ThisError;

mod field;
#[cfg(test)]
mod tests;

pub use field::{FieldRef, ValueFactory};

///
/// Table metadata
///
/// A `TableModel` is the runtime description of one table: declaration-ordered
/// fields, primary-key partition, and the optional auto-increment column.
/// Models are built eagerly through `TableModel::define` so every structural
/// invariant fails at definition time, not at first query.
///

///
/// DefineError
///
/// Raised while building a model. Definition is program setup, so these are
/// bugs in the caller, not runtime conditions.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum DefineError {
    #[error("table '{table}' declares field '{field}' twice")]
    DuplicateField { table: String, field: String },

    #[error("field '{table}.{field}' is auto-increment and cannot carry a default")]
    FieldAttributeConflict { table: String, field: String },

    #[error("table '{table}' already has an auto-increment field; '{field}' is the second")]
    AutoIncrementFieldExists { table: String, field: String },

    #[error("table '{table}' has no primary key")]
    PrimaryKeyMissing { table: String },
}

///
/// ModelError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ModelError {
    #[error("primary key '{field}' is already set and cannot be modified")]
    PrimaryKeyModify { field: String },

    #[error("field '{field}' is not nullable")]
    NotNullable { field: String },

    #[error("table '{table}' has no field '{field}'")]
    UnknownField { table: String, field: String },
}

///
/// FieldDef
///
/// One column declaration, consumed by `TableBuilder::field`.
///

#[derive(Clone, Debug)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) primary: bool,
    pub(crate) autoincrement: bool,
    pub(crate) nullable: bool,
    pub(crate) default: Option<Value>,
    pub(crate) default_factory: Option<ValueFactory>,
    pub(crate) update_factory: Option<ValueFactory>,
}

impl FieldDef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: false,
            autoincrement: false,
            nullable: false,
            default: None,
            default_factory: None,
            update_factory: None,
        }
    }

    #[must_use]
    pub const fn primary(mut self) -> Self {
        self.primary = true;
        self
    }

    #[must_use]
    pub const fn autoincrement(mut self) -> Self {
        self.autoincrement = true;
        self
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub const fn default_factory(mut self, factory: ValueFactory) -> Self {
        self.default_factory = Some(factory);
        self
    }

    /// Re-evaluated on every record mutation; marks the field hot.
    #[must_use]
    pub const fn update_factory(mut self, factory: ValueFactory) -> Self {
        self.update_factory = Some(factory);
        self
    }
}

///
/// TableBuilder
///

#[derive(Debug)]
pub struct TableBuilder {
    name: String,
    abstract_table: bool,
    fields: Vec<FieldDef>,
}

impl TableBuilder {
    #[must_use]
    pub fn field(mut self, def: FieldDef) -> Self {
        self.fields.push(def);
        self
    }

    /// Skip the primary-key requirement; used for shared base definitions
    /// that concrete tables extend.
    #[must_use]
    pub const fn abstract_table(mut self) -> Self {
        self.abstract_table = true;
        self
    }

    pub fn build(self) -> Result<TableModel, DefineError> {
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut index = HashMap::with_capacity(self.fields.len());
        let mut primary = Vec::new();
        let mut petty = Vec::new();
        let mut autoincrement = None;
        let mut hot = Vec::new();

        for def in self.fields {
            let pos = fields.len();

            if index.insert(def.name.clone(), pos).is_some() {
                return Err(DefineError::DuplicateField {
                    table: self.name,
                    field: def.name,
                });
            }
            if def.autoincrement && (def.default.is_some() || def.default_factory.is_some()) {
                return Err(DefineError::FieldAttributeConflict {
                    table: self.name,
                    field: def.name,
                });
            }
            if def.autoincrement {
                if autoincrement.is_some() {
                    return Err(DefineError::AutoIncrementFieldExists {
                        table: self.name,
                        field: def.name,
                    });
                }
                autoincrement = Some(pos);
            }

            if def.primary {
                primary.push(pos);
            } else {
                petty.push(pos);
            }
            if def.update_factory.is_some() {
                hot.push(pos);
            }

            fields.push(FieldRef::declared(&self.name, def));
        }

        if !self.abstract_table && primary.is_empty() {
            return Err(DefineError::PrimaryKeyMissing { table: self.name });
        }

        Ok(TableModel {
            name: self.name,
            fields,
            index,
            primary,
            petty,
            autoincrement,
            hot,
        })
    }
}

///
/// TableModel
///

#[derive(Debug)]
pub struct TableModel {
    name: String,
    fields: Vec<FieldRef>,
    index: HashMap<String, usize>,
    primary: Vec<usize>,
    petty: Vec<usize>,
    autoincrement: Option<usize>,
    hot: Vec<usize>,
}

impl TableModel {
    #[must_use]
    pub fn define(name: impl Into<String>) -> TableBuilder {
        TableBuilder {
            name: name.into(),
            abstract_table: false,
            fields: Vec::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &[FieldRef] {
        &self.fields
    }

    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldRef> {
        self.index.get(name).map(|pos| &self.fields[*pos])
    }

    /// Resolve a name to its declared field, or fall back to a synthetic
    /// field bound to this table. The fallback keeps ad hoc expressions
    /// expressible; builder paths that must reject unknown names go through
    /// `get_field`.
    #[must_use]
    pub fn field(&self, name: &str) -> FieldRef {
        self.get_field(name)
            .cloned()
            .unwrap_or_else(|| FieldRef::synthetic_on(&self.name, name))
    }

    pub fn primary_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.primary.iter().map(|pos| &self.fields[*pos])
    }

    /// Non-primary fields, in declaration order.
    pub fn petty_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.petty.iter().map(|pos| &self.fields[*pos])
    }

    #[must_use]
    pub fn autoincrement_field(&self) -> Option<&FieldRef> {
        self.autoincrement.map(|pos| &self.fields[pos])
    }

    pub fn hot_fields(&self) -> impl Iterator<Item = &FieldRef> {
        self.hot.iter().map(|pos| &self.fields[*pos])
    }

    #[must_use]
    pub fn is_hot(&self, name: &str) -> bool {
        self.get_field(name).is_some_and(FieldRef::is_hot)
    }
}

///
/// Record
///
/// Implemented by structs that mirror a table row. `get`/`set` move values
/// across the struct boundary by field name; the helpers below keep the
/// model's instance-level invariants on top of them.
///

pub trait Record {
    fn model() -> &'static TableModel
    where
        Self: Sized;

    fn get(&self, field: &str) -> Option<Value>;

    fn set(&mut self, field: &str, value: Value);
}

/// Write a driver-assigned row id into the auto-increment field.
///
/// Returns `false` (without writing) when the model has no auto-increment
/// field or the field already holds a value.
pub fn apply_auto_increment<R: Record>(record: &mut R, id: u64) -> bool {
    let Some(field) = R::model().autoincrement_field() else {
        return false;
    };

    match record.get(field.name()) {
        None | Some(Value::Null) => {
            record.set(field.name(), Value::Uint(id));
            true
        }
        Some(_) => false,
    }
}

/// Fill unset fields from their declared defaults.
///
/// Precedence per field: literal default, then default factory, then update
/// factory (hot fields start out stamped).
pub fn apply_defaults<R: Record>(record: &mut R) {
    for field in R::model().fields() {
        let unset = matches!(record.get(field.name()), None | Some(Value::Null));
        if !unset {
            continue;
        }

        if let Some(default) = field.default() {
            record.set(field.name(), default.clone());
        } else if let Some(factory) = field.default_factory() {
            record.set(field.name(), factory());
        } else if let Some(factory) = field.update_factory() {
            record.set(field.name(), factory());
        }
    }
}

/// Re-stamp every hot field.
pub fn touch_hot_fields<R: Record>(record: &mut R) {
    for field in R::model().hot_fields() {
        if let Some(factory) = field.update_factory() {
            record.set(field.name(), factory());
        }
    }
}

/// Guarded assignment: rejects reassigning a set primary key and null into a
/// non-nullable field, and re-stamps hot fields after any effective change.
pub fn assign<R: Record>(record: &mut R, name: &str, value: Value) -> Result<(), ModelError> {
    let model = R::model();
    let field = model.get_field(name).ok_or_else(|| ModelError::UnknownField {
        table: model.name().to_string(),
        field: name.to_string(),
    })?;

    let current = record.get(name);
    if field.is_primary() && !matches!(current, None | Some(Value::Null)) {
        return Err(ModelError::PrimaryKeyModify {
            field: name.to_string(),
        });
    }
    if !field.is_nullable() && value.is_null() {
        return Err(ModelError::NotNullable {
            field: name.to_string(),
        });
    }
    if current.as_ref() == Some(&value) {
        return Ok(());
    }

    record.set(name, value);
    if !model.is_hot(name) {
        touch_hot_fields(record);
    }

    Ok(())
}
