//! Core of Rimeorm: operator registry, predicate IR, table metadata, query
//! builders, and the per-dialect SQL compilers.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod dialect;
pub mod error;
pub mod expr;
pub mod model;
pub mod operator;
pub mod query;
pub mod value;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, compilers, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        expr::{Expr, Predicate, and_, eq, in_, or_},
        model::{FieldDef, FieldRef, Record, TableModel},
        query::{Delete, Insert, Query, SelectItem, Update},
        value::{FieldValue, Value},
    };
}
