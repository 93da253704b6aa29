//! ## Crate layout
//! - `core`: operator registry, predicate IR, table metadata, query builders,
//!   and the per-dialect SQL compilers.
//! - `session`: cursor-facing execution layer on top of compiled statements.
//!
//! The `prelude` module mirrors the surface used by application code.

pub use rimeorm_core as core;

pub mod error;
pub mod session;

pub use error::Error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
/// using _ brings traits into scope and avoids name conflicts
///

pub mod prelude {
    pub use crate::{
        core::{
            dialect::{Dialect as _, MySql, Params, Postgres},
            expr::{Expr, Predicate, and_, eq, in_, or_},
            model::{FieldDef, FieldRef, Record, TableModel},
            query::{Delete, Insert, Query, SelectItem, Update},
            value::{FieldValue as _, Value},
        },
        session::{Cursor as _, FromRow as _, Row, Session},
    };
}
