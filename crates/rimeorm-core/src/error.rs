use crate::{
    dialect::CompileError,
    expr::EncodeError,
    model::{DefineError, ModelError},
    operator::OperatorError,
    query::QueryError,
};
use thiserror::Error as ThisError;

///
/// Error
///
/// Single error surface for callers that do not want to match on the
/// per-module enums. Every module error converts into this via `From`.
///

#[derive(Debug, ThisError)]
pub enum Error {
    #[error(transparent)]
    Operator(#[from] OperatorError),

    #[error(transparent)]
    Define(#[from] DefineError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}
