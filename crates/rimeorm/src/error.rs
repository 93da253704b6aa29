use crate::session::SessionError;
use rimeorm_core::{
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
/// Top-level error for application code; every layer's error converts in.
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

    #[error(transparent)]
    Session(#[from] SessionError),
}
