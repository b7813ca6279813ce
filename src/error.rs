//! Error types.
//!
//! Model errors are fatal for the model being loaded: no partial tree or
//! formula is ever handed out. Configuration errors are recoverable by the
//! caller. Solver errors abort compilation and are never turned into an
//! approximate answer.

use thiserror::Error;

/// Failure of the decision-diagram backend.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SolverError {
    #[error("node budget of {limit} nodes exhausted")]
    NodeLimit { limit: usize },
}

/// Failure while building a feature tree or compiling its formula.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ModelError {
    #[error("malformed feature model: {0}")]
    StructuralError(String),

    #[error("unknown operator `{op}` with {arity} operand(s)")]
    UnknownOperator { op: String, arity: usize },

    #[error("solver failure: {0}")]
    Solver(#[from] SolverError),
}

impl ModelError {
    pub(crate) fn structural(message: impl Into<String>) -> Self {
        ModelError::StructuralError(message.into())
    }
}

/// Failure on a configuration: persisting, restoring or editing it.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("configuration is not complete")]
    Incomplete,

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),

    #[error("feature `{0}` does not carry a value")]
    NoValue(String),

    #[error("malformed configuration document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("cannot encode configuration document: {0}")]
    Encode(#[source] serde_json::Error),
}
