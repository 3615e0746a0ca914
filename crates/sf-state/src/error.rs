//! Error types for state access.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Missing field: {path}")]
    MissingField { path: String },

    #[error("Unknown '{name}' is already declared")]
    DuplicateUnknown { name: String },

    #[error("Residual '{name}' is already declared")]
    DuplicateResidual { name: String },

    #[error("Shape mismatch for '{name}': expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        name: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Path conflict at '{path}': {what}")]
    PathConflict { path: String, what: &'static str },

    #[error("Invalid path: '{path}'")]
    InvalidPath { path: String },
}

pub type StateResult<T> = Result<T, StateError>;
