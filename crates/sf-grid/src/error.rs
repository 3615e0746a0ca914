//! Error types for grid construction and use.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Grid operator is singular: {what}")]
    SingularOperator { what: &'static str },

    #[error("Dimension mismatch: grid has {expected} points, values have {found} rows")]
    DimensionMismatch { expected: usize, found: usize },
}

pub type GridResult<T> = Result<T, GridError>;
