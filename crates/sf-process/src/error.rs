//! Error types for process tree edits and lookups.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProcessError {
    #[error("Process step not found: {path}")]
    StepNotFound { path: String },

    #[error("Process path '{path}' passes through a step, not a node")]
    NotANode { path: String },

    #[error("Invalid process path: '{path}'")]
    InvalidPath { path: String },
}

pub type ProcessResult<T> = Result<T, ProcessError>;
