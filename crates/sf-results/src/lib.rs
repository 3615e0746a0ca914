//! sf-results: condition archives and the mission run store.

pub mod archive;
pub mod hash;
pub mod store;
pub mod types;

pub use archive::{ArchivedArray, ConditionArchive};
pub use hash::compute_run_id;
pub use store::ResultStore;
pub use types::*;

use sf_state::StateError;

pub type ResultsResult<T> = Result<T, ResultsError>;

#[derive(thiserror::Error, Debug)]
pub enum ResultsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Non-finite value {value} at '{path}' cannot be archived")]
    NonFinite { path: String, value: f64 },

    #[error("Archived array '{path}' is {rows}x{cols} but holds {len} values")]
    ShapeMismatch {
        path: String,
        rows: usize,
        cols: usize,
        len: usize,
    },

    #[error("State error: {0}")]
    State(#[from] StateError),

    #[error("Run not found: {run_id}")]
    RunNotFound { run_id: String },

    #[error("Segment '{segment}' not found in run {run_id}")]
    SegmentNotFound { run_id: String, segment: String },

    #[error("Archive name '{file}' is not a plain file name")]
    InvalidArchiveName { file: String },
}
