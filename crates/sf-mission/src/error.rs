//! Error types for segment and mission evaluation.

use sf_core::SfError;
use sf_grid::GridError;
use sf_process::ProcessError;
use sf_solver::{FailureReason, SolverError};
use sf_state::StateError;
use thiserror::Error;

use crate::segment::SegmentStatus;

/// Errors raised while building, solving or sequencing segments.
///
/// Errors from the lower crates are wrapped with `#[from]` so the original
/// variant survives all the way to the caller.
#[derive(Error, Debug)]
pub enum MissionError {
    #[error(transparent)]
    Core(#[from] SfError),

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error("Segment '{segment}': invalid transition {from} -> {to}")]
    InvalidTransition {
        segment: String,
        from: SegmentStatus,
        to: SegmentStatus,
    },

    #[error(
        "Segment '{segment}' did not converge ({reason}) after {iterations} iterations, residual norm = {residual_norm:e}"
    )]
    SegmentFailed {
        segment: String,
        residual_norm: f64,
        iterations: usize,
        reason: FailureReason,
    },
}

pub type MissionResult<T> = Result<T, MissionError>;

impl MissionError {
    pub(crate) fn config(what: impl Into<String>) -> Self {
        MissionError::Configuration { what: what.into() }
    }

    /// True for a solver convergence failure (the only recoverable error).
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, MissionError::Solver(e) if e.is_convergence_failure())
    }

    /// Last accepted iterate of a solver convergence failure.
    pub fn best_effort(&self) -> Option<&[f64]> {
        match self {
            MissionError::Solver(e) => e.best_effort(),
            _ => None,
        }
    }
}
