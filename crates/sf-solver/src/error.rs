//! Error types for root solving.

use std::fmt;
use thiserror::Error;

/// Why a solve stopped without converging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MaxIterations,
    NonFiniteResidual,
    SingularJacobian,
    LineSearchStagnated,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::MaxIterations => "iteration cap reached",
            FailureReason::NonFiniteResidual => "non-finite residual",
            FailureReason::SingularJacobian => "singular Jacobian",
            FailureReason::LineSearchStagnated => "line search stagnated",
        };
        f.write_str(s)
    }
}

/// Errors that can occur during root solving.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Configuration error: {what}")]
    Configuration { what: String },

    #[error(
        "Convergence failed ({reason}) after {iterations} iterations, residual norm = {residual_norm:e}"
    )]
    ConvergenceFailure {
        reason: FailureReason,
        iterations: usize,
        residual_norm: f64,
        residuals: Vec<f64>,
        /// Last accepted iterate. Its residuals are finite unless the
        /// starting point already was not.
        x: Vec<f64>,
    },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl SolverError {
    pub(crate) fn failure(
        reason: FailureReason,
        iterations: usize,
        residuals: &[f64],
        x: &[f64],
    ) -> Self {
        SolverError::ConvergenceFailure {
            reason,
            iterations,
            residual_norm: sf_core::inf_norm(residuals),
            residuals: residuals.to_vec(),
            x: x.to_vec(),
        }
    }

    /// Last accepted iterate of a convergence failure.
    pub fn best_effort(&self) -> Option<&[f64]> {
        match self {
            SolverError::ConvergenceFailure { x, .. } => Some(x),
            SolverError::Configuration { .. } => None,
        }
    }

    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, SolverError::ConvergenceFailure { .. })
    }
}
