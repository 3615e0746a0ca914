//! Solver configuration and method presets.

use crate::error::{SolverError, SolverResult};

/// Nonlinear solver family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverMethod {
    /// Newton with a fresh Jacobian every iteration.
    #[default]
    Newton,
    /// Quasi-Newton with rank-one Jacobian updates.
    Broyden,
}

impl SolverMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SolverMethod::Newton => "newton",
            SolverMethod::Broyden => "broyden",
        }
    }

    /// Default configuration tuned for this method.
    ///
    /// Broyden takes more (but much cheaper) iterations than Newton, so it
    /// gets a larger iteration cap.
    pub fn to_config(&self) -> SolverConfig {
        match self {
            SolverMethod::Newton => SolverConfig {
                method: SolverMethod::Newton,
                max_iterations: 50,
                ..SolverConfig::base()
            },
            SolverMethod::Broyden => SolverConfig {
                method: SolverMethod::Broyden,
                max_iterations: 200,
                ..SolverConfig::base()
            },
        }
    }
}

/// Root solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub method: SolverMethod,
    /// Maximum nonlinear iterations
    pub max_iterations: usize,
    /// Convergence threshold on the residual infinity norm
    pub tolerance: f64,
    /// Relative finite-difference step for Jacobian columns
    pub fd_step: f64,
    /// Use central instead of forward differences
    pub central_differences: bool,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Smallest accepted step fraction before declaring stagnation
    pub min_step: f64,
}

impl SolverConfig {
    fn base() -> Self {
        Self {
            method: SolverMethod::Newton,
            max_iterations: 50,
            tolerance: 1e-9,
            fd_step: 1e-7,
            central_differences: false,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            min_step: 1e-10,
        }
    }

    pub fn validate(&self) -> SolverResult<()> {
        if self.max_iterations == 0 {
            return Err(SolverError::Configuration {
                what: "max_iterations must be positive".to_string(),
            });
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolverError::Configuration {
                what: format!("tolerance must be finite and positive, got {}", self.tolerance),
            });
        }
        if !(self.fd_step.is_finite() && self.fd_step > 0.0) {
            return Err(SolverError::Configuration {
                what: format!("fd_step must be finite and positive, got {}", self.fd_step),
            });
        }
        if !(self.line_search_beta > 0.0 && self.line_search_beta < 1.0) {
            return Err(SolverError::Configuration {
                what: format!(
                    "line_search_beta must lie in (0, 1), got {}",
                    self.line_search_beta
                ),
            });
        }
        Ok(())
    }
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverMethod::default().to_config()
    }
}
