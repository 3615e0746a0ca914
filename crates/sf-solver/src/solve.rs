//! Solver entry point and helpers shared by the drivers.

use nalgebra::{DMatrix, DVector};
use sf_core::inf_norm;
use tracing::warn;

use crate::broyden::broyden_solve;
use crate::config::{SolverConfig, SolverMethod};
use crate::error::{FailureReason, SolverError};
use crate::jacobian::{central_difference_jacobian, forward_difference_jacobian};
use crate::newton::newton_solve;
use crate::system::ResidualSystem;

/// A converged root.
#[derive(Debug, Clone)]
pub struct RootSolution {
    /// Solution vector
    pub x: DVector<f64>,
    /// Residuals at `x`
    pub residuals: DVector<f64>,
    /// `‖F(x)‖∞`
    pub residual_norm: f64,
    /// Number of iterations
    pub iterations: usize,
}

/// Solve `system` from `x0` with the method selected in `config`.
pub fn solve<S: ResidualSystem>(
    system: &mut S,
    x0: DVector<f64>,
    config: &SolverConfig,
) -> Result<RootSolution, S::Error> {
    match config.method {
        SolverMethod::Newton => newton_solve(system, x0, config),
        SolverMethod::Broyden => broyden_solve(system, x0, config),
    }
}

/// Evaluate the starting residual, checking the system is square and finite.
pub(crate) fn initial_residuals<S: ResidualSystem>(
    system: &mut S,
    x0: &DVector<f64>,
    config: &SolverConfig,
) -> Result<(DVector<f64>, f64), S::Error> {
    config.validate()?;
    let r = system.residuals(x0)?;
    if r.len() != x0.len() {
        return Err(SolverError::Configuration {
            what: format!(
                "system is not square: {} unknowns, {} residuals",
                x0.len(),
                r.len()
            ),
        }
        .into());
    }
    let norm = inf_norm(r.as_slice());
    if !norm.is_finite() {
        return Err(SolverError::failure(
            FailureReason::NonFiniteResidual,
            0,
            r.as_slice(),
            x0.as_slice(),
        )
        .into());
    }
    Ok((r, norm))
}

/// Jacobian at `x`, analytic if the system supplies one, else by finite
/// differences.
///
/// A non-finite residual at any perturbed point fails the solve with
/// [`FailureReason::NonFiniteResidual`], carrying that residual vector.
pub(crate) fn jacobian_at<S: ResidualSystem>(
    system: &mut S,
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    iteration: usize,
    config: &SolverConfig,
) -> Result<DMatrix<f64>, S::Error> {
    if let Some(jac) = system.analytic_jacobian(x) {
        return jac;
    }

    let perturbed = |xp: &DVector<f64>| -> Result<DVector<f64>, S::Error> {
        let r = system.residuals(xp)?;
        if r.iter().all(|v| v.is_finite()) {
            return Ok(r);
        }
        warn!(iteration, "non-finite residual while estimating the Jacobian");
        Err(SolverError::failure(
            FailureReason::NonFiniteResidual,
            iteration,
            r.as_slice(),
            x.as_slice(),
        )
        .into())
    };

    if config.central_differences {
        central_difference_jacobian(x, perturbed, config.fd_step)
    } else {
        forward_difference_jacobian(x, f_x, perturbed, config.fd_step)
    }
}

/// Outcome of a backtracking line search along `dx`.
pub(crate) struct Step {
    pub x: DVector<f64>,
    pub r: DVector<f64>,
    pub norm: f64,
    pub alpha: f64,
}

/// Backtrack along `dx` until the residual norm decreases.
///
/// If no reduction is found within the configured budget the last trial is
/// accepted. A non-finite trial residual aborts the solve immediately.
pub(crate) fn line_search<S: ResidualSystem>(
    system: &mut S,
    x: &DVector<f64>,
    dx: &DVector<f64>,
    norm: f64,
    iteration: usize,
    config: &SolverConfig,
) -> Result<Step, S::Error> {
    let mut alpha = 1.0;
    let mut attempts = 0;
    loop {
        let x_new = x + alpha * dx;
        let r_new = system.residuals(&x_new)?;
        let new_norm = inf_norm(r_new.as_slice());
        if !new_norm.is_finite() {
            return Err(SolverError::failure(
                FailureReason::NonFiniteResidual,
                iteration + 1,
                r_new.as_slice(),
                x.as_slice(),
            )
            .into());
        }
        attempts += 1;
        if new_norm < norm || new_norm < config.tolerance || attempts > config.max_line_search_iters
        {
            return Ok(Step {
                x: x_new,
                r: r_new,
                norm: new_norm,
                alpha,
            });
        }
        alpha *= config.line_search_beta;
    }
}
