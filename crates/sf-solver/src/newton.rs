//! Newton solver with backtracking line search.

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::{FailureReason, SolverError};
use crate::solve::{RootSolution, initial_residuals, jacobian_at, line_search};
use crate::system::ResidualSystem;

/// Newton's method on `system` starting from `x0`.
///
/// Each iteration solves `J dx = -F(x)` by LU decomposition and backtracks
/// along `dx` until `‖F‖∞` decreases.
pub fn newton_solve<S: ResidualSystem>(
    system: &mut S,
    x0: DVector<f64>,
    config: &SolverConfig,
) -> Result<RootSolution, S::Error> {
    let mut x = x0;
    let (mut r, mut r_norm) = initial_residuals(system, &x, config)?;

    for iter in 0..config.max_iterations {
        if r_norm < config.tolerance {
            info!(iterations = iter, residual_norm = r_norm, "newton converged");
            return Ok(RootSolution {
                x,
                residuals: r,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let jac = jacobian_at(system, &x, &r, iter + 1, config)?;

        let dx = jac
            .lu()
            .solve(&(-&r))
            .filter(|dx| dx.iter().all(|v| v.is_finite()))
            .ok_or_else(|| {
                SolverError::failure(
                    FailureReason::SingularJacobian,
                    iter,
                    r.as_slice(),
                    x.as_slice(),
                )
            })?;

        let step = line_search(system, &x, &dx, r_norm, iter, config)?;
        debug!(
            iteration = iter + 1,
            residual_norm = step.norm,
            step = step.alpha,
            "newton iteration"
        );

        x = step.x;
        r = step.r;
        r_norm = step.norm;

        if step.alpha < config.min_step && r_norm >= config.tolerance {
            warn!(iteration = iter + 1, residual_norm = r_norm, "line search stagnated");
            return Err(SolverError::failure(
                FailureReason::LineSearchStagnated,
                iter + 1,
                r.as_slice(),
                x.as_slice(),
            )
            .into());
        }
    }

    if r_norm < config.tolerance {
        info!(iterations = config.max_iterations, residual_norm = r_norm, "newton converged");
        return Ok(RootSolution {
            x,
            residuals: r,
            residual_norm: r_norm,
            iterations: config.max_iterations,
        });
    }

    warn!(
        iterations = config.max_iterations,
        residual_norm = r_norm,
        "newton hit iteration cap"
    );
    Err(SolverError::failure(
        FailureReason::MaxIterations,
        config.max_iterations,
        r.as_slice(),
        x.as_slice(),
    )
    .into())
}
