//! Good-Broyden quasi-Newton solver.

use nalgebra::DVector;
use tracing::{debug, info, warn};

use crate::config::SolverConfig;
use crate::error::{FailureReason, SolverError};
use crate::solve::{RootSolution, initial_residuals, jacobian_at, line_search};
use crate::system::ResidualSystem;

/// Broyden's method on `system` starting from `x0`.
///
/// The Jacobian is evaluated once at `x0` and then updated with the rank-one
/// secant correction `J += (y - J s) sᵀ / (sᵀ s)` after every step.
pub fn broyden_solve<S: ResidualSystem>(
    system: &mut S,
    x0: DVector<f64>,
    config: &SolverConfig,
) -> Result<RootSolution, S::Error> {
    let mut x = x0;
    let (mut r, mut r_norm) = initial_residuals(system, &x, config)?;
    let mut jac = jacobian_at(system, &x, &r, 1, config)?;

    for iter in 0..config.max_iterations {
        if r_norm < config.tolerance {
            info!(iterations = iter, residual_norm = r_norm, "broyden converged");
            return Ok(RootSolution {
                x,
                residuals: r,
                residual_norm: r_norm,
                iterations: iter,
            });
        }

        let dx = jac
            .clone()
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
            "broyden iteration"
        );

        let s = &step.x - &x;
        let y = &step.r - &r;
        let ss = s.dot(&s);
        if ss > 0.0 {
            let correction = (y - &jac * &s) * s.transpose() / ss;
            jac += correction;
        }

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
        "broyden hit iteration cap"
    );
    Err(SolverError::failure(
        FailureReason::MaxIterations,
        config.max_iterations,
        r.as_slice(),
        x.as_slice(),
    )
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverMethod;
    use crate::error::SolverResult;
    use crate::system::FnSystem;

    #[test]
    fn mildly_nonlinear_system() {
        // x^2 + y = 3, x - y = -1  ->  x = 1, y = 2 (near start)
        let mut system = FnSystem::new(|v: &DVector<f64>| -> SolverResult<DVector<f64>> {
            Ok(DVector::from_vec(vec![
                v[0] * v[0] + v[1] - 3.0,
                v[0] - v[1] + 1.0,
            ]))
        });
        let cfg = SolverMethod::Broyden.to_config();
        let sol = broyden_solve(&mut system, DVector::from_vec(vec![1.2, 1.8]), &cfg).unwrap();
        assert!((sol.x[0] - 1.0).abs() < 1e-7);
        assert!((sol.x[1] - 2.0).abs() < 1e-7);
    }
}
