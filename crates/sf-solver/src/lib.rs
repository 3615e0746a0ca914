//! Root finding for square nonlinear systems `F(x) = 0`.
//!
//! The system is supplied through the [`ResidualSystem`] trait, which lets the
//! residual evaluation mutate its owner (a mission segment re-runs its whole
//! iterate pipeline on every call). Two drivers are provided:
//!
//! - [`newton_solve`]: Newton's method with a finite-difference (or
//!   system-supplied) Jacobian and backtracking line search.
//! - [`broyden_solve`]: good-Broyden rank-one Jacobian updates seeded by one
//!   finite-difference Jacobian; far fewer residual evaluations per iteration.
//!
//! Convergence means `‖F(x)‖∞ < tolerance`. Failures (iteration cap, NaN/Inf
//! residuals, singular Jacobian) are reported as
//! [`SolverError::ConvergenceFailure`] carrying the last residual vector.

pub mod broyden;
pub mod config;
pub mod error;
pub mod jacobian;
pub mod newton;
pub mod solve;
pub mod system;

pub use broyden::broyden_solve;
pub use config::{SolverConfig, SolverMethod};
pub use error::{FailureReason, SolverError, SolverResult};
pub use jacobian::{central_difference_jacobian, forward_difference_jacobian};
pub use newton::newton_solve;
pub use solve::{RootSolution, solve};
pub use system::{FnSystem, ResidualSystem};
