//! The residual system abstraction the drivers iterate on.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverError;

/// A square nonlinear system `F(x) = 0`.
///
/// Evaluation takes `&mut self` because implementors typically write `x` into
/// some owned state and run a pipeline to produce the residuals. Errors from
/// the evaluation itself are returned unchanged by the drivers; solver
/// failures are converted into `Self::Error` through `From<SolverError>`.
pub trait ResidualSystem {
    type Error: From<SolverError>;

    /// Evaluate `F(x)`.
    fn residuals(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, Self::Error>;

    /// Analytic Jacobian of `F` at `x`. `None` means the drivers estimate
    /// it by finite differences per the solver config.
    fn analytic_jacobian(
        &mut self,
        _x: &DVector<f64>,
    ) -> Option<Result<DMatrix<f64>, Self::Error>> {
        None
    }
}

/// Adapter turning a residual closure into a [`ResidualSystem`].
pub struct FnSystem<F> {
    f: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, SolverError>,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> ResidualSystem for FnSystem<F>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, SolverError>,
{
    type Error = SolverError;

    fn residuals(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, SolverError> {
        (self.f)(x)
    }
}
