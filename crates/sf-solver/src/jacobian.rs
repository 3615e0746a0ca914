//! Finite difference Jacobian computation.

use nalgebra::{DMatrix, DVector};

fn perturbation(xj: f64, epsilon: f64) -> f64 {
    epsilon * xj.abs().max(1.0)
}

/// Compute Jacobian using forward finite differences.
///
/// `f_x` is the residual already evaluated at `x`, so each column costs one
/// extra evaluation: `(f(x + h e_j) - f(x)) / h`.
pub fn forward_difference_jacobian<F, E>(
    x: &DVector<f64>,
    f_x: &DVector<f64>,
    mut f: F,
    epsilon: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let n = x.len();
    let m = f_x.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let dx = perturbation(x[j], epsilon);
        let mut x_perturbed = x.clone();
        x_perturbed[j] += dx;

        let f_perturbed = f(&x_perturbed)?;
        let df = (f_perturbed - f_x) / dx;
        jac.set_column(j, &df);
    }

    Ok(jac)
}

/// Compute Jacobian using central finite differences (more accurate but 2x cost).
pub fn central_difference_jacobian<F, E>(
    x: &DVector<f64>,
    mut f: F,
    epsilon: f64,
) -> Result<DMatrix<f64>, E>
where
    F: FnMut(&DVector<f64>) -> Result<DVector<f64>, E>,
{
    let n = x.len();
    let mut columns = Vec::with_capacity(n);

    for j in 0..n {
        let dx = perturbation(x[j], epsilon);

        let mut x_plus = x.clone();
        x_plus[j] += dx;
        let f_plus = f(&x_plus)?;

        let mut x_minus = x.clone();
        x_minus[j] -= dx;
        let f_minus = f(&x_minus)?;

        columns.push((f_plus - f_minus) / (2.0 * dx));
    }

    let m = columns.first().map_or(0, |c| c.len());
    let mut jac = DMatrix::zeros(m, n);
    for (j, col) in columns.iter().enumerate() {
        jac.set_column(j, col);
    }
    Ok(jac)
}
