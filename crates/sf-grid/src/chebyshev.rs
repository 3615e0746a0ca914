//! Chebyshev-Gauss-Lobatto collocation on [0, 1].
//!
//! Points are `τⱼ = (1 - cos(πj/n)) / 2` for `j = 0..=n`, ascending. The
//! derivative matrix is the classical Chebyshev collocation matrix on
//! `x = cos(πj/n)` rescaled by `dx/dτ = -2`, with the diagonal set by the
//! negative-sum rule so constants differentiate to zero exactly.

use crate::error::{GridError, GridResult};
use nalgebra::{DMatrix, DVector};
use std::f64::consts::PI;

pub(crate) fn points(n: usize) -> DVector<f64> {
    let order = (n - 1) as f64;
    DVector::from_fn(n, |j, _| 0.5 * (1.0 - (PI * j as f64 / order).cos()))
}

pub(crate) fn differentiation_matrix(points: &DVector<f64>) -> DMatrix<f64> {
    let n = points.len();
    let last = n - 1;
    // Back to x ∈ [-1, 1], descending.
    let x: Vec<f64> = points.iter().map(|&t| 1.0 - 2.0 * t).collect();
    let c: Vec<f64> = (0..n)
        .map(|j| {
            let edge = if j == 0 || j == last { 2.0 } else { 1.0 };
            if j % 2 == 0 { edge } else { -edge }
        })
        .collect();

    let mut d = DMatrix::zeros(n, n);
    for i in 0..n {
        let mut row_sum = 0.0;
        for j in 0..n {
            if i != j {
                let dij = (c[i] / c[j]) / (x[i] - x[j]);
                d[(i, j)] = dij;
                row_sum += dij;
            }
        }
        d[(i, i)] = -row_sum;
    }

    d * -2.0
}

/// Cumulative integration as the inverse of `D` with `F(0) = 0` imposed.
pub(crate) fn integration_matrix(d: &DMatrix<f64>) -> GridResult<DMatrix<f64>> {
    let n = d.nrows();
    let mut constrained = d.clone();
    for j in 0..n {
        constrained[(0, j)] = if j == 0 { 1.0 } else { 0.0 };
    }

    let inverse = constrained
        .try_inverse()
        .ok_or(GridError::SingularOperator {
            what: "Chebyshev integration operator",
        })?;

    let mut select = DMatrix::identity(n, n);
    select[(0, 0)] = 0.0;
    Ok(inverse * select)
}
