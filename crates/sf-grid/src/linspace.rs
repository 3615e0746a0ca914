//! Evenly spaced grid operators.

use nalgebra::{DMatrix, DVector};

pub(crate) fn points(n: usize) -> DVector<f64> {
    let last = (n - 1) as f64;
    DVector::from_fn(n, |i, _| i as f64 / last)
}

/// Second-order finite differences: central in the interior, one-sided at the ends.
///
/// With only two points this degrades to the exact first-order difference.
pub(crate) fn differentiation_matrix(n: usize) -> DMatrix<f64> {
    let h = 1.0 / (n - 1) as f64;
    let mut d = DMatrix::zeros(n, n);

    if n == 2 {
        for row in 0..2 {
            d[(row, 0)] = -1.0 / h;
            d[(row, 1)] = 1.0 / h;
        }
        return d;
    }

    let inv_2h = 1.0 / (2.0 * h);
    d[(0, 0)] = -3.0 * inv_2h;
    d[(0, 1)] = 4.0 * inv_2h;
    d[(0, 2)] = -inv_2h;

    for i in 1..n - 1 {
        d[(i, i - 1)] = -inv_2h;
        d[(i, i + 1)] = inv_2h;
    }

    d[(n - 1, n - 3)] = inv_2h;
    d[(n - 1, n - 2)] = -4.0 * inv_2h;
    d[(n - 1, n - 1)] = 3.0 * inv_2h;
    d
}

/// Cumulative trapezoid rule over arbitrary ascending points.
pub(crate) fn trapezoid_matrix(points: &DVector<f64>) -> DMatrix<f64> {
    let n = points.len();
    let mut integ = DMatrix::zeros(n, n);
    for i in 1..n {
        for k in 0..i {
            let half_h = 0.5 * (points[k + 1] - points[k]);
            integ[(i, k)] += half_h;
            integ[(i, k + 1)] += half_h;
        }
    }
    integ
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoid_first_row_is_zero() {
        let p = points(4);
        let integ = trapezoid_matrix(&p);
        for j in 0..4 {
            assert_eq!(integ[(0, j)], 0.0);
        }
    }

    #[test]
    fn difference_rows_sum_to_zero() {
        let d = differentiation_matrix(7);
        for i in 0..7 {
            let sum: f64 = d.row(i).iter().sum();
            assert!(sum.abs() < 1e-12);
        }
    }
}
