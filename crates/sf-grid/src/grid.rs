//! Grid construction and operator application.

use crate::error::{GridError, GridResult};
use crate::{chebyshev, linspace};
use nalgebra::{DMatrix, DVector};

/// Above this many points the spectral operators lose several digits.
const CHEBYSHEV_CONDITIONING_LIMIT: usize = 48;

/// Discretization strategy for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridKind {
    /// Evenly spaced points with low-order operators.
    Linspace,
    /// Chebyshev-Gauss-Lobatto points with spectral operators.
    #[default]
    ChebyshevGaussLobatto,
}

impl GridKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GridKind::Linspace => "linspace",
            GridKind::ChebyshevGaussLobatto => "chebyshev",
        }
    }
}

/// Immutable set of control points plus their calculus operators.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlPointGrid {
    kind: GridKind,
    points: DVector<f64>,
    differentiate: DMatrix<f64>,
    integrate: DMatrix<f64>,
}

impl ControlPointGrid {
    /// Build a grid of `n` points. Fails for `n < 2`.
    pub fn new(n: usize, kind: GridKind) -> GridResult<Self> {
        if n < 2 {
            return Err(GridError::Configuration {
                what: format!("number_of_control_points must be at least 2, got {n}"),
            });
        }

        let (points, differentiate, integrate) = match kind {
            GridKind::Linspace => {
                let points = linspace::points(n);
                let d = linspace::differentiation_matrix(n);
                let i = linspace::trapezoid_matrix(&points);
                (points, d, i)
            }
            GridKind::ChebyshevGaussLobatto => {
                if n > CHEBYSHEV_CONDITIONING_LIMIT {
                    tracing::warn!(
                        n,
                        limit = CHEBYSHEV_CONDITIONING_LIMIT,
                        "Chebyshev grid with many points is ill-conditioned"
                    );
                }
                let points = chebyshev::points(n);
                let d = chebyshev::differentiation_matrix(&points);
                let i = chebyshev::integration_matrix(&d)?;
                (points, d, i)
            }
        };

        tracing::debug!(n, kind = kind.as_str(), "built control-point grid");

        Ok(Self {
            kind,
            points,
            differentiate,
            integrate,
        })
    }

    pub fn kind(&self) -> GridKind {
        self.kind
    }

    /// Number of control points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Nondimensional points, ascending from 0 to 1.
    pub fn points(&self) -> &DVector<f64> {
        &self.points
    }

    /// N×N operator with `df/dτ ≈ D·f`.
    pub fn differentiate(&self) -> &DMatrix<f64> {
        &self.differentiate
    }

    /// N×N operator with `∫₀^τᵢ f dτ ≈ (I·f)ᵢ`.
    pub fn integrate(&self) -> &DMatrix<f64> {
        &self.integrate
    }

    /// Points mapped onto `[start, start + span]`, as an N×1 column.
    pub fn scaled_points(&self, start: f64, span: f64) -> DMatrix<f64> {
        DMatrix::from_fn(self.len(), 1, |i, _| start + span * self.points[i])
    }

    /// Derivative with respect to a dimensional coordinate spanning `span`.
    ///
    /// Each column of `values` is differentiated independently.
    pub fn derivative(&self, values: &DMatrix<f64>, span: f64) -> GridResult<DMatrix<f64>> {
        self.check_rows(values)?;
        if span == 0.0 || !span.is_finite() {
            return Err(GridError::Configuration {
                what: format!("derivative span must be finite and nonzero, got {span}"),
            });
        }
        Ok(&self.differentiate * values / span)
    }

    /// Cumulative integral from the first point, over a coordinate spanning `span`.
    pub fn cumulative_integral(
        &self,
        values: &DMatrix<f64>,
        span: f64,
    ) -> GridResult<DMatrix<f64>> {
        self.check_rows(values)?;
        Ok(&self.integrate * values * span)
    }

    fn check_rows(&self, values: &DMatrix<f64>) -> GridResult<()> {
        if values.nrows() != self.len() {
            return Err(GridError::DimensionMismatch {
                expected: self.len(),
                found: values.nrows(),
            });
        }
        Ok(())
    }
}
