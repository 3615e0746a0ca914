//! Control-point discretization for mission segments.
//!
//! A segment is sampled at N nondimensional points τ ∈ [0, 1]. Alongside the
//! points each grid carries a differentiation operator `D` (so that
//! `df/dτ ≈ D·f`) and a cumulative integration operator `I` (so that
//! `∫₀^τᵢ f dτ ≈ (I·f)ᵢ`).
//!
//! Two strategies are available:
//! - [`GridKind::Linspace`]: evenly spaced points, second-order finite
//!   differences and trapezoidal integration. Cheap and robust.
//! - [`GridKind::ChebyshevGaussLobatto`]: spectral collocation. Much higher
//!   accuracy per point, but the operators become ill-conditioned as N grows.

pub mod error;
pub mod grid;

mod chebyshev;
mod linspace;

pub use error::{GridError, GridResult};
pub use grid::{ControlPointGrid, GridKind};
