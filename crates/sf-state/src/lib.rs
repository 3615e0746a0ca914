//! Segment state container.
//!
//! A [`State`] holds three things for one segment:
//! - a path-addressable tree of named arrays ([`Conditions`]), one row per
//!   control point (or a single row for static fields);
//! - the ordered **unknowns** block the root solver drives;
//! - the ordered **residuals** block the root solver drives to zero.
//!
//! The declaration order of unknowns and residuals defines the layout of the
//! flat vectors handed to the nonlinear solver.

pub mod conditions;
pub mod error;
pub mod state;
pub mod variables;

pub use conditions::{Array, ConditionNode, Conditions};
pub use error::{StateError, StateResult};
pub use state::State;
pub use variables::{BlockKind, VariableBlock};
