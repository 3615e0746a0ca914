//! The per-segment state: conditions plus the solver's unknowns/residuals.

use crate::conditions::{Array, Conditions};
use crate::error::{StateError, StateResult};
use crate::variables::{BlockKind, VariableBlock};
use nalgebra::DVector;

/// State owned by exactly one segment.
///
/// Every array has either `control_points` rows or a single row (static
/// fields). Unknown and residual entries always have `control_points` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    control_points: usize,
    conditions: Conditions,
    unknowns: VariableBlock,
    residuals: VariableBlock,
}

impl State {
    pub fn new(control_points: usize) -> Self {
        Self {
            control_points,
            conditions: Conditions::new(),
            unknowns: VariableBlock::new(BlockKind::Unknowns),
            residuals: VariableBlock::new(BlockKind::Residuals),
        }
    }

    pub fn control_points(&self) -> usize {
        self.control_points
    }

    pub fn conditions(&self) -> &Conditions {
        &self.conditions
    }

    pub fn unknowns(&self) -> &VariableBlock {
        &self.unknowns
    }

    pub fn residuals(&self) -> &VariableBlock {
        &self.residuals
    }

    /// Consume the state, keeping only its condition tree.
    pub fn into_conditions(self) -> Conditions {
        self.conditions
    }

    pub fn get(&self, path: &str) -> StateResult<&Array> {
        self.conditions.get(path)
    }

    pub fn scalar(&self, path: &str) -> StateResult<f64> {
        self.conditions.scalar(path)
    }

    pub fn set(&mut self, path: &str, value: Array) -> StateResult<()> {
        if value.nrows() != self.control_points && value.nrows() != 1 {
            return Err(StateError::ShapeMismatch {
                name: path.to_string(),
                expected: (self.control_points, value.ncols()),
                found: value.shape(),
            });
        }
        self.conditions.set(path, value)
    }

    /// Convenience for static single-value fields.
    pub fn set_scalar(&mut self, path: &str, value: f64) -> StateResult<()> {
        self.conditions.set(path, Array::from_element(1, 1, value))
    }

    pub fn declare_unknown(&mut self, name: &str, initial: Array) -> StateResult<()> {
        self.check_rows(name, &initial)?;
        self.unknowns.declare(name, initial)
    }

    pub fn declare_residual(&mut self, name: &str, initial: Array) -> StateResult<()> {
        self.check_rows(name, &initial)?;
        self.residuals.declare(name, initial)
    }

    pub fn unknown(&self, name: &str) -> StateResult<&Array> {
        self.unknowns.get(name)
    }

    pub fn residual(&self, name: &str) -> StateResult<&Array> {
        self.residuals.get(name)
    }

    pub fn set_unknown(&mut self, name: &str, value: Array) -> StateResult<()> {
        self.unknowns.set(name, value)
    }

    pub fn set_residual(&mut self, name: &str, value: Array) -> StateResult<()> {
        self.residuals.set(name, value)
    }

    pub fn flatten_unknowns(&self) -> DVector<f64> {
        self.unknowns.flatten()
    }

    pub fn unflatten_into_unknowns(&mut self, x: &DVector<f64>) -> StateResult<()> {
        self.unknowns.unflatten(x)
    }

    pub fn flatten_residuals(&self) -> DVector<f64> {
        self.residuals.flatten()
    }

    fn check_rows(&self, name: &str, value: &Array) -> StateResult<()> {
        if value.nrows() != self.control_points {
            return Err(StateError::ShapeMismatch {
                name: name.to_string(),
                expected: (self.control_points, value.ncols()),
                found: value.shape(),
            });
        }
        Ok(())
    }
}
