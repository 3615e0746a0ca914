//! Ordered blocks of solver unknowns and residuals.

use crate::conditions::Array;
use crate::error::{StateError, StateResult};
use indexmap::IndexMap;
use nalgebra::DVector;

/// Which side of the nonlinear system a block holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Unknowns,
    Residuals,
}

impl BlockKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockKind::Unknowns => "unknowns",
            BlockKind::Residuals => "residuals",
        }
    }
}

/// Append-only ordered map from name to a fixed-shape array.
///
/// Shapes are frozen at declaration; every later write must match.
/// Flattening concatenates entries in declaration order, each entry in
/// column-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableBlock {
    kind: BlockKind,
    entries: IndexMap<String, Array>,
}

impl VariableBlock {
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            entries: IndexMap::new(),
        }
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    /// Number of named entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of scalar components across all entries.
    pub fn size(&self) -> usize {
        self.entries.values().map(|a| a.len()).sum()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn declare(&mut self, name: &str, initial: Array) -> StateResult<()> {
        if self.entries.contains_key(name) {
            return Err(match self.kind {
                BlockKind::Unknowns => StateError::DuplicateUnknown {
                    name: name.to_string(),
                },
                BlockKind::Residuals => StateError::DuplicateResidual {
                    name: name.to_string(),
                },
            });
        }
        self.entries.insert(name.to_string(), initial);
        Ok(())
    }

    pub fn get(&self, name: &str) -> StateResult<&Array> {
        self.entries
            .get(name)
            .ok_or_else(|| StateError::MissingField {
                path: format!("{}.{name}", self.kind.as_str()),
            })
    }

    /// Overwrite an entry; the new value must keep the declared shape.
    pub fn set(&mut self, name: &str, value: Array) -> StateResult<()> {
        let qualified = format!("{}.{name}", self.kind.as_str());
        let slot = self
            .entries
            .get_mut(name)
            .ok_or_else(|| StateError::MissingField {
                path: qualified.clone(),
            })?;
        if slot.shape() != value.shape() {
            return Err(StateError::ShapeMismatch {
                name: qualified,
                expected: slot.shape(),
                found: value.shape(),
            });
        }
        *slot = value;
        Ok(())
    }

    pub fn flatten(&self) -> DVector<f64> {
        let mut flat = Vec::with_capacity(self.size());
        for array in self.entries.values() {
            flat.extend_from_slice(array.as_slice());
        }
        DVector::from_vec(flat)
    }

    /// Write a flat vector back into the entries, in declaration order.
    pub fn unflatten(&mut self, x: &DVector<f64>) -> StateResult<()> {
        let size = self.size();
        if x.len() != size {
            return Err(StateError::ShapeMismatch {
                name: self.kind.as_str().to_string(),
                expected: (size, 1),
                found: (x.len(), 1),
            });
        }

        let mut offset = 0;
        for array in self.entries.values_mut() {
            let width = array.len();
            array
                .as_mut_slice()
                .copy_from_slice(&x.as_slice()[offset..offset + width]);
            offset += width;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declare_rejects_duplicates_per_kind() {
        let mut u = VariableBlock::new(BlockKind::Unknowns);
        u.declare("throttle", Array::from_element(3, 1, 0.5)).unwrap();
        assert_eq!(
            u.declare("throttle", Array::zeros(3, 1)),
            Err(StateError::DuplicateUnknown {
                name: "throttle".to_string()
            })
        );

        let mut r = VariableBlock::new(BlockKind::Residuals);
        r.declare("forces", Array::zeros(3, 2)).unwrap();
        assert_eq!(
            r.declare("forces", Array::zeros(3, 2)),
            Err(StateError::DuplicateResidual {
                name: "forces".to_string()
            })
        );
    }

    #[test]
    fn set_enforces_declared_shape() {
        let mut r = VariableBlock::new(BlockKind::Residuals);
        r.declare("forces", Array::zeros(4, 2)).unwrap();
        let err = r.set("forces", Array::zeros(4, 3)).unwrap_err();
        assert_eq!(
            err,
            StateError::ShapeMismatch {
                name: "residuals.forces".to_string(),
                expected: (4, 2),
                found: (4, 3),
            }
        );
        assert!(r.set("forces", Array::from_element(4, 2, 1.0)).is_ok());
    }

    #[test]
    fn flatten_follows_declaration_order() {
        let mut u = VariableBlock::new(BlockKind::Unknowns);
        u.declare("b", Array::from_column_slice(2, 1, &[1.0, 2.0]))
            .unwrap();
        u.declare("a", Array::from_column_slice(2, 1, &[3.0, 4.0]))
            .unwrap();
        assert_eq!(u.flatten().as_slice(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(u.names().collect::<Vec<_>>(), vec!["b", "a"]);
    }

    #[test]
    fn unflatten_rejects_wrong_length() {
        let mut u = VariableBlock::new(BlockKind::Unknowns);
        u.declare("x", Array::zeros(2, 1)).unwrap();
        let err = u.unflatten(&DVector::zeros(3)).unwrap_err();
        assert!(matches!(err, StateError::ShapeMismatch { .. }));
    }

    #[test]
    fn missing_entry_is_qualified() {
        let u = VariableBlock::new(BlockKind::Unknowns);
        assert_eq!(
            u.get("body_angle"),
            Err(StateError::MissingField {
                path: "unknowns.body_angle".to_string()
            })
        );
    }
}
