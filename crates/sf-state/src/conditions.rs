//! Path-addressable tree of named arrays.

use crate::error::{StateError, StateResult};
use indexmap::IndexMap;
use nalgebra::DMatrix;

/// Numeric payload of a condition: one row per control point.
pub type Array = DMatrix<f64>;

/// Node in the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionNode {
    Leaf(Array),
    Branch(Conditions),
}

/// Ordered tree of conditions addressed by dotted paths such as
/// `frames.inertial.velocity`.
///
/// Writes create missing branches on the way down. Reads never default:
/// a path that was never written is a [`StateError::MissingField`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Conditions {
    entries: IndexMap<String, ConditionNode>,
}

fn split_path(path: &str) -> StateResult<Vec<&str>> {
    let parts: Vec<&str> = path.split('.').collect();
    if path.is_empty() || parts.iter().any(|p| p.is_empty()) {
        return Err(StateError::InvalidPath {
            path: path.to_string(),
        });
    }
    Ok(parts)
}

fn missing(path: &str) -> StateError {
    StateError::MissingField {
        path: path.to_string(),
    }
}

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Direct children in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConditionNode)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn contains(&self, path: &str) -> bool {
        self.node(path).is_ok()
    }

    /// Look up any node (array or branch) at `path`.
    pub fn node(&self, path: &str) -> StateResult<&ConditionNode> {
        let parts = split_path(path)?;
        let Some((last, parents)) = parts.split_last() else {
            return Err(missing(path));
        };

        let mut current = self;
        for part in parents {
            current = match current.entries.get(*part) {
                Some(ConditionNode::Branch(branch)) => branch,
                _ => return Err(missing(path)),
            };
        }
        current.entries.get(*last).ok_or_else(|| missing(path))
    }

    pub fn get(&self, path: &str) -> StateResult<&Array> {
        match self.node(path)? {
            ConditionNode::Leaf(array) => Ok(array),
            ConditionNode::Branch(_) => Err(StateError::PathConflict {
                path: path.to_string(),
                what: "expected an array, found a branch",
            }),
        }
    }

    pub fn get_mut(&mut self, path: &str) -> StateResult<&mut Array> {
        let parts = split_path(path)?;
        let Some((last, parents)) = parts.split_last() else {
            return Err(missing(path));
        };

        let mut current = self;
        for part in parents {
            current = match current.entries.get_mut(*part) {
                Some(ConditionNode::Branch(branch)) => branch,
                _ => return Err(missing(path)),
            };
        }
        match current.entries.get_mut(*last) {
            Some(ConditionNode::Leaf(array)) => Ok(array),
            Some(ConditionNode::Branch(_)) => Err(StateError::PathConflict {
                path: path.to_string(),
                what: "expected an array, found a branch",
            }),
            None => Err(missing(path)),
        }
    }

    pub fn branch(&self, path: &str) -> StateResult<&Conditions> {
        match self.node(path)? {
            ConditionNode::Branch(branch) => Ok(branch),
            ConditionNode::Leaf(_) => Err(StateError::PathConflict {
                path: path.to_string(),
                what: "expected a branch, found an array",
            }),
        }
    }

    /// Write an array at `path`, creating intermediate branches as needed.
    pub fn set(&mut self, path: &str, value: Array) -> StateResult<()> {
        let parts = split_path(path)?;
        let Some((last, parents)) = parts.split_last() else {
            return Err(missing(path));
        };

        let mut current = self;
        for part in parents {
            let entry = current
                .entries
                .entry((*part).to_string())
                .or_insert_with(|| ConditionNode::Branch(Conditions::default()));
            current = match entry {
                ConditionNode::Branch(branch) => branch,
                ConditionNode::Leaf(_) => {
                    return Err(StateError::PathConflict {
                        path: path.to_string(),
                        what: "intermediate node is an array",
                    });
                }
            };
        }

        match current.entries.get_mut(*last) {
            Some(ConditionNode::Leaf(existing)) => {
                *existing = value;
                Ok(())
            }
            Some(ConditionNode::Branch(_)) => Err(StateError::PathConflict {
                path: path.to_string(),
                what: "cannot overwrite a branch with an array",
            }),
            None => {
                current
                    .entries
                    .insert((*last).to_string(), ConditionNode::Leaf(value));
                Ok(())
            }
        }
    }

    /// First entry of the array at `path`; used for static (1×1) fields.
    pub fn scalar(&self, path: &str) -> StateResult<f64> {
        let array = self.get(path)?;
        array.get((0, 0)).copied().ok_or(StateError::ShapeMismatch {
            name: path.to_string(),
            expected: (1, 1),
            found: array.shape(),
        })
    }

    /// Last row of the array at `path`, i.e. its value at the final control point.
    pub fn last_row(&self, path: &str) -> StateResult<Vec<f64>> {
        let array = self.get(path)?;
        if array.nrows() == 0 {
            return Err(StateError::ShapeMismatch {
                name: path.to_string(),
                expected: (1, array.ncols()),
                found: array.shape(),
            });
        }
        Ok(array.row(array.nrows() - 1).iter().copied().collect())
    }

    /// Every array in the tree with its full dotted path, depth-first in
    /// insertion order.
    pub fn leaves(&self) -> Vec<(String, &Array)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a Array)>) {
        for (name, node) in &self.entries {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{prefix}.{name}")
            };
            match node {
                ConditionNode::Leaf(array) => out.push((path, array)),
                ConditionNode::Branch(branch) => branch.collect_leaves(&path, out),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(values: &[f64]) -> Array {
        Array::from_column_slice(values.len(), 1, values)
    }

    #[test]
    fn set_auto_vivifies_branches() {
        let mut c = Conditions::new();
        c.set("frames.inertial.time", column(&[0.0, 1.0])).unwrap();
        assert!(c.contains("frames"));
        assert!(c.contains("frames.inertial"));
        assert_eq!(c.get("frames.inertial.time").unwrap()[(1, 0)], 1.0);
    }

    #[test]
    fn missing_leaf_fails_loudly() {
        let mut c = Conditions::new();
        c.set("freestream.density", column(&[1.2])).unwrap();
        let err = c.get("freestream.velocity").unwrap_err();
        assert_eq!(
            err,
            StateError::MissingField {
                path: "freestream.velocity".to_string()
            }
        );
        assert!(matches!(
            c.get("nothing.here"),
            Err(StateError::MissingField { .. })
        ));
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut c = Conditions::new();
        c.set("a", column(&[1.0])).unwrap();
        c.set("b", column(&[2.0])).unwrap();
        c.set("a", column(&[3.0])).unwrap();
        let names: Vec<&str> = c.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(c.scalar("a").unwrap(), 3.0);
    }

    #[test]
    fn path_conflicts_are_reported() {
        let mut c = Conditions::new();
        c.set("weights.total_mass", column(&[100.0])).unwrap();
        assert!(matches!(
            c.set("weights.total_mass.extra", column(&[1.0])),
            Err(StateError::PathConflict { .. })
        ));
        assert!(matches!(
            c.set("weights", column(&[1.0])),
            Err(StateError::PathConflict { .. })
        ));
        assert!(matches!(c.get("weights"), Err(StateError::PathConflict { .. })));
    }

    #[test]
    fn invalid_paths_rejected() {
        let mut c = Conditions::new();
        for bad in ["", ".a", "a..b", "a."] {
            assert!(matches!(
                c.set(bad, column(&[0.0])),
                Err(StateError::InvalidPath { .. })
            ));
        }
    }

    #[test]
    fn leaves_walk_depth_first() {
        let mut c = Conditions::new();
        c.set("x.a", column(&[1.0])).unwrap();
        c.set("y", column(&[2.0])).unwrap();
        c.set("x.b.c", column(&[3.0])).unwrap();
        let paths: Vec<String> = c.leaves().into_iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["x.a", "x.b.c", "y"]);
    }

    #[test]
    fn last_row_reads_final_point() {
        let mut c = Conditions::new();
        let pos = Array::from_row_slice(2, 3, &[0.0, 0.0, 0.0, 10.0, 0.0, -5.0]);
        c.set("frames.inertial.position", pos).unwrap();
        assert_eq!(
            c.last_row("frames.inertial.position").unwrap(),
            vec![10.0, 0.0, -5.0]
        );
    }

    #[test]
    fn get_mut_edits_in_place() {
        let mut c = Conditions::new();
        c.set("energy.battery", column(&[5.0, 4.0])).unwrap();
        c.get_mut("energy.battery").unwrap()[(1, 0)] = 3.0;
        assert_eq!(c.get("energy.battery").unwrap()[(1, 0)], 3.0);
        assert!(c.branch("energy").is_ok());
    }
}
