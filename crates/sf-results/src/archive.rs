//! Path → array archives of segment conditions.
//!
//! Arrays are stored column-major with their shape. Serialization goes
//! through `serde_json` with exact float round-tripping, so a
//! save/load cycle reproduces every value bit for bit. Non-finite values are
//! rejected on the way in and on the way out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sf_state::{Array, Conditions};

use crate::{ResultsError, ResultsResult};

/// One archived array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedArray {
    pub rows: usize,
    pub cols: usize,
    /// Column-major values.
    pub data: Vec<f64>,
}

impl ArchivedArray {
    fn from_array(path: &str, array: &Array) -> ResultsResult<Self> {
        if let Some(&value) = array.iter().find(|v| !v.is_finite()) {
            return Err(ResultsError::NonFinite {
                path: path.to_string(),
                value,
            });
        }
        Ok(Self {
            rows: array.nrows(),
            cols: array.ncols(),
            data: array.as_slice().to_vec(),
        })
    }

    fn to_array(&self, path: &str) -> ResultsResult<Array> {
        self.validate(path)?;
        Ok(Array::from_column_slice(self.rows, self.cols, &self.data))
    }

    fn validate(&self, path: &str) -> ResultsResult<()> {
        if self.rows * self.cols != self.data.len() {
            return Err(ResultsError::ShapeMismatch {
                path: path.to_string(),
                rows: self.rows,
                cols: self.cols,
                len: self.data.len(),
            });
        }
        if let Some(&value) = self.data.iter().find(|v| !v.is_finite()) {
            return Err(ResultsError::NonFinite {
                path: path.to_string(),
                value,
            });
        }
        Ok(())
    }
}

/// Every leaf of a condition tree keyed by its dotted path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionArchive {
    pub arrays: BTreeMap<String, ArchivedArray>,
}

impl ConditionArchive {
    pub fn from_conditions(conditions: &Conditions) -> ResultsResult<Self> {
        let mut arrays = BTreeMap::new();
        for (path, array) in conditions.leaves() {
            let archived = ArchivedArray::from_array(&path, array)?;
            arrays.insert(path, archived);
        }
        Ok(Self { arrays })
    }

    pub fn to_conditions(&self) -> ResultsResult<Conditions> {
        let mut conditions = Conditions::new();
        for (path, archived) in &self.arrays {
            conditions.set(path, archived.to_array(path)?)?;
        }
        Ok(conditions)
    }

    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    pub fn to_json(&self) -> ResultsResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate an archive.
    pub fn from_json(json: &str) -> ResultsResult<Self> {
        let archive: Self = serde_json::from_str(json)?;
        for (path, array) in &archive.arrays {
            array.validate(path)?;
        }
        Ok(archive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_nan_on_write() {
        let mut conditions = Conditions::new();
        conditions
            .set("freestream.density", Array::from_element(2, 1, f64::NAN))
            .unwrap();
        match ConditionArchive::from_conditions(&conditions) {
            Err(ResultsError::NonFinite { path, .. }) => assert_eq!(path, "freestream.density"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_shape_on_read() {
        let json = r#"{"arrays":{"a.b":{"rows":2,"cols":2,"data":[1.0,2.0,3.0]}}}"#;
        assert!(matches!(
            ConditionArchive::from_json(json),
            Err(ResultsError::ShapeMismatch { len: 3, .. })
        ));
    }

    #[test]
    fn column_major_layout() {
        let mut conditions = Conditions::new();
        conditions
            .set(
                "frames.inertial.position",
                Array::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            )
            .unwrap();
        let archive = ConditionArchive::from_conditions(&conditions).unwrap();
        let stored = &archive.arrays["frames.inertial.position"];
        assert_eq!((stored.rows, stored.cols), (2, 3));
        assert_eq!(stored.data, vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}
