//! Per-segment and per-mission results.

use sf_core::SegmentId;
use sf_state::{Array, Conditions, StateError};

use crate::error::MissionResult;
use crate::segment::{SegmentStatus, SolveReport};

/// Final conditions and convergence status of one segment.
#[derive(Debug, Clone)]
pub struct SegmentResult {
    pub id: SegmentId,
    pub name: String,
    pub kind: String,
    pub status: SegmentStatus,
    pub report: Option<SolveReport>,
    pub conditions: Conditions,
}

impl SegmentResult {
    pub fn converged(&self) -> bool {
        self.report.is_some_and(|r| r.converged)
    }

    pub fn iterations(&self) -> Option<usize> {
        self.report.map(|r| r.iterations)
    }

    pub fn residual_norm(&self) -> Option<f64> {
        self.report.map(|r| r.residual_norm)
    }

    pub fn array(&self, path: &str) -> MissionResult<&Array> {
        Ok(self.conditions.get(path)?)
    }

    /// Column `col` of the array at `path`.
    pub fn column(&self, path: &str, col: usize) -> MissionResult<Vec<f64>> {
        let array = self.conditions.get(path)?;
        if col >= array.ncols() {
            return Err(StateError::ShapeMismatch {
                name: path.to_string(),
                expected: (array.nrows(), col + 1),
                found: array.shape(),
            }
            .into());
        }
        Ok(array.column(col).iter().copied().collect())
    }

    pub fn time(&self) -> MissionResult<Vec<f64>> {
        self.column("frames.inertial.time", 0)
    }

    /// N×3 inertial position history.
    pub fn position(&self) -> MissionResult<&Array> {
        self.array("frames.inertial.position")
    }

    pub fn velocity(&self) -> MissionResult<&Array> {
        self.array("frames.inertial.velocity")
    }

    pub fn mass(&self) -> MissionResult<Vec<f64>> {
        self.column("weights.total_mass", 0)
    }

    /// Stored energy history of a battery network.
    pub fn energy(&self, network: &str) -> MissionResult<Vec<f64>> {
        self.column(&format!("energy.{network}.energy"), 0)
    }
}

/// Results of a whole mission, in flight order.
#[derive(Debug, Clone)]
pub struct MissionResults {
    pub name: String,
    pub segments: Vec<SegmentResult>,
}

impl MissionResults {
    pub fn get(&self, id: SegmentId) -> Option<&SegmentResult> {
        self.segments.get(id.index() as usize)
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentResult> {
        self.segments.iter().find(|s| s.name == name)
    }

    pub fn all_converged(&self) -> bool {
        self.segments.iter().all(SegmentResult::converged)
    }

    pub fn final_conditions(&self) -> Option<&Conditions> {
        self.segments.last().map(|s| &s.conditions)
    }

    /// Time history concatenated across segments.
    pub fn time_history(&self) -> MissionResult<Vec<f64>> {
        self.concat(SegmentResult::time)
    }

    /// Mass history concatenated across segments.
    pub fn mass_history(&self) -> MissionResult<Vec<f64>> {
        self.concat(SegmentResult::mass)
    }

    fn concat(
        &self,
        f: impl Fn(&SegmentResult) -> MissionResult<Vec<f64>>,
    ) -> MissionResult<Vec<f64>> {
        let mut out = Vec::new();
        for segment in &self.segments {
            out.extend(f(segment)?);
        }
        Ok(out)
    }
}
