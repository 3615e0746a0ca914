//! Result data types.

use serde::{Deserialize, Serialize};
use sf_mission::SegmentResult;

pub type RunId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub mission: String,
    pub timestamp: String,
    pub solver_version: String,
    /// SHA-256 over every segment archive, in flight order.
    pub content_digest: String,
    pub segments: Vec<SegmentSummary>,
}

impl RunManifest {
    pub fn all_converged(&self) -> bool {
        self.segments.iter().all(|s| s.converged)
    }

    pub fn segment(&self, name: &str) -> Option<&SegmentSummary> {
        self.segments.iter().find(|s| s.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentSummary {
    pub name: String,
    pub kind: String,
    pub status: String,
    pub converged: bool,
    pub iterations: Option<usize>,
    /// `None` when the solve never ran or ended on a non-finite residual.
    pub residual_norm: Option<f64>,
    /// Archive file name inside the run directory.
    pub archive: String,
}

impl SegmentSummary {
    pub fn from_result(result: &SegmentResult, archive: String) -> Self {
        Self {
            name: result.name.clone(),
            kind: result.kind.clone(),
            status: result.status.as_str().to_string(),
            converged: result.converged(),
            iterations: result.iterations(),
            residual_norm: result.residual_norm().filter(|r| r.is_finite()),
            archive,
        }
    }
}
