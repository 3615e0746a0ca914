//! The registration protocol for physics contributors.

use std::fmt;

use crate::error::MissionResult;
use crate::segment::{Segment, SegmentProcess};

/// A subsystem that takes part in a segment solve.
///
/// `register` is called once per segment, before the `initialize` phase
/// runs. An implementation declares its unknowns and residuals on the
/// segment state (arrays with one row per control point) and installs steps
/// under `iterate.unknowns`, `iterate.conditions` and `iterate.residuals`.
/// Steps installed under `initialize` or `post_process` run after the
/// segment's own steps in those phases.
///
/// After every contributor has registered, the total unknown and residual
/// sizes must match or the segment fails with a configuration error.
pub trait Contributor: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn register(&self, segment: &mut Segment, process: &mut SegmentProcess) -> MissionResult<()>;
}
