//! sf-mission: segment orchestration and mission sequencing.
//!
//! A [`Segment`] owns one [`sf_state::State`] and is driven through an
//! ordered process tree with three phases:
//!
//! - `initialize`: runs once; builds the control-point grid, seeds initial
//!   time/position/mass from the predecessor and fixes the kinematics.
//! - `iterate`: `unknowns`, `conditions`, `residuals`; re-run by the root
//!   solver on every residual evaluation.
//! - `post_process`: runs once after convergence.
//!
//! Physics enters through [`Contributor`]s that declare unknowns/residuals
//! and install their own steps. A [`Mission`] solves its segments in order,
//! seeding each from a by-value snapshot of its predecessor's conditions.

pub mod analyses;
pub mod contributor;
pub mod error;
pub mod kinds;
pub mod mission;
pub mod network;
pub mod results;
pub mod segment;

pub use analyses::{
    AeroCoefficients, Aerodynamics, Analyses, Atmosphere, AtmosphereSample, IsaTroposphere,
    ParabolicDragPolar,
};
pub use contributor::Contributor;
pub use error::{MissionError, MissionResult};
pub use kinds::SegmentKind;
pub use mission::{FailurePolicy, InitialConditions, Mission, SegmentSpec};
pub use network::{EnergySource, ThrottleNetwork};
pub use results::{MissionResults, SegmentResult};
pub use segment::{
    FailedPostProcess, Numerics, Segment, SegmentProcess, SegmentRun, SegmentStatus, SolveReport,
};
