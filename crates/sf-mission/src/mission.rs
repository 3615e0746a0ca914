//! Ordered segment sequencing.

use std::sync::Arc;

use sf_core::units::{Length, Mass, Time, m, s};
use sf_core::{SegmentId, ensure_all_finite, ensure_finite};
use sf_solver::SolverError;
use sf_state::{Array, Conditions};
use tracing::{info, warn};

use crate::analyses::Analyses;
use crate::error::{MissionError, MissionResult};
use crate::kinds::SegmentKind;
use crate::results::MissionResults;
use crate::segment::{Numerics, Segment, SegmentRun};

/// What a mission does when a segment fails to converge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop and report the failed segment.
    #[default]
    Abort,
    /// Keep the failed segment's last iterate and continue with the next.
    ContinueBestEffort,
}

/// Conditions at the start of the first segment.
#[derive(Debug, Clone, PartialEq)]
pub struct InitialConditions {
    pub time: Time,
    /// Inertial position; the third component is altitude.
    pub position: [Length; 3],
    pub mass: Mass,
}

impl InitialConditions {
    pub fn new(mass: Mass) -> Self {
        Self {
            time: s(0.0),
            position: [m(0.0), m(0.0), m(0.0)],
            mass,
        }
    }

    pub fn at_altitude(mut self, altitude: Length) -> Self {
        self.position[2] = altitude;
        self
    }

    /// Single-row seed conditions in the same layout segments produce.
    pub fn to_conditions(&self) -> MissionResult<Conditions> {
        let position: Vec<f64> = self.position.iter().map(|p| p.value).collect();
        ensure_finite(self.time.value, "initial time")?;
        ensure_all_finite(&position, "initial position")?;
        ensure_finite(self.mass.value, "initial mass")?;

        let mut seed = Conditions::new();
        seed.set(
            "frames.inertial.time",
            Array::from_element(1, 1, self.time.value),
        )?;
        seed.set(
            "frames.inertial.position",
            Array::from_row_slice(1, 3, &position),
        )?;
        seed.set(
            "freestream.altitude",
            Array::from_element(1, 1, self.position[2].value),
        )?;
        seed.set(
            "weights.total_mass",
            Array::from_element(1, 1, self.mass.value),
        )?;
        Ok(seed)
    }
}

/// Definition of one segment inside a mission.
#[derive(Debug, Clone)]
pub struct SegmentSpec {
    pub name: String,
    pub kind: SegmentKind,
    pub numerics: Numerics,
}

/// An ordered list of segments sharing one set of analyses.
#[derive(Debug, Clone)]
pub struct Mission {
    name: String,
    analyses: Arc<Analyses>,
    initial: InitialConditions,
    segments: Vec<SegmentSpec>,
    policy: FailurePolicy,
}

impl Mission {
    pub fn new(name: impl Into<String>, analyses: Analyses, initial: InitialConditions) -> Self {
        Self {
            name: name.into(),
            analyses: Arc::new(analyses),
            initial,
            segments: Vec::new(),
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn analyses(&self) -> &Analyses {
        &self.analyses
    }

    pub fn initial(&self) -> &InitialConditions {
        &self.initial
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[SegmentSpec] {
        &self.segments
    }

    pub fn segment(&self, id: SegmentId) -> Option<&SegmentSpec> {
        self.segments.get(id.index() as usize)
    }

    /// Append a segment. Names must be unique within the mission.
    pub fn add_segment(
        &mut self,
        name: impl Into<String>,
        kind: SegmentKind,
        numerics: Numerics,
    ) -> MissionResult<SegmentId> {
        let name = name.into();
        if self.segments.iter().any(|s| s.name == name) {
            return Err(MissionError::config(format!(
                "duplicate segment name '{name}'"
            )));
        }
        let index = u32::try_from(self.segments.len())
            .map_err(|_| MissionError::config("too many segments"))?;
        self.segments.push(SegmentSpec {
            name,
            kind,
            numerics,
        });
        Ok(SegmentId::from_index(index))
    }

    /// Solve every segment in order.
    ///
    /// Segment `i` is seeded with a copy of segment `i - 1`'s final
    /// conditions (the first with the mission's initial conditions). Under
    /// [`FailurePolicy::Abort`] a convergence failure stops the mission with
    /// [`MissionError::SegmentFailed`]; every other error stops it as-is.
    pub fn evaluate(&self) -> MissionResult<MissionResults> {
        info!(
            mission = self.name.as_str(),
            segments = self.segments.len(),
            "evaluating mission"
        );

        let mut seed = self.initial.to_conditions()?;
        let mut results = Vec::with_capacity(self.segments.len());

        for (index, spec) in self.segments.iter().enumerate() {
            let id = SegmentId::from_index(index as u32);
            let mut segment = Segment::new(
                spec.name.clone(),
                spec.kind.clone(),
                spec.numerics.clone(),
                Arc::clone(&self.analyses),
            );
            segment.set_initials(seed);

            let mut run = SegmentRun::new(segment)?;
            info!(
                mission = self.name.as_str(),
                segment = spec.name.as_str(),
                kind = spec.kind.as_str(),
                "solving segment"
            );
            match run.evaluate() {
                Ok(_) => {}
                Err(err)
                    if err.is_convergence_failure()
                        && self.policy == FailurePolicy::ContinueBestEffort =>
                {
                    warn!(
                        mission = self.name.as_str(),
                        segment = spec.name.as_str(),
                        error = %err,
                        "continuing past failed segment"
                    );
                }
                Err(err) => return Err(segment_failure(&spec.name, err)),
            }

            let result = run.into_result(id);
            seed = result.conditions.clone();
            results.push(result);
        }

        Ok(MissionResults {
            name: self.name.clone(),
            segments: results,
        })
    }
}

fn segment_failure(segment: &str, err: MissionError) -> MissionError {
    match err {
        MissionError::Solver(SolverError::ConvergenceFailure {
            reason,
            iterations,
            residual_norm,
            ..
        }) => MissionError::SegmentFailed {
            segment: segment.to_string(),
            residual_norm,
            iterations,
            reason,
        },
        other => other,
    }
}
