//! Segments and the per-segment solve driver.

use std::fmt;
use std::sync::Arc;

use nalgebra::DVector;
use sf_core::SegmentId;
use sf_grid::{ControlPointGrid, GridKind};
use sf_process::ProcessNode;
use sf_solver::{ResidualSystem, SolverConfig, SolverError};
use sf_state::{Conditions, State, StateError};
use tracing::{debug, info, warn};

use crate::analyses::Analyses;
use crate::error::{MissionError, MissionResult};
use crate::kinds::SegmentKind;
use crate::results::SegmentResult;

/// Process tree whose steps operate on a [`Segment`].
pub type SegmentProcess = ProcessNode<Segment, MissionError>;

/// Which `post_process` steps may run on a segment that failed to converge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FailedPostProcess {
    /// Skip post-processing entirely.
    #[default]
    Skip,
    /// Run only these paths below `post_process`, in this order. Network
    /// checks live under `networks.<name>`.
    Only(Vec<String>),
}

/// Per-segment numerical settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Numerics {
    pub number_of_control_points: usize,
    pub grid: GridKind,
    pub solver: SolverConfig,
    pub failed_post_process: FailedPostProcess,
}

impl Default for Numerics {
    fn default() -> Self {
        Self {
            number_of_control_points: 16,
            grid: GridKind::default(),
            solver: SolverConfig::default(),
            failed_post_process: FailedPostProcess::Skip,
        }
    }
}

impl Numerics {
    pub fn validate(&self) -> MissionResult<()> {
        if self.number_of_control_points < 2 {
            return Err(MissionError::config(format!(
                "number_of_control_points must be at least 2, got {}",
                self.number_of_control_points
            )));
        }
        self.solver.validate()?;
        Ok(())
    }
}

/// Lifecycle of a segment solve.
///
/// `Uninitialized → Initializing → Iterating → {Converged | Failed}`, then
/// `Converged → PostProcessed`. Configuration errors during initialization
/// move straight to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentStatus {
    Uninitialized,
    Initializing,
    Iterating,
    Converged,
    Failed,
    PostProcessed,
}

impl SegmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentStatus::Uninitialized => "uninitialized",
            SegmentStatus::Initializing => "initializing",
            SegmentStatus::Iterating => "iterating",
            SegmentStatus::Converged => "converged",
            SegmentStatus::Failed => "failed",
            SegmentStatus::PostProcessed => "post_processed",
        }
    }

    fn can_become(self, next: SegmentStatus) -> bool {
        use SegmentStatus::*;
        matches!(
            (self, next),
            (Uninitialized, Initializing)
                | (Initializing, Iterating)
                | (Initializing, Failed)
                | (Iterating, Converged)
                | (Iterating, Failed)
                | (Converged, PostProcessed)
        )
    }
}

impl fmt::Display for SegmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the nonlinear solve of one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub converged: bool,
    pub iterations: usize,
    pub residual_norm: f64,
}

/// One flight segment: its state, grid and the analyses it consults.
///
/// Process steps receive `&mut Segment`.
#[derive(Debug)]
pub struct Segment {
    name: String,
    kind: SegmentKind,
    numerics: Numerics,
    state: State,
    grid: Option<Arc<ControlPointGrid>>,
    analyses: Arc<Analyses>,
    initials: Option<Conditions>,
}

impl Segment {
    pub fn new(
        name: impl Into<String>,
        kind: SegmentKind,
        numerics: Numerics,
        analyses: Arc<Analyses>,
    ) -> Self {
        let state = State::new(numerics.number_of_control_points);
        Self {
            name: name.into(),
            kind,
            numerics,
            state,
            grid: None,
            analyses,
            initials: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SegmentKind {
        &self.kind
    }

    pub fn numerics(&self) -> &Numerics {
        &self.numerics
    }

    pub fn control_points(&self) -> usize {
        self.state.control_points()
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }

    pub fn analyses(&self) -> &Analyses {
        &self.analyses
    }

    /// Shared handle to the analyses, for steps that also need `&mut self`.
    pub fn analyses_handle(&self) -> Arc<Analyses> {
        Arc::clone(&self.analyses)
    }

    /// Seed conditions: the predecessor's final conditions, or the mission's
    /// initial conditions for the first segment.
    pub fn set_initials(&mut self, seed: Conditions) {
        self.initials = Some(seed);
    }

    pub fn initials(&self) -> Option<&Conditions> {
        self.initials.as_ref()
    }

    /// Last row of `path` in the seed conditions. `None` when there are no
    /// seed conditions or they lack `path`; a malformed entry is an error.
    pub fn initial_value(&self, path: &str) -> MissionResult<Option<Vec<f64>>> {
        let Some(initials) = &self.initials else {
            return Ok(None);
        };
        match initials.last_row(path) {
            Ok(row) => Ok(Some(row)),
            Err(StateError::MissingField { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The control-point grid; available once `initialize` has built it.
    pub fn grid(&self) -> MissionResult<Arc<ControlPointGrid>> {
        self.grid.clone().ok_or_else(|| {
            MissionError::config(format!("segment '{}' has no grid yet", self.name))
        })
    }

    /// Segment duration in seconds (`numerics.time.duration`).
    pub fn duration(&self) -> MissionResult<f64> {
        Ok(self.state.scalar("numerics.time.duration")?)
    }

    pub(crate) fn build_grid(&mut self) -> MissionResult<()> {
        if self.grid.is_some() {
            return Err(MissionError::config(format!(
                "segment '{}' grid built twice",
                self.name
            )));
        }
        let grid = ControlPointGrid::new(self.numerics.number_of_control_points, self.numerics.grid)?;
        self.grid = Some(Arc::new(grid));
        Ok(())
    }
}

/// A segment together with its process tree and solve status.
#[derive(Debug)]
pub struct SegmentRun {
    segment: Segment,
    process: SegmentProcess,
    status: SegmentStatus,
    report: Option<SolveReport>,
    failed_post_processed: bool,
}

impl SegmentRun {
    /// Wrap `segment` with the default process tree for its kind.
    pub fn new(segment: Segment) -> MissionResult<Self> {
        let process = segment.kind().build_process()?;
        Ok(Self::with_process(segment, process))
    }

    /// Wrap `segment` with a caller-supplied process tree.
    pub fn with_process(segment: Segment, process: SegmentProcess) -> Self {
        Self {
            segment,
            process,
            status: SegmentStatus::Uninitialized,
            report: None,
            failed_post_processed: false,
        }
    }

    pub fn segment(&self) -> &Segment {
        &self.segment
    }

    pub fn process(&self) -> &SegmentProcess {
        &self.process
    }

    /// Mutable access to the process tree, for overrides before `initialize`.
    pub fn process_mut(&mut self) -> &mut SegmentProcess {
        &mut self.process
    }

    pub fn status(&self) -> SegmentStatus {
        self.status
    }

    pub fn report(&self) -> Option<SolveReport> {
        self.report
    }

    fn transition(&mut self, next: SegmentStatus) -> MissionResult<()> {
        if !self.status.can_become(next) {
            return Err(MissionError::InvalidTransition {
                segment: self.segment.name.clone(),
                from: self.status,
                to: next,
            });
        }
        debug!(
            segment = self.segment.name.as_str(),
            from = self.status.as_str(),
            to = next.as_str(),
            "segment status"
        );
        self.status = next;
        Ok(())
    }

    /// Declare variables, register contributors, check the system is
    /// square and run the `initialize` phase. Runs at most once.
    pub fn initialize(&mut self) -> MissionResult<()> {
        self.transition(SegmentStatus::Initializing)?;
        if let Err(err) = self.try_initialize() {
            self.transition(SegmentStatus::Failed)?;
            return Err(err);
        }
        Ok(())
    }

    fn try_initialize(&mut self) -> MissionResult<()> {
        self.segment.numerics.validate()?;

        let kind = self.segment.kind.clone();
        kind.declare_variables(&mut self.segment)?;

        let analyses = self.segment.analyses_handle();
        for contributor in analyses.all_contributors() {
            debug!(
                segment = self.segment.name.as_str(),
                contributor = contributor.name(),
                "registering contributor"
            );
            contributor.register(&mut self.segment, &mut self.process)?;
        }

        let unknowns = self.segment.state.unknowns().size();
        let residuals = self.segment.state.residuals().size();
        if unknowns != residuals {
            return Err(MissionError::config(format!(
                "segment '{}' is not square: {unknowns} unknowns, {residuals} residuals",
                self.segment.name
            )));
        }

        self.process.run_path("initialize", &mut self.segment)
    }

    /// Evaluate `F(x)`: write `x` into the unknowns, run `iterate`, and
    /// return the flattened residuals.
    pub fn residuals_at(&mut self, x: &DVector<f64>) -> MissionResult<DVector<f64>> {
        if self.status == SegmentStatus::Uninitialized {
            return Err(MissionError::config(format!(
                "segment '{}' evaluated before initialize",
                self.segment.name
            )));
        }
        SegmentSystem {
            segment: &mut self.segment,
            process: &self.process,
        }
        .residuals(x)
    }

    /// Drive the residuals to zero. On success the state holds the
    /// converged iterate; on a convergence failure it holds the last
    /// accepted one.
    pub fn solve(&mut self) -> MissionResult<SolveReport> {
        self.transition(SegmentStatus::Iterating)?;

        let config = self.segment.numerics.solver.clone();
        let x0 = self.segment.state.flatten_unknowns();
        let mut system = SegmentSystem {
            segment: &mut self.segment,
            process: &self.process,
        };

        let outcome = match sf_solver::solve(&mut system, x0, &config) {
            // Re-evaluate so every condition reflects the converged unknowns.
            Ok(solution) => system.residuals(&solution.x).map(|_| solution),
            Err(err) => {
                // The last evaluation may have been a rejected trial or a
                // Jacobian perturbation; go back to the last accepted iterate.
                if let Some(x) = err.best_effort() {
                    if let Err(restore) = system.residuals(&DVector::from_column_slice(x)) {
                        warn!(
                            segment = system.segment.name.as_str(),
                            error = %restore,
                            "could not restore last accepted iterate"
                        );
                    }
                }
                Err(err)
            }
        };

        match outcome {
            Ok(solution) => {
                let report = SolveReport {
                    converged: true,
                    iterations: solution.iterations,
                    residual_norm: solution.residual_norm,
                };
                self.report = Some(report);
                self.transition(SegmentStatus::Converged)?;
                info!(
                    segment = self.segment.name.as_str(),
                    iterations = report.iterations,
                    residual_norm = report.residual_norm,
                    "segment converged"
                );
                Ok(report)
            }
            Err(err) => {
                if let MissionError::Solver(SolverError::ConvergenceFailure {
                    iterations,
                    residual_norm,
                    ..
                }) = &err
                {
                    self.report = Some(SolveReport {
                        converged: false,
                        iterations: *iterations,
                        residual_norm: *residual_norm,
                    });
                    warn!(
                        segment = self.segment.name.as_str(),
                        iterations = *iterations,
                        residual_norm = *residual_norm,
                        "segment failed to converge"
                    );
                }
                self.transition(SegmentStatus::Failed)?;
                Err(err)
            }
        }
    }

    /// Run `post_process` once. A failed segment only runs the steps its
    /// numerics list in [`FailedPostProcess::Only`].
    pub fn post_process(&mut self) -> MissionResult<()> {
        match self.status {
            SegmentStatus::Converged => {
                self.process.run_path("post_process", &mut self.segment)?;
                self.transition(SegmentStatus::PostProcessed)
            }
            SegmentStatus::Failed if !self.failed_post_processed => {
                self.failed_post_processed = true;
                let allowed = match &self.segment.numerics.failed_post_process {
                    FailedPostProcess::Skip => return Ok(()),
                    FailedPostProcess::Only(names) => names.clone(),
                };
                for name in allowed {
                    self.process
                        .run_path(&format!("post_process.{name}"), &mut self.segment)?;
                }
                Ok(())
            }
            from => Err(MissionError::InvalidTransition {
                segment: self.segment.name.clone(),
                from,
                to: SegmentStatus::PostProcessed,
            }),
        }
    }

    /// `initialize`, `solve`, then `post_process`.
    ///
    /// A convergence failure still runs the failure-tolerant post-process
    /// steps before the error is returned.
    pub fn evaluate(&mut self) -> MissionResult<SolveReport> {
        self.initialize()?;
        match self.solve() {
            Ok(report) => {
                self.post_process()?;
                Ok(report)
            }
            Err(err) => {
                if err.is_convergence_failure() {
                    self.post_process()?;
                }
                Err(err)
            }
        }
    }

    /// Consume the run, keeping its final conditions and status.
    pub fn into_result(self, id: SegmentId) -> SegmentResult {
        SegmentResult {
            id,
            name: self.segment.name,
            kind: self.segment.kind.as_str().to_string(),
            status: self.status,
            report: self.report,
            conditions: self.segment.state.into_conditions(),
        }
    }
}

/// `F(x)` for one segment: unflatten, run `iterate`, flatten residuals.
struct SegmentSystem<'a> {
    segment: &'a mut Segment,
    process: &'a SegmentProcess,
}

impl ResidualSystem for SegmentSystem<'_> {
    type Error = MissionError;

    fn residuals(&mut self, x: &DVector<f64>) -> MissionResult<DVector<f64>> {
        self.segment.state.unflatten_into_unknowns(x)?;
        self.process.run_path("iterate", self.segment)?;
        Ok(self.segment.state.flatten_residuals())
    }
}
