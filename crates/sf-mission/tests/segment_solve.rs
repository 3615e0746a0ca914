mod common;

use std::sync::Arc;

use common::{LinearThrottle, fuel_aircraft, initial_at};
use proptest::prelude::*;
use sf_core::units::{m, mps, s};
use sf_grid::GridKind;
use sf_mission::{
    Analyses, MissionError, Numerics, Segment, SegmentKind, SegmentRun, SegmentStatus,
    ThrottleNetwork,
};
use sf_solver::SolverMethod;
use sf_state::{Array, Conditions, StateError};

fn generic_run(analyses: Analyses, numerics: Numerics) -> SegmentRun {
    let mut segment = Segment::new(
        "hold",
        SegmentKind::Generic { duration: s(60.0) },
        numerics,
        Arc::new(analyses),
    );
    segment.set_initials(initial_at(0.0).to_conditions().unwrap());
    SegmentRun::new(segment).unwrap()
}

fn cruise_run(numerics: Numerics) -> SegmentRun {
    let mut segment = Segment::new(
        "cruise",
        SegmentKind::Cruise {
            altitude: m(1000.0),
            air_speed: mps(60.0),
            distance: m(20_000.0),
        },
        numerics,
        Arc::new(fuel_aircraft()),
    );
    segment.set_initials(initial_at(1000.0).to_conditions().unwrap());
    SegmentRun::new(segment).unwrap()
}

fn small_numerics() -> Numerics {
    Numerics {
        number_of_control_points: 8,
        ..Numerics::default()
    }
}

#[test]
fn throttle_contributor_converges_to_point_four() {
    let analyses = Analyses::default().with_contributor(LinearThrottle { target: 400.0 });
    let mut run = generic_run(analyses, Numerics::default());

    let report = run.evaluate().unwrap();
    assert!(report.converged);
    assert!(report.iterations < 50);
    assert_eq!(run.status(), SegmentStatus::PostProcessed);

    let throttle = run.segment().state().get("propulsion.throttle").unwrap();
    for &t in throttle.iter() {
        assert!((t - 0.4).abs() < 1e-6);
    }
}

#[test]
fn non_square_system_fails_before_solving() {
    // A throttle unknown with no residual to balance it.
    let analyses = Analyses::default().with_network(ThrottleNetwork::fuel(
        "engine",
        sf_core::units::newtons(1000.0),
        1e-5,
    ));
    let mut run = generic_run(analyses, small_numerics());

    let err = run.initialize().unwrap_err();
    assert!(matches!(err, MissionError::Configuration { .. }));
    assert_eq!(run.status(), SegmentStatus::Failed);
    assert!(run.report().is_none());
}

#[test]
fn residual_evaluation_is_idempotent() {
    let mut run = cruise_run(small_numerics());
    run.initialize().unwrap();

    let x = run.segment().state().flatten_unknowns();
    let first = run.residuals_at(&x).unwrap();
    let elsewhere = x.map(|v| v + 0.01);
    let _ = run.residuals_at(&elsewhere).unwrap();
    let second = run.residuals_at(&x).unwrap();

    assert_eq!(first, second);
}

#[test]
fn cruise_converges_and_burns_fuel() {
    let mut run = cruise_run(small_numerics());
    let report = run.evaluate().unwrap();
    assert!(report.converged);
    assert!(report.residual_norm < 1e-9);

    let state = run.segment().state();
    let mass: Vec<f64> = state.get("weights.total_mass").unwrap().iter().copied().collect();
    assert!(common::strictly_decreasing(&mass));
    assert!((mass[0] - 1000.0).abs() < 1e-9);

    let throttle = state.unknown("throttle.engine").unwrap();
    assert!(throttle.iter().all(|&t| t > 0.0 && t < 1.0));

    // Level flight: lift carries the weight almost entirely.
    let lift = state.get("forces.lift").unwrap();
    let weight = mass[0] * sf_core::constants::G0_MPS2;
    assert!((lift[(0, 0)] - weight).abs() / weight < 0.05);
}

#[test]
fn broyden_and_newton_agree_on_cruise() {
    let mut newton = cruise_run(small_numerics());
    newton.evaluate().unwrap();

    let mut numerics = small_numerics();
    numerics.solver = SolverMethod::Broyden.to_config();
    let mut broyden = cruise_run(numerics);
    broyden.evaluate().unwrap();

    let a = newton.segment().state().flatten_unknowns();
    let b = broyden.segment().state().flatten_unknowns();
    assert!((a - b).amax() < 1e-6);
}

#[test]
fn linspace_grid_also_converges() {
    let mut numerics = small_numerics();
    numerics.grid = GridKind::Linspace;
    let mut run = cruise_run(numerics);
    assert!(run.evaluate().unwrap().converged);
}

#[test]
fn initialize_runs_once() {
    let mut run = cruise_run(small_numerics());
    run.initialize().unwrap();
    assert!(matches!(
        run.initialize(),
        Err(MissionError::InvalidTransition { .. })
    ));
}

#[test]
fn post_process_requires_a_solve() {
    let mut run = cruise_run(small_numerics());
    run.initialize().unwrap();
    assert!(matches!(
        run.post_process(),
        Err(MissionError::InvalidTransition { .. })
    ));
}

#[test]
fn overridden_step_keeps_its_position() {
    let mut run = cruise_run(small_numerics());
    run.process_mut()
        .set_step("post_process.diagnostics", |seg: &mut Segment| {
            seg.state_mut().set_scalar("numerics.custom", 1.0)?;
            Ok(())
        })
        .unwrap();
    run.evaluate().unwrap();

    let post: Vec<&str> = run.process().node("post_process").unwrap().names().collect();
    assert_eq!(post, vec!["diagnostics", "networks"]);
    let networks: Vec<&str> = run
        .process()
        .node("post_process.networks")
        .unwrap()
        .names()
        .collect();
    assert_eq!(networks, vec!["engine"]);
    assert_eq!(run.segment().state().scalar("numerics.custom").unwrap(), 1.0);
    assert!(!run.segment().state().conditions().contains("numerics.residual_norm"));
}

#[test]
fn missing_initial_mass_is_a_configuration_error() {
    let segment = Segment::new(
        "orphan",
        SegmentKind::Generic { duration: s(10.0) },
        small_numerics(),
        Arc::new(Analyses::default()),
    );
    let mut run = SegmentRun::new(segment).unwrap();
    assert!(matches!(
        run.initialize(),
        Err(MissionError::Configuration { .. })
    ));
}

#[test]
fn malformed_seed_time_is_not_silently_zeroed() {
    let mut seed = Conditions::new();
    seed.set("frames.inertial.time.start", Array::from_element(1, 1, 30.0))
        .unwrap();
    seed.set("weights.total_mass", Array::from_element(1, 1, 1000.0))
        .unwrap();
    let mut segment = Segment::new(
        "hold",
        SegmentKind::Generic { duration: s(10.0) },
        small_numerics(),
        Arc::new(Analyses::default()),
    );
    segment.set_initials(seed);
    let mut run = SegmentRun::new(segment).unwrap();
    assert!(matches!(
        run.initialize(),
        Err(MissionError::State(StateError::PathConflict { .. }))
    ));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn throttle_tracks_any_target(target in 50.0f64..950.0) {
        let analyses = Analyses::default().with_contributor(LinearThrottle { target });
        let mut run = generic_run(analyses, small_numerics());
        let report = run.evaluate().unwrap();
        prop_assert!(report.converged);
        let throttle = run.segment().state().unknown("throttle").unwrap();
        for &t in throttle.iter() {
            prop_assert!((t - target / 1000.0).abs() < 1e-6);
        }
    }
}
