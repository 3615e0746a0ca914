//! Turns a validated mission file into a runnable [`Mission`].

use sf_core::units::{joules, kg, m, m2, mps, mps2, newtons, s};
use sf_grid::GridKind;
use sf_mission::{
    Analyses, FailedPostProcess, FailurePolicy, InitialConditions, IsaTroposphere, Mission,
    MissionResult, Numerics, ParabolicDragPolar, SegmentKind, ThrottleNetwork,
};
use sf_project::{
    AerodynamicsDef, AtmosphereDef, EnergySourceDef, FailurePolicyDef, GridDef, MissionDef,
    NetworkDef, NumericsDef, SegmentKindDef, SolverMethodDef,
};
use sf_solver::SolverMethod;

pub fn compile_mission(def: &MissionDef) -> MissionResult<Mission> {
    let mut mission = Mission::new(def.name.clone(), compile_analyses(def), compile_initial(def))
        .with_policy(match def.failure_policy {
            FailurePolicyDef::Abort => FailurePolicy::Abort,
            FailurePolicyDef::ContinueBestEffort => FailurePolicy::ContinueBestEffort,
        });

    for segment in &def.segments {
        mission.add_segment(
            segment.name.clone(),
            compile_kind(&segment.kind),
            compile_numerics(segment.numerics_or(&def.numerics)),
        )?;
    }
    Ok(mission)
}

fn compile_analyses(def: &MissionDef) -> Analyses {
    let vehicle = &def.vehicle;
    let AtmosphereDef::Isa {
        delta_temperature_k,
    } = vehicle.atmosphere;
    let mut analyses = Analyses::new(m2(vehicle.reference_area_m2)).with_atmosphere(
        IsaTroposphere {
            delta_temperature: delta_temperature_k,
        },
    );

    if let Some(AerodynamicsDef::ParabolicPolar {
        cl0,
        cl_alpha_per_rad,
        cd0,
        k,
    }) = vehicle.aerodynamics
    {
        analyses = analyses.with_aerodynamics(ParabolicDragPolar {
            cl0,
            cl_alpha: cl_alpha_per_rad,
            cd0,
            k,
        });
    }

    for network in &vehicle.networks {
        analyses = analyses.with_network(compile_network(network));
    }
    analyses
}

fn compile_network(def: &NetworkDef) -> ThrottleNetwork {
    let network = match def.source {
        EnergySourceDef::Fuel { tsfc_kg_per_n_s } => {
            ThrottleNetwork::fuel(def.name.clone(), newtons(def.max_thrust_n), tsfc_kg_per_n_s)
        }
        EnergySourceDef::Battery {
            capacity_j,
            efficiency,
        } => ThrottleNetwork::battery(
            def.name.clone(),
            newtons(def.max_thrust_n),
            joules(capacity_j),
            efficiency,
        ),
    };
    network.with_initial_throttle(def.initial_throttle)
}

fn compile_initial(def: &MissionDef) -> InitialConditions {
    let [x, y, z] = def.initial.position_m;
    InitialConditions {
        time: s(def.initial.time_s),
        position: [m(x), m(y), m(z)],
        mass: kg(def.initial.mass_kg),
    }
}

fn compile_numerics(def: &NumericsDef) -> Numerics {
    let method = match def.solver.method {
        SolverMethodDef::Newton => SolverMethod::Newton,
        SolverMethodDef::Broyden => SolverMethod::Broyden,
    };
    let mut solver = method.to_config();
    if let Some(max) = def.solver.max_iterations {
        solver.max_iterations = max;
    }
    if let Some(tol) = def.solver.tolerance {
        solver.tolerance = tol;
    }

    Numerics {
        number_of_control_points: def.control_points,
        grid: match def.grid {
            GridDef::Linspace => GridKind::Linspace,
            GridDef::Chebyshev => GridKind::ChebyshevGaussLobatto,
        },
        solver,
        failed_post_process: if def.failed_post_process.is_empty() {
            FailedPostProcess::Skip
        } else {
            FailedPostProcess::Only(def.failed_post_process.clone())
        },
    }
}

fn compile_kind(def: &SegmentKindDef) -> SegmentKind {
    match *def {
        SegmentKindDef::Generic { duration_s } => SegmentKind::Generic {
            duration: s(duration_s),
        },
        SegmentKindDef::Cruise {
            altitude_m,
            air_speed_mps,
            distance_m,
        } => SegmentKind::Cruise {
            altitude: m(altitude_m),
            air_speed: mps(air_speed_mps),
            distance: m(distance_m),
        },
        SegmentKindDef::Climb {
            altitude_start_m,
            altitude_end_m,
            air_speed_mps,
            climb_rate_mps,
        } => SegmentKind::Climb {
            altitude_start: altitude_start_m.map(m),
            altitude_end: m(altitude_end_m),
            air_speed: mps(air_speed_mps),
            climb_rate: mps(climb_rate_mps),
        },
        SegmentKindDef::Descent {
            altitude_start_m,
            altitude_end_m,
            air_speed_mps,
            descent_rate_mps,
        } => SegmentKind::Descent {
            altitude_start: m(altitude_start_m),
            altitude_end: m(altitude_end_m),
            air_speed: mps(air_speed_mps),
            descent_rate: mps(descent_rate_mps),
        },
        SegmentKindDef::Loiter {
            altitude_m,
            air_speed_mps,
            duration_s,
        } => SegmentKind::Loiter {
            altitude: m(altitude_m),
            air_speed: mps(air_speed_mps),
            duration: s(duration_s),
        },
        SegmentKindDef::Transition {
            altitude_m,
            speed_start_mps,
            speed_end_mps,
            acceleration_mps2,
        } => SegmentKind::Transition {
            altitude: m(altitude_m),
            speed_start: mps(speed_start_mps),
            speed_end: mps(speed_end_mps),
            acceleration: mps2(acceleration_mps2),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn demo(name: &str) -> MissionDef {
        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("../../demos")
            .join(name);
        sf_project::load_yaml(&path).unwrap()
    }

    #[test]
    fn numerics_overrides_apply() {
        let mut def = NumericsDef::default();
        def.solver.method = SolverMethodDef::Broyden;
        def.solver.tolerance = Some(1e-6);
        def.grid = GridDef::Linspace;
        def.failed_post_process = vec!["diagnostics".to_string()];

        let numerics = compile_numerics(&def);
        assert_eq!(numerics.solver.method, SolverMethod::Broyden);
        assert_eq!(
            numerics.solver.max_iterations,
            SolverMethod::Broyden.to_config().max_iterations
        );
        assert_eq!(numerics.solver.tolerance, 1e-6);
        assert_eq!(numerics.grid, GridKind::Linspace);
        assert_eq!(
            numerics.failed_post_process,
            FailedPostProcess::Only(vec!["diagnostics".to_string()])
        );
    }

    #[test]
    fn hop_demo_compiles_in_order() {
        let mission = compile_mission(&demo("hop.yaml")).unwrap();
        let names: Vec<_> = mission.segments().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["climb", "cruise", "descent"]);
        assert_eq!(mission.policy(), FailurePolicy::Abort);
        assert_eq!(mission.initial().position[2].value, 1000.0);
        assert_eq!(
            mission.segments()[2].numerics.solver.method,
            SolverMethod::Broyden
        );
    }

    #[test]
    fn hop_demo_flies() {
        let mission = compile_mission(&demo("hop.yaml")).unwrap();
        let results = mission.evaluate().unwrap();
        assert!(results.all_converged());
        let mass = results.mass_history().unwrap();
        assert!(mass[mass.len() - 1] < mass[0]);
    }

    #[test]
    fn electric_demo_keeps_mass() {
        let mission = compile_mission(&demo("electric_loiter.yaml")).unwrap();
        assert_eq!(mission.policy(), FailurePolicy::ContinueBestEffort);
        let results = mission.evaluate().unwrap();
        let mass = results.mass_history().unwrap();
        assert!(mass.iter().all(|m| (m - 1000.0).abs() < 1e-9));
        let energy = results.segment("loiter").unwrap().energy("pack").unwrap();
        assert!(energy[energy.len() - 1] < energy[0]);
    }
}
