use nalgebra::DMatrix;
use proptest::prelude::*;
use sf_core::units::{kg, m, m2, mps, newtons};
use sf_mission::{
    Analyses, InitialConditions, IsaTroposphere, Mission, Numerics, ParabolicDragPolar,
    SegmentKind, ThrottleNetwork,
};
use sf_results::{ConditionArchive, ResultsError};
use sf_state::Conditions;

fn finite() -> impl Strategy<Value = f64> {
    prop::num::f64::NORMAL | prop::num::f64::SUBNORMAL | prop::num::f64::ZERO
}

proptest! {
    #[test]
    fn archive_json_is_bit_exact(
        rows in 1usize..6,
        cols in 1usize..4,
        seed in prop::collection::vec(finite(), 24),
    ) {
        let data: Vec<f64> = seed.iter().copied().take(rows * cols).collect();
        let mut conditions = Conditions::new();
        conditions
            .set("energy.pack.energy", DMatrix::from_column_slice(rows, cols, &data))
            .unwrap();

        let json = ConditionArchive::from_conditions(&conditions).unwrap().to_json().unwrap();
        let back = ConditionArchive::from_json(&json).unwrap().to_conditions().unwrap();
        let restored = back.get("energy.pack.energy").unwrap();

        prop_assert_eq!(restored.shape(), (rows, cols));
        for (a, b) in restored.iter().zip(data.iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}

#[test]
fn mission_conditions_survive_archiving() {
    let analyses = Analyses::new(m2(16.0))
        .with_atmosphere(IsaTroposphere::default())
        .with_aerodynamics(ParabolicDragPolar {
            cl0: 0.2,
            cl_alpha: 5.5,
            cd0: 0.03,
            k: 0.05,
        })
        .with_network(ThrottleNetwork::fuel("engine", newtons(3000.0), 2e-5));
    let mut mission = Mission::new(
        "archive",
        analyses,
        InitialConditions::new(kg(1000.0)).at_altitude(m(1000.0)),
    );
    mission
        .add_segment(
            "cruise",
            SegmentKind::Cruise {
                altitude: m(1000.0),
                air_speed: mps(60.0),
                distance: m(10_000.0),
            },
            Numerics {
                number_of_control_points: 6,
                ..Numerics::default()
            },
        )
        .unwrap();
    let results = mission.evaluate().unwrap();
    let conditions = &results.segments[0].conditions;

    let archive = ConditionArchive::from_conditions(conditions).unwrap();
    assert!(archive.arrays.contains_key("weights.total_mass"));
    assert!(archive.arrays.contains_key("propulsion.networks.engine.thrust"));

    let restored = ConditionArchive::from_json(&archive.to_json().unwrap())
        .unwrap()
        .to_conditions()
        .unwrap();
    assert_eq!(&restored, conditions);
}

#[test]
fn infinite_values_rejected_on_read() {
    // serde_json cannot express Inf, but a huge literal overflows to it.
    let json = r#"{"arrays":{"x":{"rows":1,"cols":1,"data":[1e999]}}}"#;
    match ConditionArchive::from_json(json) {
        Err(ResultsError::NonFinite { path, .. }) => assert_eq!(path, "x"),
        Err(ResultsError::Json(_)) => {}
        other => panic!("unexpected {other:?}"),
    }
}
