#![allow(dead_code)]

use sf_core::units::{joules, kg, m, m2, newtons};
use sf_mission::{
    Analyses, Contributor, InitialConditions, IsaTroposphere, MissionResult, ParabolicDragPolar,
    Segment, SegmentProcess, ThrottleNetwork,
};
use sf_state::Array;

/// Residual `1000·throttle − target` at every control point.
#[derive(Debug)]
pub struct LinearThrottle {
    pub target: f64,
}

impl Contributor for LinearThrottle {
    fn name(&self) -> &str {
        "linear_throttle"
    }

    fn register(&self, segment: &mut Segment, process: &mut SegmentProcess) -> MissionResult<()> {
        let n = segment.control_points();
        segment
            .state_mut()
            .declare_unknown("throttle", Array::from_element(n, 1, 0.5))?;
        segment
            .state_mut()
            .declare_residual("thrust_balance", Array::zeros(n, 1))?;

        process.set_step("iterate.unknowns.throttle", |seg: &mut Segment| {
            let throttle = seg.state().unknown("throttle")?.clone();
            seg.state_mut().set("propulsion.throttle", throttle)?;
            Ok(())
        })?;
        let target = self.target;
        process.set_step(
            "iterate.residuals.thrust_balance",
            move |seg: &mut Segment| {
                let throttle = seg.state().get("propulsion.throttle")?;
                let residual = throttle.map(|t| 1000.0 * t - target);
                seg.state_mut().set_residual("thrust_balance", residual)?;
                Ok(())
            },
        )?;
        Ok(())
    }
}

/// Like [`LinearThrottle`] but the modelled power is undefined below `floor`,
/// so any evaluation there yields NaN residuals and conditions.
#[derive(Debug)]
pub struct ThrottleWithFloor {
    pub target: f64,
    pub floor: f64,
}

impl Contributor for ThrottleWithFloor {
    fn name(&self) -> &str {
        "throttle_with_floor"
    }

    fn register(&self, segment: &mut Segment, process: &mut SegmentProcess) -> MissionResult<()> {
        let n = segment.control_points();
        segment
            .state_mut()
            .declare_unknown("throttle", Array::from_element(n, 1, 0.5))?;
        segment
            .state_mut()
            .declare_residual("thrust_balance", Array::zeros(n, 1))?;

        let floor = self.floor;
        process.set_step("iterate.unknowns.throttle", move |seg: &mut Segment| {
            let throttle = seg.state().unknown("throttle")?.clone();
            let power = throttle.map(|t| 1000.0 * (t - floor).sqrt());
            seg.state_mut().set("propulsion.throttle", throttle)?;
            seg.state_mut().set("propulsion.power", power)?;
            Ok(())
        })?;
        let target = self.target;
        process.set_step(
            "iterate.residuals.thrust_balance",
            move |seg: &mut Segment| {
                let throttle = seg.state().get("propulsion.throttle")?.clone();
                let power = seg.state().get("propulsion.power")?;
                let residual = throttle.zip_map(power, |t, p| 1000.0 * t - target + 0.0 * p);
                seg.state_mut().set_residual("thrust_balance", residual)?;
                Ok(())
            },
        )?;
        Ok(())
    }
}

pub fn polar() -> ParabolicDragPolar {
    ParabolicDragPolar {
        cl0: 0.2,
        cl_alpha: 5.5,
        cd0: 0.03,
        k: 0.05,
    }
}

/// Light aircraft with one fuel-burning network.
pub fn fuel_aircraft() -> Analyses {
    Analyses::new(m2(16.0))
        .with_atmosphere(IsaTroposphere::default())
        .with_aerodynamics(polar())
        .with_network(ThrottleNetwork::fuel("engine", newtons(3000.0), 2e-5))
}

/// Same airframe with a battery-electric network.
pub fn electric_aircraft() -> Analyses {
    Analyses::new(m2(16.0))
        .with_atmosphere(IsaTroposphere::default())
        .with_aerodynamics(polar())
        .with_network(ThrottleNetwork::battery(
            "pack",
            newtons(2000.0),
            joules(1.0e8),
            0.9,
        ))
}

pub fn initial_at(altitude: f64) -> InitialConditions {
    InitialConditions::new(kg(1000.0)).at_altitude(m(altitude))
}

pub fn strictly_decreasing(values: &[f64]) -> bool {
    values.windows(2).all(|w| w[1] < w[0])
}
