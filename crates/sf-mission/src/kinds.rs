//! Built-in segment kinds and the process tree each one installs.
//!
//! Every kind shares the same skeleton:
//!
//! ```text
//! initialize   grid, initials, time, kinematics
//! iterate
//!   unknowns   body_angle
//!   conditions freestream, aerodynamics, propulsion.<network>, weights, forces
//!   residuals  force_balance
//! post_process diagnostics
//! ```
//!
//! `Generic` keeps only the time and mass bookkeeping and leaves all physics
//! to contributors. The flight kinds prescribe the speed and altitude
//! profile and solve for body angle plus whatever the networks declare.

use nalgebra::DVector;
use sf_core::constants::G0_MPS2;
use sf_core::inf_norm;
use sf_core::units::{Accel, Length, Time, Velocity};
use sf_state::{Array, ConditionNode, State, StateError};

use crate::error::{MissionError, MissionResult};
use crate::segment::{Segment, SegmentProcess};

/// Which flight segment to solve, with its prescribed profile.
#[derive(Debug, Clone, PartialEq)]
pub enum SegmentKind {
    /// Time only; all physics comes from contributors.
    Generic { duration: Time },
    /// Constant altitude and air speed over a ground distance.
    Cruise {
        altitude: Length,
        air_speed: Velocity,
        distance: Length,
    },
    /// Constant air speed and climb rate. A missing start altitude is taken
    /// from the previous segment.
    Climb {
        altitude_start: Option<Length>,
        altitude_end: Length,
        air_speed: Velocity,
        climb_rate: Velocity,
    },
    Descent {
        altitude_start: Length,
        altitude_end: Length,
        air_speed: Velocity,
        descent_rate: Velocity,
    },
    Loiter {
        altitude: Length,
        air_speed: Velocity,
        duration: Time,
    },
    /// Level, constant acceleration between two air speeds. Mass is held
    /// constant over the segment.
    Transition {
        altitude: Length,
        speed_start: Velocity,
        speed_end: Velocity,
        acceleration: Accel,
    },
}

/// Scalar description of a kind's prescribed trajectory (SI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Profile {
    pub duration: f64,
    pub altitude: f64,
    pub speed_start: f64,
    pub speed_end: f64,
    pub vertical_speed: f64,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Generic { .. } => "generic",
            SegmentKind::Cruise { .. } => "cruise",
            SegmentKind::Climb { .. } => "climb",
            SegmentKind::Descent { .. } => "descent",
            SegmentKind::Loiter { .. } => "loiter",
            SegmentKind::Transition { .. } => "transition",
        }
    }

    /// Kinds that solve the along-path and normal force balance.
    pub fn has_flight_dynamics(&self) -> bool {
        !matches!(self, SegmentKind::Generic { .. })
    }

    pub(crate) fn profile(&self, initial_altitude: Option<f64>) -> MissionResult<Profile> {
        let profile = match self {
            SegmentKind::Generic { duration } => Profile {
                duration: duration.value,
                altitude: initial_altitude.unwrap_or(0.0),
                speed_start: 0.0,
                speed_end: 0.0,
                vertical_speed: 0.0,
            },
            SegmentKind::Cruise {
                altitude,
                air_speed,
                distance,
            } => {
                positive("air_speed", air_speed.value)?;
                positive("distance", distance.value)?;
                level(altitude.value, air_speed.value, distance.value / air_speed.value)
            }
            SegmentKind::Climb {
                altitude_start,
                altitude_end,
                air_speed,
                climb_rate,
            } => {
                let start = match altitude_start {
                    Some(a) => a.value,
                    None => initial_altitude.ok_or_else(|| {
                        MissionError::config("climb has no start altitude and no predecessor")
                    })?,
                };
                vertical(start, altitude_end.value, air_speed.value, climb_rate.value)?
            }
            SegmentKind::Descent {
                altitude_start,
                altitude_end,
                air_speed,
                descent_rate,
            } => vertical(
                altitude_start.value,
                altitude_end.value,
                air_speed.value,
                -descent_rate.value,
            )?,
            SegmentKind::Loiter {
                altitude,
                air_speed,
                duration,
            } => {
                positive("air_speed", air_speed.value)?;
                level(altitude.value, air_speed.value, duration.value)
            }
            SegmentKind::Transition {
                altitude,
                speed_start,
                speed_end,
                acceleration,
            } => {
                positive("speed_start", speed_start.value)?;
                positive("speed_end", speed_end.value)?;
                let duration = (speed_end.value - speed_start.value) / acceleration.value;
                Profile {
                    duration,
                    altitude: altitude.value,
                    speed_start: speed_start.value,
                    speed_end: speed_end.value,
                    vertical_speed: 0.0,
                }
            }
        };
        positive("duration", profile.duration)?;
        Ok(profile)
    }

    /// Declare the kind's own unknowns and residuals on a fresh state.
    pub(crate) fn declare_variables(&self, segment: &mut Segment) -> MissionResult<()> {
        if !self.has_flight_dynamics() {
            return Ok(());
        }
        let n = segment.control_points();
        let state = segment.state_mut();
        state.declare_unknown("body_angle", Array::from_element(n, 1, 0.05))?;
        state.declare_residual("force_balance", Array::zeros(n, 2))?;
        Ok(())
    }

    /// The default process tree for this kind.
    pub fn build_process(&self) -> MissionResult<SegmentProcess> {
        let mut process = SegmentProcess::new();
        for phase in [
            "initialize",
            "iterate.unknowns",
            "iterate.conditions",
            "iterate.residuals",
            "post_process",
        ] {
            process.ensure_node(phase)?;
        }

        process.set_step("initialize.grid", |seg: &mut Segment| seg.build_grid())?;
        process.set_step("initialize.initials", seed_initials)?;
        let kind = self.clone();
        process.set_step("initialize.time", move |seg: &mut Segment| {
            set_time(seg, &kind)
        })?;
        let kind = self.clone();
        process.set_step("initialize.kinematics", move |seg: &mut Segment| {
            set_kinematics(seg, &kind)
        })?;

        if self.has_flight_dynamics() {
            process.set_step("iterate.unknowns.body_angle", unpack_body_angle)?;
            process.set_step("iterate.conditions.freestream", update_freestream)?;
            process.set_step("iterate.conditions.aerodynamics", update_aerodynamics)?;
        }
        process.ensure_node("iterate.conditions.propulsion")?;
        process.set_step("iterate.conditions.weights", integrate_mass)?;
        if self.has_flight_dynamics() {
            process.set_step("iterate.conditions.forces", sum_thrust)?;
            process.set_step("iterate.residuals.force_balance", force_balance)?;
        }

        process.set_step("post_process.diagnostics", record_diagnostics)?;

        if let SegmentKind::Transition { .. } = self {
            process.set_step("initialize.mass", constant_mass)?;
            process.skip("iterate.conditions.weights")?;
        }

        Ok(process)
    }
}

fn positive(what: &str, value: f64) -> MissionResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(MissionError::config(format!(
            "{what} must be finite and positive, got {value}"
        )))
    }
}

fn level(altitude: f64, speed: f64, duration: f64) -> Profile {
    Profile {
        duration,
        altitude,
        speed_start: speed,
        speed_end: speed,
        vertical_speed: 0.0,
    }
}

fn vertical(start: f64, end: f64, speed: f64, rate: f64) -> MissionResult<Profile> {
    positive("air_speed", speed)?;
    if rate == 0.0 || rate.abs() >= speed {
        return Err(MissionError::config(format!(
            "vertical rate {} must be nonzero and below air speed {speed}",
            rate.abs()
        )));
    }
    Ok(Profile {
        duration: (end - start) / rate,
        altitude: start,
        speed_start: speed,
        speed_end: speed,
        vertical_speed: rate,
    })
}

fn first(row: Vec<f64>) -> Option<f64> {
    row.first().copied()
}

fn initial_altitude(state: &State) -> MissionResult<Option<f64>> {
    match state.scalar("initial.altitude") {
        Ok(a) => Ok(Some(a)),
        Err(StateError::MissingField { .. }) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Copy time, position, mass and altitude out of the seed conditions.
fn seed_initials(seg: &mut Segment) -> MissionResult<()> {
    let t0 = seg
        .initial_value("frames.inertial.time")?
        .and_then(first)
        .unwrap_or(0.0);
    let p0 = match seg.initial_value("frames.inertial.position")? {
        Some(row) if row.len() == 3 => row,
        Some(row) => {
            return Err(MissionError::config(format!(
                "seed position has {} components, expected 3",
                row.len()
            )));
        }
        None => vec![0.0; 3],
    };
    let m0 = seg
        .initial_value("weights.total_mass")?
        .and_then(first)
        .ok_or_else(|| {
            MissionError::config(format!("segment '{}' has no initial mass", seg.name()))
        })?;
    let altitude = seg.initial_value("freestream.altitude")?.and_then(first);

    let state = seg.state_mut();
    state.set_scalar("initial.time", t0)?;
    state.set("initial.position", Array::from_row_slice(1, 3, &p0))?;
    state.set_scalar("initial.mass", m0)?;
    if let Some(a) = altitude {
        state.set_scalar("initial.altitude", a)?;
    }
    Ok(())
}

fn set_time(seg: &mut Segment, kind: &SegmentKind) -> MissionResult<()> {
    let profile = kind.profile(initial_altitude(seg.state())?)?;
    let t0 = seg.state().scalar("initial.time")?;
    let time = seg.grid()?.scaled_points(t0, profile.duration);

    let state = seg.state_mut();
    state.set_scalar("numerics.time.duration", profile.duration)?;
    state.set("frames.inertial.time", time)?;
    Ok(())
}

/// Velocity, position, altitude and path angle from the prescribed profile.
fn set_kinematics(seg: &mut Segment, kind: &SegmentKind) -> MissionResult<()> {
    let profile = kind.profile(initial_altitude(seg.state())?)?;
    let grid = seg.grid()?;
    let n = grid.len();
    let tau = grid.points();
    let p0 = seg.state().get("initial.position")?.clone();

    let mut velocity = Array::zeros(n, 3);
    if kind.has_flight_dynamics() {
        let vz = profile.vertical_speed;
        for i in 0..n {
            let speed = profile.speed_start + (profile.speed_end - profile.speed_start) * tau[i];
            velocity[(i, 0)] = (speed * speed - vz * vz).sqrt();
            velocity[(i, 2)] = vz;
        }
    }

    let displacement = grid.cumulative_integral(&velocity, profile.duration)?;
    let position = Array::from_fn(n, 3, |i, j| p0[(0, j)] + displacement[(i, j)]);

    if kind.has_flight_dynamics() {
        let acceleration = grid.derivative(&velocity, profile.duration)?;
        let speed = Array::from_fn(n, 1, |i, _| velocity.row(i).norm());
        let path_angle = Array::from_fn(n, 1, |i, _| velocity[(i, 2)].atan2(velocity[(i, 0)]));
        let path_acceleration = Array::from_fn(n, 1, |i, _| {
            velocity.row(i).dot(&acceleration.row(i)) / speed[(i, 0)]
        });
        let altitude = Array::from_fn(n, 1, |i, _| profile.altitude + displacement[(i, 2)]);

        let state = seg.state_mut();
        state.set("frames.inertial.acceleration", acceleration)?;
        state.set("frames.inertial.path_acceleration", path_acceleration)?;
        state.set("frames.inertial.flight_path_angle", path_angle)?;
        state.set("freestream.altitude", altitude)?;
        state.set("freestream.velocity", speed)?;
    }

    let state = seg.state_mut();
    state.set("frames.inertial.velocity", velocity)?;
    state.set("frames.inertial.position", position)?;
    Ok(())
}

fn unpack_body_angle(seg: &mut Segment) -> MissionResult<()> {
    let theta = seg.state().unknown("body_angle")?.clone();
    let alpha = &theta - seg.state().get("frames.inertial.flight_path_angle")?;

    let state = seg.state_mut();
    state.set("frames.body.inclination", theta)?;
    state.set("frames.body.angle_of_attack", alpha)?;
    Ok(())
}

fn update_freestream(seg: &mut Segment) -> MissionResult<()> {
    let analyses = seg.analyses_handle();
    let atmosphere = analyses.atmosphere()?;
    let altitude = seg.state().get("freestream.altitude")?;
    let speed = seg.state().get("freestream.velocity")?;
    let n = altitude.nrows();

    let mut temperature = Array::zeros(n, 1);
    let mut pressure = Array::zeros(n, 1);
    let mut density = Array::zeros(n, 1);
    let mut speed_of_sound = Array::zeros(n, 1);
    for i in 0..n {
        let sample = atmosphere.sample(altitude[(i, 0)])?;
        temperature[(i, 0)] = sample.temperature;
        pressure[(i, 0)] = sample.pressure;
        density[(i, 0)] = sample.density;
        speed_of_sound[(i, 0)] = sample.speed_of_sound;
    }
    let mach = speed.component_div(&speed_of_sound);
    let dynamic_pressure = density.zip_map(speed, |rho, v| 0.5 * rho * v * v);

    let state = seg.state_mut();
    state.set("freestream.temperature", temperature)?;
    state.set("freestream.pressure", pressure)?;
    state.set("freestream.density", density)?;
    state.set("freestream.speed_of_sound", speed_of_sound)?;
    state.set("freestream.mach_number", mach)?;
    state.set("freestream.dynamic_pressure", dynamic_pressure)?;
    Ok(())
}

fn update_aerodynamics(seg: &mut Segment) -> MissionResult<()> {
    let analyses = seg.analyses_handle();
    let aero = analyses.aerodynamics()?;
    let area = analyses.reference_area.value;
    let alpha = seg.state().get("frames.body.angle_of_attack")?;
    let mach = seg.state().get("freestream.mach_number")?;
    let q = seg.state().get("freestream.dynamic_pressure")?;
    let n = alpha.nrows();

    let mut cl = Array::zeros(n, 1);
    let mut cd = Array::zeros(n, 1);
    for i in 0..n {
        let c = aero.coefficients(alpha[(i, 0)], mach[(i, 0)]);
        cl[(i, 0)] = c.lift;
        cd[(i, 0)] = c.drag;
    }
    let lift = q.component_mul(&cl) * area;
    let drag = q.component_mul(&cd) * area;

    let state = seg.state_mut();
    state.set("aerodynamics.lift_coefficient", cl)?;
    state.set("aerodynamics.drag_coefficient", cd)?;
    state.set("forces.lift", lift)?;
    state.set("forces.drag", drag)?;
    Ok(())
}

/// Sum one N×1 leaf over every `propulsion.networks.<name>` branch.
pub(crate) fn sum_networks(state: &State, leaf: &str) -> MissionResult<Array> {
    let mut total = Array::zeros(state.control_points(), 1);
    let networks = match state.conditions().branch("propulsion.networks") {
        Ok(networks) => networks,
        Err(StateError::MissingField { .. }) => return Ok(total),
        Err(e) => return Err(e.into()),
    };
    for (_, node) in networks.iter() {
        if let ConditionNode::Branch(network) = node {
            if network.contains(leaf) {
                total += network.get(leaf)?;
            }
        }
    }
    Ok(total)
}

/// `m(t) = m0 - ∫ ṁ dt` over the segment.
fn integrate_mass(seg: &mut Segment) -> MissionResult<()> {
    let m0 = seg.state().scalar("initial.mass")?;
    let duration = seg.duration()?;
    let mass_rate = sum_networks(seg.state(), "mass_rate")?;
    let burned = seg.grid()?.cumulative_integral(&mass_rate, duration)?;
    let mass = burned.map(|b| m0 - b);
    seg.state_mut().set("weights.total_mass", mass)?;
    Ok(())
}

fn constant_mass(seg: &mut Segment) -> MissionResult<()> {
    let m0 = seg.state().scalar("initial.mass")?;
    let n = seg.control_points();
    seg.state_mut()
        .set("weights.total_mass", Array::from_element(n, 1, m0))?;
    Ok(())
}

fn sum_thrust(seg: &mut Segment) -> MissionResult<()> {
    let thrust = sum_networks(seg.state(), "thrust")?;
    seg.state_mut().set("forces.thrust", thrust)?;
    Ok(())
}

/// Along-path and normal force balance, normalized by weight.
fn force_balance(seg: &mut Segment) -> MissionResult<()> {
    let state = seg.state();
    let mass = state.get("weights.total_mass")?;
    let thrust = state.get("forces.thrust")?;
    let lift = state.get("forces.lift")?;
    let drag = state.get("forces.drag")?;
    let alpha = state.get("frames.body.angle_of_attack")?;
    let gamma = state.get("frames.inertial.flight_path_angle")?;
    let a_t = state.get("frames.inertial.path_acceleration")?;
    let n = mass.nrows();

    let mut residual = Array::zeros(n, 2);
    for i in 0..n {
        let m = mass[(i, 0)];
        let w = m * G0_MPS2;
        let (t, a, g) = (thrust[(i, 0)], alpha[(i, 0)], gamma[(i, 0)]);
        residual[(i, 0)] = (t * a.cos() - drag[(i, 0)] - w * g.sin() - m * a_t[(i, 0)]) / w;
        residual[(i, 1)] = (t * a.sin() + lift[(i, 0)] - w * g.cos()) / w;
    }
    seg.state_mut().set_residual("force_balance", residual)?;
    Ok(())
}

fn record_diagnostics(seg: &mut Segment) -> MissionResult<()> {
    let residuals: DVector<f64> = seg.state().flatten_residuals();
    let norm = inf_norm(residuals.as_slice());
    seg.state_mut().set_scalar("numerics.residual_norm", norm)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sf_core::units::{m, mps, mps2, s};

    #[test]
    fn cruise_duration_is_distance_over_speed() {
        let kind = SegmentKind::Cruise {
            altitude: m(1000.0),
            air_speed: mps(50.0),
            distance: m(10_000.0),
        };
        let profile = kind.profile(None).unwrap();
        assert!((profile.duration - 200.0).abs() < 1e-12);
        assert_eq!(profile.vertical_speed, 0.0);
    }

    #[test]
    fn climb_start_altitude_falls_back_to_seed() {
        let kind = SegmentKind::Climb {
            altitude_start: None,
            altitude_end: m(2000.0),
            air_speed: mps(60.0),
            climb_rate: mps(5.0),
        };
        assert!(kind.profile(None).is_err());
        let profile = kind.profile(Some(1000.0)).unwrap();
        assert!((profile.duration - 200.0).abs() < 1e-12);
        assert_eq!(profile.altitude, 1000.0);
    }

    #[test]
    fn descent_must_go_down() {
        let kind = SegmentKind::Descent {
            altitude_start: m(1000.0),
            altitude_end: m(2000.0),
            air_speed: mps(60.0),
            descent_rate: mps(5.0),
        };
        assert!(matches!(
            kind.profile(None),
            Err(MissionError::Configuration { .. })
        ));
    }

    #[test]
    fn transition_duration_from_acceleration() {
        let kind = SegmentKind::Transition {
            altitude: m(500.0),
            speed_start: mps(40.0),
            speed_end: mps(50.0),
            acceleration: mps2(0.5),
        };
        assert!((kind.profile(None).unwrap().duration - 20.0).abs() < 1e-12);
    }

    #[test]
    fn transition_skips_mass_integration() {
        let kind = SegmentKind::Transition {
            altitude: m(500.0),
            speed_start: mps(40.0),
            speed_end: mps(50.0),
            acceleration: mps2(0.5),
        };
        let process = kind.build_process().unwrap();
        let paths = process.step_paths();
        assert!(!paths.iter().any(|p| p == "iterate.conditions.weights"));
        assert!(paths.iter().any(|p| p == "initialize.mass"));
    }

    #[test]
    fn generic_has_no_flight_dynamics_steps() {
        let kind = SegmentKind::Generic { duration: s(60.0) };
        let paths = kind.build_process().unwrap().step_paths();
        assert_eq!(
            paths,
            vec![
                "initialize.grid",
                "initialize.initials",
                "initialize.time",
                "initialize.kinematics",
                "iterate.conditions.weights",
                "post_process.diagnostics",
            ]
        );
    }

    #[test]
    fn flight_kinds_order_conditions() {
        let kind = SegmentKind::Loiter {
            altitude: m(1000.0),
            air_speed: mps(50.0),
            duration: s(600.0),
        };
        let process = kind.build_process().unwrap();
        let names: Vec<&str> = process.node("iterate.conditions").unwrap().names().collect();
        assert_eq!(
            names,
            vec!["freestream", "aerodynamics", "propulsion", "weights", "forces"]
        );
    }
}
