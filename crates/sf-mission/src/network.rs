//! A throttle-controlled propulsion network.

use sf_core::units::{Energy, Force};
use sf_state::{Array, StateError};
use tracing::warn;

use crate::analyses::RHO_SEA_LEVEL;
use crate::contributor::Contributor;
use crate::error::{MissionError, MissionResult};
use crate::segment::{Segment, SegmentProcess};

/// Where a network draws its energy from.
#[derive(Debug, Clone, PartialEq)]
pub enum EnergySource {
    /// Burns fuel at `tsfc` kg per newton-second of thrust.
    Fuel { tsfc: f64 },
    /// Drains a battery; shaft power is `T·V / efficiency`.
    Battery { capacity: Energy, efficiency: f64 },
}

/// Thrust proportional to throttle, lapsed with density ratio.
///
/// Declares one unknown, `throttle.<name>`, and writes
/// `propulsion.networks.<name>.{throttle, thrust, mass_rate}`. Battery
/// networks also track `energy.<name>.{power, energy}`.
///
/// Its process steps sit under a `networks` node in each phase so a network
/// name can never replace a built-in step.
#[derive(Debug, Clone)]
pub struct ThrottleNetwork {
    name: String,
    max_thrust: Force,
    source: EnergySource,
    initial_throttle: f64,
}

impl ThrottleNetwork {
    pub fn fuel(name: impl Into<String>, max_thrust: Force, tsfc: f64) -> Self {
        Self {
            name: name.into(),
            max_thrust,
            source: EnergySource::Fuel { tsfc },
            initial_throttle: 0.5,
        }
    }

    pub fn battery(
        name: impl Into<String>,
        max_thrust: Force,
        capacity: Energy,
        efficiency: f64,
    ) -> Self {
        Self {
            name: name.into(),
            max_thrust,
            source: EnergySource::Battery {
                capacity,
                efficiency,
            },
            initial_throttle: 0.5,
        }
    }

    pub fn with_initial_throttle(mut self, throttle: f64) -> Self {
        self.initial_throttle = throttle;
        self
    }

    pub fn source(&self) -> &EnergySource {
        &self.source
    }

    pub fn unknown_name(&self) -> String {
        format!("throttle.{}", self.name)
    }

    fn validate(&self) -> MissionResult<()> {
        if self.name.is_empty() || self.name.contains('.') {
            return Err(MissionError::config(format!(
                "network name '{}' must be non-empty and contain no '.'",
                self.name
            )));
        }
        if !(self.max_thrust.value.is_finite() && self.max_thrust.value > 0.0) {
            return Err(MissionError::config(format!(
                "network '{}' max thrust must be positive",
                self.name
            )));
        }
        match self.source {
            EnergySource::Fuel { tsfc } if !(tsfc.is_finite() && tsfc >= 0.0) => Err(
                MissionError::config(format!("network '{}' tsfc must be >= 0", self.name)),
            ),
            EnergySource::Battery { efficiency, .. }
                if !(efficiency > 0.0 && efficiency <= 1.0) =>
            {
                Err(MissionError::config(format!(
                    "network '{}' efficiency must lie in (0, 1]",
                    self.name
                )))
            }
            _ => Ok(()),
        }
    }

    fn seed_energy(&self, seg: &mut Segment) -> MissionResult<()> {
        let EnergySource::Battery { capacity, .. } = &self.source else {
            return Ok(());
        };
        let e0 = seg
            .initial_value(&format!("energy.{}.energy", self.name))?
            .and_then(|row| row.first().copied())
            .unwrap_or(capacity.value);
        seg.state_mut()
            .set_scalar(&format!("initial.energy.{}", self.name), e0)?;
        Ok(())
    }

    fn evaluate(&self, seg: &mut Segment) -> MissionResult<()> {
        let throttle = seg.state().unknown(&self.unknown_name())?.clone();
        let n = throttle.nrows();

        let sigma = match seg.state().get("freestream.density") {
            Ok(rho) => rho / RHO_SEA_LEVEL,
            Err(StateError::MissingField { .. }) => Array::from_element(n, 1, 1.0),
            Err(e) => return Err(e.into()),
        };
        let thrust = throttle.component_mul(&sigma) * self.max_thrust.value;

        let mass_rate = match &self.source {
            EnergySource::Fuel { tsfc } => &thrust * *tsfc,
            EnergySource::Battery { efficiency, .. } => {
                let speed = seg.state().get("freestream.velocity")?;
                let power = thrust.component_mul(speed) / *efficiency;
                let e0 = seg
                    .state()
                    .scalar(&format!("initial.energy.{}", self.name))?;
                let used = seg.grid()?.cumulative_integral(&power, seg.duration()?)?;
                let energy = used.map(|u| e0 - u);

                let state = seg.state_mut();
                state.set(&format!("energy.{}.power", self.name), power)?;
                state.set(&format!("energy.{}.energy", self.name), energy)?;
                Array::zeros(n, 1)
            }
        };

        let base = format!("propulsion.networks.{}", self.name);
        let state = seg.state_mut();
        state.set(&format!("{base}.throttle"), throttle)?;
        state.set(&format!("{base}.thrust"), thrust)?;
        state.set(&format!("{base}.mass_rate"), mass_rate)?;
        Ok(())
    }

    fn check_limits(&self, seg: &mut Segment) -> MissionResult<()> {
        let throttle = seg.state().unknown(&self.unknown_name())?;
        let (lo, hi) = (throttle.min(), throttle.max());
        if lo < 0.0 || hi > 1.0 {
            warn!(
                segment = seg.name(),
                network = self.name.as_str(),
                min = lo,
                max = hi,
                "throttle outside [0, 1]"
            );
        }
        if let Ok(energy) = seg.state().get(&format!("energy.{}.energy", self.name)) {
            if energy.min() < 0.0 {
                warn!(
                    segment = seg.name(),
                    network = self.name.as_str(),
                    "battery depleted"
                );
            }
        }
        Ok(())
    }
}

impl Contributor for ThrottleNetwork {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&self, segment: &mut Segment, process: &mut SegmentProcess) -> MissionResult<()> {
        self.validate()?;
        let n = segment.control_points();
        segment
            .state_mut()
            .declare_unknown(&self.unknown_name(), Array::from_element(n, 1, self.initial_throttle))?;

        if matches!(self.source, EnergySource::Battery { .. }) {
            let network = self.clone();
            process.set_step(
                &format!("initialize.networks.{}", self.name),
                move |seg: &mut Segment| network.seed_energy(seg),
            )?;
        }
        let network = self.clone();
        process.set_step(
            &format!("iterate.conditions.propulsion.{}", self.name),
            move |seg: &mut Segment| network.evaluate(seg),
        )?;
        let network = self.clone();
        process.set_step(
            &format!("post_process.networks.{}", self.name),
            move |seg: &mut Segment| network.check_limits(seg),
        )?;
        Ok(())
    }
}
