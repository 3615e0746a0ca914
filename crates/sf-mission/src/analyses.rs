//! Analyses shared by every segment of a mission.
//!
//! Atmosphere and aerodynamic models are consumed through small traits so a
//! vehicle can plug in anything from a table lookup to a full build-up. Two
//! reference models are provided: [`IsaTroposphere`] and
//! [`ParabolicDragPolar`].

use std::fmt;
use std::sync::Arc;

use sf_core::units::{Area, m2};

use crate::contributor::Contributor;
use crate::error::{MissionError, MissionResult};

/// Gas constant for dry air, J/(kg·K)
pub const R_AIR: f64 = 287.05287;
/// Ratio of specific heats for air
pub const GAMMA_AIR: f64 = 1.4;
/// Sea-level standard density, kg/m³
pub const RHO_SEA_LEVEL: f64 = 1.225;

/// Atmospheric properties at a single altitude (SI).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AtmosphereSample {
    pub temperature: f64,
    pub pressure: f64,
    pub density: f64,
    pub speed_of_sound: f64,
}

pub trait Atmosphere: fmt::Debug + Send + Sync {
    /// Properties at geometric altitude `altitude` (m).
    fn sample(&self, altitude: f64) -> MissionResult<AtmosphereSample>;
}

/// Lift and drag coefficients at one flight condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AeroCoefficients {
    pub lift: f64,
    pub drag: f64,
}

pub trait Aerodynamics: fmt::Debug + Send + Sync {
    /// Coefficients at angle of attack `alpha` (rad) and Mach number `mach`.
    fn coefficients(&self, alpha: f64, mach: f64) -> AeroCoefficients;
}

/// International Standard Atmosphere, troposphere plus the isothermal layer
/// up to 20 km.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsaTroposphere {
    /// Temperature offset from standard, K
    pub delta_temperature: f64,
}

impl IsaTroposphere {
    const T0: f64 = 288.15;
    const P0: f64 = 101_325.0;
    const LAPSE: f64 = 0.0065;
    const TROPOPAUSE: f64 = 11_000.0;
    const CEILING: f64 = 20_000.0;
    const FLOOR: f64 = -1_000.0;
}

impl Atmosphere for IsaTroposphere {
    fn sample(&self, altitude: f64) -> MissionResult<AtmosphereSample> {
        if !altitude.is_finite() || !(Self::FLOOR..=Self::CEILING).contains(&altitude) {
            return Err(MissionError::config(format!(
                "altitude {altitude} m outside ISA model range [{}, {}]",
                Self::FLOOR,
                Self::CEILING
            )));
        }

        let exponent = sf_core::constants::G0_MPS2 / (Self::LAPSE * R_AIR);
        let (t_std, pressure) = if altitude <= Self::TROPOPAUSE {
            let t = Self::T0 - Self::LAPSE * altitude;
            (t, Self::P0 * (t / Self::T0).powf(exponent))
        } else {
            let t11 = Self::T0 - Self::LAPSE * Self::TROPOPAUSE;
            let p11 = Self::P0 * (t11 / Self::T0).powf(exponent);
            let p = p11
                * (-sf_core::constants::G0_MPS2 * (altitude - Self::TROPOPAUSE) / (R_AIR * t11))
                    .exp();
            (t11, p)
        };

        let temperature = t_std + self.delta_temperature;
        let density = pressure / (R_AIR * temperature);
        Ok(AtmosphereSample {
            temperature,
            pressure,
            density,
            speed_of_sound: (GAMMA_AIR * R_AIR * temperature).sqrt(),
        })
    }
}

/// Linear lift curve with a parabolic drag polar: `CD = CD0 + k·CL²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParabolicDragPolar {
    pub cl0: f64,
    /// Lift curve slope, per radian
    pub cl_alpha: f64,
    pub cd0: f64,
    /// Induced drag factor
    pub k: f64,
}

impl Aerodynamics for ParabolicDragPolar {
    fn coefficients(&self, alpha: f64, _mach: f64) -> AeroCoefficients {
        let lift = self.cl0 + self.cl_alpha * alpha;
        AeroCoefficients {
            lift,
            drag: self.cd0 + self.k * lift * lift,
        }
    }
}

/// Everything a segment may consult besides its own state.
///
/// Built once per mission and shared read-only between segments.
#[derive(Debug, Clone)]
pub struct Analyses {
    pub atmosphere: Option<Arc<dyn Atmosphere>>,
    pub aerodynamics: Option<Arc<dyn Aerodynamics>>,
    /// Propulsion networks; registered before the other contributors.
    pub networks: Vec<Arc<dyn Contributor>>,
    pub contributors: Vec<Arc<dyn Contributor>>,
    pub reference_area: Area,
}

impl Analyses {
    pub fn new(reference_area: Area) -> Self {
        Self {
            atmosphere: None,
            aerodynamics: None,
            networks: Vec::new(),
            contributors: Vec::new(),
            reference_area,
        }
    }

    pub fn with_atmosphere(mut self, atmosphere: impl Atmosphere + 'static) -> Self {
        self.atmosphere = Some(Arc::new(atmosphere));
        self
    }

    pub fn with_aerodynamics(mut self, aerodynamics: impl Aerodynamics + 'static) -> Self {
        self.aerodynamics = Some(Arc::new(aerodynamics));
        self
    }

    pub fn with_network(mut self, network: impl Contributor + 'static) -> Self {
        self.networks.push(Arc::new(network));
        self
    }

    pub fn with_contributor(mut self, contributor: impl Contributor + 'static) -> Self {
        self.contributors.push(Arc::new(contributor));
        self
    }

    /// Networks then contributors, in registration order.
    pub fn all_contributors(&self) -> impl Iterator<Item = &Arc<dyn Contributor>> {
        self.networks.iter().chain(self.contributors.iter())
    }

    pub fn atmosphere(&self) -> MissionResult<&dyn Atmosphere> {
        self.atmosphere
            .as_deref()
            .ok_or_else(|| MissionError::config("no atmosphere model in analyses"))
    }

    pub fn aerodynamics(&self) -> MissionResult<&dyn Aerodynamics> {
        self.aerodynamics
            .as_deref()
            .ok_or_else(|| MissionError::config("no aerodynamics model in analyses"))
    }
}

impl Default for Analyses {
    fn default() -> Self {
        Self::new(m2(1.0))
    }
}
