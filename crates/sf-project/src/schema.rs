//! Mission file schema definitions.
//!
//! Quantities are plain SI numbers; the unit is part of each field name.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MissionDef {
    pub version: u32,
    pub name: String,
    pub vehicle: VehicleDef,
    pub initial: InitialDef,
    /// Defaults applied to every segment without its own numerics.
    #[serde(default)]
    pub numerics: NumericsDef,
    #[serde(default)]
    pub failure_policy: FailurePolicyDef,
    pub segments: Vec<SegmentDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleDef {
    pub reference_area_m2: f64,
    #[serde(default)]
    pub atmosphere: AtmosphereDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aerodynamics: Option<AerodynamicsDef>,
    #[serde(default)]
    pub networks: Vec<NetworkDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AtmosphereDef {
    Isa {
        #[serde(default)]
        delta_temperature_k: f64,
    },
}

impl Default for AtmosphereDef {
    fn default() -> Self {
        AtmosphereDef::Isa {
            delta_temperature_k: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AerodynamicsDef {
    ParabolicPolar {
        cl0: f64,
        cl_alpha_per_rad: f64,
        cd0: f64,
        k: f64,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NetworkDef {
    pub name: String,
    pub max_thrust_n: f64,
    pub source: EnergySourceDef,
    #[serde(default = "default_throttle")]
    pub initial_throttle: f64,
}

fn default_throttle() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnergySourceDef {
    Fuel { tsfc_kg_per_n_s: f64 },
    Battery { capacity_j: f64, efficiency: f64 },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InitialDef {
    pub mass_kg: f64,
    #[serde(default)]
    pub time_s: f64,
    /// Inertial x, y and altitude.
    #[serde(default)]
    pub position_m: [f64; 3],
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GridDef {
    Linspace,
    #[default]
    Chebyshev,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethodDef {
    #[default]
    Newton,
    Broyden,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SolverDef {
    #[serde(default)]
    pub method: SolverMethodDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_iterations: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NumericsDef {
    #[serde(default = "default_control_points")]
    pub control_points: usize,
    #[serde(default)]
    pub grid: GridDef,
    #[serde(default)]
    pub solver: SolverDef,
    /// Post-process steps allowed to run on a failed segment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failed_post_process: Vec<String>,
}

fn default_control_points() -> usize {
    16
}

impl Default for NumericsDef {
    fn default() -> Self {
        Self {
            control_points: default_control_points(),
            grid: GridDef::default(),
            solver: SolverDef::default(),
            failed_post_process: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicyDef {
    #[default]
    Abort,
    ContinueBestEffort,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentDef {
    pub name: String,
    pub kind: SegmentKindDef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numerics: Option<NumericsDef>,
}

impl SegmentDef {
    /// This segment's numerics, falling back to the mission defaults.
    pub fn numerics_or<'a>(&'a self, defaults: &'a NumericsDef) -> &'a NumericsDef {
        self.numerics.as_ref().unwrap_or(defaults)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SegmentKindDef {
    Generic {
        duration_s: f64,
    },
    Cruise {
        altitude_m: f64,
        air_speed_mps: f64,
        distance_m: f64,
    },
    Climb {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        altitude_start_m: Option<f64>,
        altitude_end_m: f64,
        air_speed_mps: f64,
        climb_rate_mps: f64,
    },
    Descent {
        altitude_start_m: f64,
        altitude_end_m: f64,
        air_speed_mps: f64,
        descent_rate_mps: f64,
    },
    Loiter {
        altitude_m: f64,
        air_speed_mps: f64,
        duration_s: f64,
    },
    Transition {
        altitude_m: f64,
        speed_start_mps: f64,
        speed_end_mps: f64,
        acceleration_mps2: f64,
    },
}

impl SegmentKindDef {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKindDef::Generic { .. } => "generic",
            SegmentKindDef::Cruise { .. } => "cruise",
            SegmentKindDef::Climb { .. } => "climb",
            SegmentKindDef::Descent { .. } => "descent",
            SegmentKindDef::Loiter { .. } => "loiter",
            SegmentKindDef::Transition { .. } => "transition",
        }
    }

    pub fn has_flight_dynamics(&self) -> bool {
        !matches!(self, SegmentKindDef::Generic { .. })
    }
}
