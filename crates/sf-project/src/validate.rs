//! Mission definition validation.

use crate::schema::{
    AerodynamicsDef, EnergySourceDef, MissionDef, NetworkDef, NumericsDef, SegmentDef,
    SegmentKindDef,
};
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported version: {version}")]
    UnsupportedVersion { version: u32 },
}

/// Post-process steps every segment installs. Network checks are addressed
/// as `networks` or `networks.<name>`.
const BUILTIN_POST_PROCESS: &[&str] = &["diagnostics"];

pub fn validate_mission(mission: &MissionDef) -> Result<(), ValidationError> {
    if mission.version > crate::LATEST_VERSION {
        return Err(ValidationError::UnsupportedVersion {
            version: mission.version,
        });
    }
    if mission.name.trim().is_empty() {
        return Err(invalid("name", "", "must not be empty"));
    }

    positive("vehicle.reference_area_m2", mission.vehicle.reference_area_m2)?;
    positive("initial.mass_kg", mission.initial.mass_kg)?;
    finite("initial.time_s", mission.initial.time_s)?;
    for (i, p) in mission.initial.position_m.iter().enumerate() {
        finite(&format!("initial.position_m[{i}]"), *p)?;
    }

    if let Some(AerodynamicsDef::ParabolicPolar {
        cl0,
        cl_alpha_per_rad,
        cd0,
        k,
    }) = &mission.vehicle.aerodynamics
    {
        finite("aerodynamics.cl0", *cl0)?;
        finite("aerodynamics.cl_alpha_per_rad", *cl_alpha_per_rad)?;
        non_negative("aerodynamics.cd0", *cd0)?;
        non_negative("aerodynamics.k", *k)?;
    }

    let mut network_names = HashSet::new();
    for network in &mission.vehicle.networks {
        if !network_names.insert(network.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: network.name.clone(),
                context: "vehicle.networks".to_string(),
            });
        }
        validate_network(network)?;
    }

    validate_numerics("numerics", &mission.numerics, &network_names)?;

    if mission.segments.is_empty() {
        return Err(invalid("segments", "[]", "mission needs at least one segment"));
    }
    let mut segment_names = HashSet::new();
    for segment in &mission.segments {
        if !segment_names.insert(segment.name.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: segment.name.clone(),
                context: "segments".to_string(),
            });
        }
        validate_segment(mission, segment, &network_names)?;
    }

    Ok(())
}

fn validate_network(network: &NetworkDef) -> Result<(), ValidationError> {
    let field = |f: &str| format!("networks.{}.{f}", network.name);
    if network.name.is_empty() || network.name.contains('.') {
        return Err(invalid(
            "networks.name",
            &network.name,
            "must be non-empty and contain no '.'",
        ));
    }
    positive(&field("max_thrust_n"), network.max_thrust_n)?;
    finite(&field("initial_throttle"), network.initial_throttle)?;
    match network.source {
        EnergySourceDef::Fuel { tsfc_kg_per_n_s } => {
            non_negative(&field("tsfc_kg_per_n_s"), tsfc_kg_per_n_s)?;
        }
        EnergySourceDef::Battery {
            capacity_j,
            efficiency,
        } => {
            positive(&field("capacity_j"), capacity_j)?;
            if !(efficiency > 0.0 && efficiency <= 1.0) {
                return Err(invalid(
                    &field("efficiency"),
                    &efficiency.to_string(),
                    "must lie in (0, 1]",
                ));
            }
        }
    }
    Ok(())
}

fn validate_numerics(
    context: &str,
    numerics: &NumericsDef,
    networks: &HashSet<&str>,
) -> Result<(), ValidationError> {
    if numerics.control_points < 2 {
        return Err(invalid(
            &format!("{context}.control_points"),
            &numerics.control_points.to_string(),
            "must be at least 2",
        ));
    }
    if let Some(max) = numerics.solver.max_iterations {
        if max == 0 {
            return Err(invalid(
                &format!("{context}.solver.max_iterations"),
                "0",
                "must be positive",
            ));
        }
    }
    if let Some(tol) = numerics.solver.tolerance {
        positive(&format!("{context}.solver.tolerance"), tol)?;
    }
    for step in &numerics.failed_post_process {
        let known = BUILTIN_POST_PROCESS.contains(&step.as_str())
            || (step == "networks" && !networks.is_empty())
            || step
                .strip_prefix("networks.")
                .is_some_and(|name| networks.contains(name));
        if !known {
            return Err(ValidationError::MissingReference {
                id: step.clone(),
                context: format!("{context}.failed_post_process"),
            });
        }
    }
    Ok(())
}

/// Segment names end up in result file names.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn validate_segment(
    mission: &MissionDef,
    segment: &SegmentDef,
    networks: &HashSet<&str>,
) -> Result<(), ValidationError> {
    let field = |f: &str| format!("segments.{}.{f}", segment.name);
    if segment.name.is_empty() || !segment.name.chars().all(is_name_char) {
        return Err(invalid(
            "segments.name",
            &segment.name,
            "must be non-empty and use only ASCII letters, digits, '_' or '-'",
        ));
    }
    if let Some(numerics) = &segment.numerics {
        validate_numerics(&field("numerics"), numerics, networks)?;
    }
    if segment.kind.has_flight_dynamics() && mission.vehicle.aerodynamics.is_none() {
        return Err(ValidationError::MissingReference {
            id: "vehicle.aerodynamics".to_string(),
            context: format!("{} segment '{}'", segment.kind.as_str(), segment.name),
        });
    }

    match &segment.kind {
        SegmentKindDef::Generic { duration_s } => positive(&field("duration_s"), *duration_s)?,
        SegmentKindDef::Cruise {
            altitude_m,
            air_speed_mps,
            distance_m,
        } => {
            finite(&field("altitude_m"), *altitude_m)?;
            positive(&field("air_speed_mps"), *air_speed_mps)?;
            positive(&field("distance_m"), *distance_m)?;
        }
        SegmentKindDef::Climb {
            altitude_start_m,
            altitude_end_m,
            air_speed_mps,
            climb_rate_mps,
        } => {
            positive(&field("air_speed_mps"), *air_speed_mps)?;
            positive(&field("climb_rate_mps"), *climb_rate_mps)?;
            below_speed(&field("climb_rate_mps"), *climb_rate_mps, *air_speed_mps)?;
            if let Some(start) = altitude_start_m {
                ordered(&field("altitude_end_m"), *start, *altitude_end_m, "must exceed start")?;
            }
        }
        SegmentKindDef::Descent {
            altitude_start_m,
            altitude_end_m,
            air_speed_mps,
            descent_rate_mps,
        } => {
            positive(&field("air_speed_mps"), *air_speed_mps)?;
            positive(&field("descent_rate_mps"), *descent_rate_mps)?;
            below_speed(&field("descent_rate_mps"), *descent_rate_mps, *air_speed_mps)?;
            ordered(
                &field("altitude_start_m"),
                *altitude_end_m,
                *altitude_start_m,
                "must exceed end",
            )?;
        }
        SegmentKindDef::Loiter {
            altitude_m,
            air_speed_mps,
            duration_s,
        } => {
            finite(&field("altitude_m"), *altitude_m)?;
            positive(&field("air_speed_mps"), *air_speed_mps)?;
            positive(&field("duration_s"), *duration_s)?;
        }
        SegmentKindDef::Transition {
            altitude_m,
            speed_start_mps,
            speed_end_mps,
            acceleration_mps2,
        } => {
            finite(&field("altitude_m"), *altitude_m)?;
            positive(&field("speed_start_mps"), *speed_start_mps)?;
            positive(&field("speed_end_mps"), *speed_end_mps)?;
            finite(&field("acceleration_mps2"), *acceleration_mps2)?;
            let dv = speed_end_mps - speed_start_mps;
            if *acceleration_mps2 == 0.0 || dv / acceleration_mps2 <= 0.0 {
                return Err(invalid(
                    &field("acceleration_mps2"),
                    &acceleration_mps2.to_string(),
                    "must be non-zero and carry the start speed towards the end speed",
                ));
            }
        }
    }
    Ok(())
}

fn invalid(field: &str, value: &str, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn finite(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, &value.to_string(), "must be finite"))
    }
}

fn positive(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &value.to_string(), "must be positive"))
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, &value.to_string(), "must be non-negative"))
    }
}

fn below_speed(field: &str, rate: f64, speed: f64) -> Result<(), ValidationError> {
    if rate < speed {
        Ok(())
    } else {
        Err(invalid(field, &rate.to_string(), "must be below air speed"))
    }
}

fn ordered(field: &str, low: f64, high: f64, reason: &str) -> Result<(), ValidationError> {
    if low.is_finite() && high.is_finite() && high > low {
        Ok(())
    } else {
        Err(invalid(field, &high.to_string(), reason))
    }
}
