//! sf-project: mission definition file format and validation.

pub mod schema;
pub mod validate;

pub use schema::*;
pub use validate::{ValidationError, validate_mission};

/// Current mission file format version.
pub const LATEST_VERSION: u32 = 1;

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn parse_yaml(content: &str) -> ProjectResult<MissionDef> {
    let mission: MissionDef = serde_yaml::from_str(content)?;
    validate_mission(&mission)?;
    Ok(mission)
}

pub fn load_yaml(path: &std::path::Path) -> ProjectResult<MissionDef> {
    let content = std::fs::read_to_string(path)?;
    parse_yaml(&content)
}

pub fn save_yaml(path: &std::path::Path, mission: &MissionDef) -> ProjectResult<()> {
    validate_mission(mission)?;
    let content = serde_yaml::to_string(mission)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &std::path::Path) -> ProjectResult<MissionDef> {
    let content = std::fs::read_to_string(path)?;
    let mission: MissionDef = serde_json::from_str(&content)?;
    validate_mission(&mission)?;
    Ok(mission)
}

pub fn save_json(path: &std::path::Path, mission: &MissionDef) -> ProjectResult<()> {
    validate_mission(mission)?;
    let content = serde_json::to_string_pretty(mission)?;
    std::fs::write(path, content)?;
    Ok(())
}
