use sf_mission::MissionError;
use sf_project::ProjectError;
use sf_results::ResultsError;

pub type CliResult<T> = Result<T, CliError>;

#[derive(thiserror::Error, Debug)]
pub enum CliError {
    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("Mission error: {0}")]
    Mission(#[from] MissionError),

    #[error("Results error: {0}")]
    Results(#[from] ResultsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
