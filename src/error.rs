use thiserror::Error;

use crate::team::TeamId;

/// Problems with caller-supplied data, detected before any simulation runs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("invalid statistics for {team}: {reason}")]
    InvalidStatistics { team: String, reason: String },

    #[error("no statistics for team {0}")]
    UnknownTeam(TeamId),

    #[error("team {0} is seeded more than once")]
    DuplicateTeam(TeamId),

    #[error("{format} needs {expected} teams, got {actual}")]
    BracketSize {
        format: &'static str,
        expected: String,
        actual: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("roster for {0} has no players")]
    EmptyRoster(String),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error("game between {team1} and {team2} still tied after {replays} replays")]
    UnresolvedTie {
        team1: TeamId,
        team2: TeamId,
        replays: u32,
    },

    #[error("bracket state inconsistency: {0}")]
    Inconsistent(String),
}

impl SimError {
    /// True when the error was caused by bad input rather than a logic defect.
    pub fn is_input(&self) -> bool {
        matches!(self, SimError::Input(_))
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(feature = "python")]
impl From<SimError> for pyo3::PyErr {
    fn from(err: SimError) -> Self {
        if err.is_input() {
            pyo3::exceptions::PyValueError::new_err(err.to_string())
        } else {
            pyo3::exceptions::PyRuntimeError::new_err(err.to_string())
        }
    }
}
