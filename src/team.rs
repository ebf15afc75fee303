use std::collections::HashMap;
use std::fmt;

use crate::error::{InputError, Result};

/// Opaque team identifier. Teams are compared by id, never by reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(String);

impl TeamId {
    pub fn new(name: impl Into<String>) -> Self {
        TeamId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TeamId {
    fn from(name: &str) -> Self {
        TeamId(name.to_string())
    }
}

impl From<String> for TeamId {
    fn from(name: String) -> Self {
        TeamId(name)
    }
}

/// Statistics for every team taking part in a run.
pub type TeamStatsMap = HashMap<TeamId, TeamStatistics>;

/// Per-game team averages used by the scoring model and the ranking.
///
/// Built once through [`TeamStatistics::new`] or
/// [`TeamStatistics::from_players`]; the fields are read-only afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamStatistics {
    goals: f64,
    assists: f64,
    saves: f64,
    shots: f64,
    /// Higher values widen the random variation applied to scores
    uncertainty: f64,
    players: u32,
}

impl TeamStatistics {
    /// Validate and build a statistics record.
    ///
    /// Every value must be finite and non-negative, shots must be positive and
    /// goals may not exceed shots.
    pub fn new(
        goals: f64,
        assists: f64,
        saves: f64,
        shots: f64,
        uncertainty: f64,
        players: u32,
    ) -> Result<Self> {
        let invalid = |reason: String| InputError::InvalidStatistics {
            team: "<unnamed>".to_string(),
            reason,
        };

        for (field, value) in [
            ("goals", goals),
            ("assists", assists),
            ("saves", saves),
            ("shots", shots),
            ("uncertainty", uncertainty),
        ] {
            if !value.is_finite() || value < 0.0 {
                let reason = format!("{} must be finite and non-negative, got {}", field, value);
                return Err(invalid(reason).into());
            }
        }
        if shots == 0.0 {
            return Err(invalid("shots per game must be greater than zero".to_string()).into());
        }
        if goals > shots {
            return Err(invalid(format!("goals ({}) exceed shots ({})", goals, shots)).into());
        }
        if players == 0 {
            return Err(invalid("player count must be at least one".to_string()).into());
        }

        Ok(TeamStatistics {
            goals,
            assists,
            saves,
            shots,
            uncertainty,
            players,
        })
    }

    /// Aggregate a roster into team statistics.
    ///
    /// Per-game counts are summed across players; uncertainty is the roster
    /// mean.
    pub fn from_players(team: &str, players: &[PlayerStatistics]) -> Result<Self> {
        if players.is_empty() {
            return Err(InputError::EmptyRoster(team.to_string()).into());
        }

        let goals = players.iter().map(|p| p.goals).sum();
        let assists = players.iter().map(|p| p.assists).sum();
        let saves = players.iter().map(|p| p.saves).sum();
        let shots = players.iter().map(|p| p.shots).sum();
        let uncertainty =
            players.iter().map(|p| p.uncertainty).sum::<f64>() / players.len() as f64;

        Self::new(goals, assists, saves, shots, uncertainty, players.len() as u32).map_err(|e| {
            match e {
                crate::SimError::Input(InputError::InvalidStatistics { reason, .. }) => {
                    InputError::InvalidStatistics {
                        team: team.to_string(),
                        reason,
                    }
                    .into()
                }
                other => other,
            }
        })
    }

    pub fn goals(&self) -> f64 {
        self.goals
    }

    pub fn assists(&self) -> f64 {
        self.assists
    }

    pub fn saves(&self) -> f64 {
        self.saves
    }

    pub fn shots(&self) -> f64 {
        self.shots
    }

    pub fn uncertainty(&self) -> f64 {
        self.uncertainty
    }

    pub fn players(&self) -> u32 {
        self.players
    }

    /// Goals per shot. Always in [0, 1] for a validated record.
    pub fn shooting_percentage(&self) -> f64 {
        self.goals / self.shots
    }
}

/// One player's per-game line, as read from the roster sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct PlayerStatistics {
    pub name: String,
    pub goals: f64,
    pub assists: f64,
    pub saves: f64,
    pub shots: f64,
    pub uncertainty: f64,
}

/// Check that every seeded team has statistics and appears only once.
pub fn check_seeds(seeds: &[TeamId], stats: &TeamStatsMap) -> Result<()> {
    let mut seen = std::collections::HashSet::with_capacity(seeds.len());
    for team in seeds {
        if !stats.contains_key(team) {
            return Err(InputError::UnknownTeam(team.clone()).into());
        }
        if !seen.insert(team) {
            return Err(InputError::DuplicateTeam(team.clone()).into());
        }
    }
    Ok(())
}
