//! Python bindings, built with the `python` feature.
//!
//! The Python side owns CSV loading and prompts; it hands over team
//! statistics keyed by name and gets plain dicts and tuples back.

use pyo3::prelude::*;
use std::collections::HashMap;

use crate::bracket::TournamentFormat;
use crate::constants::{DEFAULT_CONFIDENCE, DEFAULT_ITERATIONS};
use crate::ranking;
use crate::scoring::ScoringConfig;
use crate::series::{self, BestOf, MatchContext};
use crate::team::{PlayerStatistics, TeamId, TeamStatistics, TeamStatsMap};
use crate::tournament::{ErrorPolicy, SimulationConfig, Simulator};

#[pyclass(name = "TeamStatistics")]
#[derive(Clone, Debug)]
pub struct PyTeamStatistics {
    inner: TeamStatistics,
}

#[pymethods]
impl PyTeamStatistics {
    #[new]
    #[pyo3(signature = (goals, assists, saves, shots, uncertainty = 0.0, players = 1))]
    fn new(
        goals: f64,
        assists: f64,
        saves: f64,
        shots: f64,
        uncertainty: f64,
        players: u32,
    ) -> PyResult<Self> {
        Ok(PyTeamStatistics {
            inner: TeamStatistics::new(goals, assists, saves, shots, uncertainty, players)?,
        })
    }

    /// Build from roster rows of (name, goals, assists, saves, shots, uncertainty).
    #[staticmethod]
    fn from_players(team: &str, players: Vec<(String, f64, f64, f64, f64, f64)>) -> PyResult<Self> {
        let players: Vec<PlayerStatistics> = players
            .into_iter()
            .map(|(name, goals, assists, saves, shots, uncertainty)| PlayerStatistics {
                name,
                goals,
                assists,
                saves,
                shots,
                uncertainty,
            })
            .collect();
        Ok(PyTeamStatistics {
            inner: TeamStatistics::from_players(team, &players)?,
        })
    }

    #[getter]
    fn goals(&self) -> f64 {
        self.inner.goals()
    }

    #[getter]
    fn assists(&self) -> f64 {
        self.inner.assists()
    }

    #[getter]
    fn saves(&self) -> f64 {
        self.inner.saves()
    }

    #[getter]
    fn shots(&self) -> f64 {
        self.inner.shots()
    }

    #[getter]
    fn uncertainty(&self) -> f64 {
        self.inner.uncertainty()
    }

    #[getter]
    fn players(&self) -> u32 {
        self.inner.players()
    }

    #[getter]
    fn shooting_percentage(&self) -> f64 {
        self.inner.shooting_percentage()
    }

    fn __repr__(&self) -> String {
        format!(
            "TeamStatistics(goals={}, assists={}, saves={}, shots={}, uncertainty={})",
            self.inner.goals(),
            self.inner.assists(),
            self.inner.saves(),
            self.inner.shots(),
            self.inner.uncertainty()
        )
    }
}

fn stats_map(teams: HashMap<String, PyTeamStatistics>) -> TeamStatsMap {
    teams
        .into_iter()
        .map(|(name, stats)| (TeamId::new(name), stats.inner))
        .collect()
}

/// Champion percentages and stage reach percentages over repeated tournaments.
///
/// Without `seeds` the bracket is seeded in composite ranking order.
#[pyfunction]
#[pyo3(signature = (
    format, teams, seeds = None, iterations = DEFAULT_ITERATIONS, seed = None, skip_failed = false
))]
fn simulate_tournament(
    py: Python<'_>,
    format: &str,
    teams: HashMap<String, PyTeamStatistics>,
    seeds: Option<Vec<String>>,
    iterations: usize,
    seed: Option<u64>,
    skip_failed: bool,
) -> PyResult<(HashMap<String, f64>, HashMap<String, HashMap<String, f64>>)> {
    let format: TournamentFormat = format.parse()?;
    let config = SimulationConfig {
        iterations,
        seed,
        error_policy: if skip_failed {
            ErrorPolicy::SkipFailed
        } else {
            ErrorPolicy::FailFast
        },
        confidence: DEFAULT_CONFIDENCE,
    };
    let stats = stats_map(teams);
    let simulator = match seeds {
        Some(seeds) => {
            Simulator::new(format, seeds.into_iter().map(TeamId::new).collect(), stats, config)?
        }
        None => Simulator::seeded_by_ranking(format, stats, config)?,
    };
    let report = py.allow_threads(|| simulator.run())?;

    let champions = report
        .champions
        .iter()
        .map(|s| (s.team.to_string(), s.percentage))
        .collect();
    let stages = report
        .stages
        .iter()
        .map(|stage| {
            let shares = stage
                .shares
                .iter()
                .map(|s| (s.team.to_string(), s.percentage))
                .collect();
            (stage.stage.clone(), shares)
        })
        .collect();
    Ok((champions, stages))
}

/// Series win percentages for two teams meeting repeatedly.
#[pyfunction]
#[pyo3(signature = (
    team1, team2, teams, best_of = 7, iterations = DEFAULT_ITERATIONS, seed = None
))]
fn series_odds(
    py: Python<'_>,
    team1: &str,
    team2: &str,
    teams: HashMap<String, PyTeamStatistics>,
    best_of: u32,
    iterations: usize,
    seed: Option<u64>,
) -> PyResult<(f64, f64)> {
    let best_of = BestOf::from_games(best_of)?;
    let stats = stats_map(teams);
    let (team1, team2) = (TeamId::from(team1), TeamId::from(team2));

    let odds = py.allow_threads(|| {
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        series::series_odds(&team1, &team2, best_of, &ctx, iterations, seed)
    })?;
    Ok((odds.team1_percentage(), odds.team2_percentage()))
}

/// Composite ranking, best team first.
#[pyfunction]
fn rank_teams(teams: HashMap<String, PyTeamStatistics>) -> Vec<(String, f64)> {
    ranking::rank_teams(&stats_map(teams))
        .into_iter()
        .map(|e| (e.team.to_string(), e.score))
        .collect()
}

#[pymodule]
fn bracket_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTeamStatistics>()?;

    m.add_function(wrap_pyfunction!(simulate_tournament, m)?)?;
    m.add_function(wrap_pyfunction!(series_odds, m)?)?;
    m.add_function(wrap_pyfunction!(rank_teams, m)?)?;

    m.add("DEFAULT_ITERATIONS", DEFAULT_ITERATIONS)?;
    Ok(())
}
