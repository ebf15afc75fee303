//! Bracket Core - Monte Carlo series and bracket simulation.
//!
//! Turns per-team aggregate statistics into single-game outcomes, plays them
//! as best-of-N series, and runs those series through single-elimination,
//! double-elimination, group-stage and Swiss brackets. The repetition driver
//! plays a bracket many times in parallel and reports how often each team
//! wins or reaches each stage. Python bindings are available behind the
//! `python` feature.

pub mod bracket;
pub mod constants;
pub mod error;
pub mod ranking;
pub mod scoring;
pub mod series;
pub mod team;
pub mod tournament;

#[cfg(feature = "python")]
mod python;

pub use bracket::{
    Bracket, DoubleElimination, GroupStage, SingleElimination, SwissStage, TournamentFormat,
    TournamentOutcome,
};
pub use error::{InputError, Result, SimError};
pub use ranking::{composite_score, rank_teams, RankingEntry};
pub use scoring::{play_game, GameResult, ScoringConfig, ScoringPreset};
pub use series::{play_series, series_odds, BestOf, MatchContext, SeriesOdds, SeriesResult};
pub use team::{PlayerStatistics, TeamId, TeamStatistics, TeamStatsMap};
pub use tournament::{ErrorPolicy, SimulationConfig, SimulationReport, Simulator, Tally};
