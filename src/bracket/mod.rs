//! Bracket engines.
//!
//! Every format implements [`Bracket`]. Rounds are played by [`play_round`],
//! a pure function from an ordered slice of teams to the winners and losers
//! of adjacent pairings; formats differ only in how they route those winners
//! and losers into the next round.

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::error::{InputError, Result, SimError};
use crate::scoring::ScoringConfig;
use crate::series::{play_series, BestOf, MatchContext, SeriesResult};
use crate::team::{check_seeds, TeamId, TeamStatsMap};

pub mod double_elimination;
pub mod group_stage;
pub mod single_elimination;
pub mod standings;
pub mod swiss;

pub use double_elimination::DoubleElimination;
pub use group_stage::GroupStage;
pub use single_elimination::SingleElimination;
pub use standings::{Record, Standing, Standings};
pub use swiss::SwissStage;

/// Series played together as one round of a bracket.
#[derive(Clone, Debug, PartialEq)]
pub struct Round {
    pub label: String,
    pub series: Vec<SeriesResult>,
}

/// A milestone in a tournament and the teams that reached it.
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    pub name: String,
    pub teams: Vec<TeamId>,
}

/// Everything that happened in one simulated tournament.
#[derive(Clone, Debug, PartialEq)]
pub struct TournamentOutcome {
    pub champion: TeamId,
    /// Eliminated teams in the order they went out
    pub eliminated: Vec<TeamId>,
    /// Milestones in the order they occur
    pub stages: Vec<Stage>,
    pub rounds: Vec<Round>,
}

/// Running log a format fills while it plays.
#[derive(Debug, Default)]
pub(crate) struct OutcomeLog {
    eliminated: Vec<TeamId>,
    stages: Vec<Stage>,
    rounds: Vec<Round>,
}

impl OutcomeLog {
    pub(crate) fn reach(&mut self, name: impl Into<String>, teams: &[TeamId]) {
        self.stages.push(Stage {
            name: name.into(),
            teams: teams.to_vec(),
        });
    }

    pub(crate) fn eliminate(&mut self, teams: &[TeamId]) {
        self.eliminated.extend_from_slice(teams);
    }

    pub(crate) fn round(&mut self, label: impl Into<String>, series: Vec<SeriesResult>) {
        self.rounds.push(Round {
            label: label.into(),
            series,
        });
    }

    pub(crate) fn finish(self, champion: TeamId) -> TournamentOutcome {
        TournamentOutcome {
            champion,
            eliminated: self.eliminated,
            stages: self.stages,
            rounds: self.rounds,
        }
    }
}

/// Winners and losers of one round, in encounter order.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundResult {
    pub winners: Vec<TeamId>,
    pub losers: Vec<TeamId>,
    pub series: Vec<SeriesResult>,
}

/// Pair adjacent teams (0–1, 2–3, …) and play one series per pair.
///
/// An odd number of teams is a bracket defect and is reported, not truncated.
pub fn play_round<R: Rng + ?Sized>(
    teams: &[TeamId],
    best_of: BestOf,
    ctx: &MatchContext<'_>,
    rng: &mut R,
) -> Result<RoundResult> {
    if teams.len() % 2 != 0 {
        return Err(SimError::Inconsistent(format!(
            "cannot pair an odd number of teams ({})",
            teams.len()
        )));
    }

    let mut winners = Vec::with_capacity(teams.len() / 2);
    let mut losers = Vec::with_capacity(teams.len() / 2);
    let mut series = Vec::with_capacity(teams.len() / 2);

    for pair in teams.chunks_exact(2) {
        let result = play_series(&pair[0], &pair[1], best_of, ctx, rng)?;
        winners.push(result.winner.clone());
        losers.push(result.loser.clone());
        series.push(result);
    }

    Ok(RoundResult {
        winners,
        losers,
        series,
    })
}

/// Standard seeded bracket order for `n` teams (a power of two).
///
/// Returns zero-based seed indices so that seed 1 meets seed n, and the top
/// two seeds can only meet in the final: `[0, 7, 3, 4, 1, 6, 2, 5]` for 8.
pub fn seeded_order(n: usize) -> Vec<usize> {
    let mut order = vec![0];
    while order.len() < n {
        let size = order.len() * 2;
        order = order.iter().flat_map(|&s| [s, size - 1 - s]).collect();
    }
    order
}

/// A tournament format that can turn a seed list into a champion.
pub trait Bracket {
    /// Human readable format name used in errors and logs
    fn name(&self) -> &'static str;

    /// Reject entrant counts the format cannot seat.
    fn check_entrants(&self, count: usize) -> Result<()>;

    /// Scoring configuration used for every game in this format.
    fn scoring(&self) -> ScoringConfig;

    /// Play one tournament. Inputs are assumed validated.
    fn play<R: Rng + ?Sized>(
        &self,
        seeds: &[TeamId],
        ctx: &MatchContext<'_>,
        rng: &mut R,
    ) -> Result<TournamentOutcome>;

    fn validate(&self, seeds: &[TeamId], stats: &TeamStatsMap) -> Result<()> {
        self.check_entrants(seeds.len())?;
        self.scoring().validate()?;
        check_seeds(seeds, stats)
    }

    /// Validate the inputs, then play one tournament.
    fn simulate<R: Rng + ?Sized>(
        &self,
        seeds: &[TeamId],
        stats: &TeamStatsMap,
        rng: &mut R,
    ) -> Result<TournamentOutcome> {
        self.validate(seeds, stats)?;
        let ctx = MatchContext::new(stats, self.scoring());
        self.play(seeds, &ctx, rng)
    }
}

/// Runtime choice of format.
#[derive(Clone, Debug, PartialEq)]
pub enum TournamentFormat {
    SingleElimination(SingleElimination),
    DoubleElimination(DoubleElimination),
    GroupStage(GroupStage),
    Swiss(SwissStage),
}

impl FromStr for TournamentFormat {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "single_elimination" | "knockout" => {
                Ok(TournamentFormat::SingleElimination(SingleElimination::default()))
            }
            "double" | "double_elimination" => {
                Ok(TournamentFormat::DoubleElimination(DoubleElimination::default()))
            }
            "groups" | "group_stage" | "round_robin" => {
                Ok(TournamentFormat::GroupStage(GroupStage::default()))
            }
            "swiss" => Ok(TournamentFormat::Swiss(SwissStage::default())),
            other => Err(InputError::InvalidConfig(format!(
                "unknown tournament format '{}'",
                other
            ))
            .into()),
        }
    }
}

impl fmt::Display for TournamentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Bracket for TournamentFormat {
    fn name(&self) -> &'static str {
        match self {
            TournamentFormat::SingleElimination(b) => b.name(),
            TournamentFormat::DoubleElimination(b) => b.name(),
            TournamentFormat::GroupStage(b) => b.name(),
            TournamentFormat::Swiss(b) => b.name(),
        }
    }

    fn check_entrants(&self, count: usize) -> Result<()> {
        match self {
            TournamentFormat::SingleElimination(b) => b.check_entrants(count),
            TournamentFormat::DoubleElimination(b) => b.check_entrants(count),
            TournamentFormat::GroupStage(b) => b.check_entrants(count),
            TournamentFormat::Swiss(b) => b.check_entrants(count),
        }
    }

    fn scoring(&self) -> ScoringConfig {
        match self {
            TournamentFormat::SingleElimination(b) => b.scoring(),
            TournamentFormat::DoubleElimination(b) => b.scoring(),
            TournamentFormat::GroupStage(b) => b.scoring(),
            TournamentFormat::Swiss(b) => b.scoring(),
        }
    }

    fn play<R: Rng + ?Sized>(
        &self,
        seeds: &[TeamId],
        ctx: &MatchContext<'_>,
        rng: &mut R,
    ) -> Result<TournamentOutcome> {
        match self {
            TournamentFormat::SingleElimination(b) => b.play(seeds, ctx, rng),
            TournamentFormat::DoubleElimination(b) => b.play(seeds, ctx, rng),
            TournamentFormat::GroupStage(b) => b.play(seeds, ctx, rng),
            TournamentFormat::Swiss(b) => b.play(seeds, ctx, rng),
        }
    }
}
