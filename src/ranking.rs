//! Composite team ranking.
//!
//! Independent of the brackets: a deterministic score per team built from the
//! same statistics the scoring model uses. Sorting teams by this score is the
//! usual way to produce a seed list for a bracket run.

use crate::constants::{
    RANK_ASSIST_WEIGHT, RANK_SAVE_WEIGHT, RANK_SHOOTING_WEIGHT, RANK_UNCERTAINTY_WEIGHT,
};
use crate::team::{TeamId, TeamStatistics, TeamStatsMap};

#[derive(Clone, Debug, PartialEq)]
pub struct RankingEntry {
    pub team: TeamId,
    pub score: f64,
}

/// Weighted shooting, assists and saves, damped by uncertainty.
pub fn composite_score(stats: &TeamStatistics) -> f64 {
    let weighted = RANK_SHOOTING_WEIGHT * stats.shooting_percentage()
        + RANK_ASSIST_WEIGHT * stats.assists()
        + RANK_SAVE_WEIGHT * stats.saves();
    (weighted / (1.0 + RANK_UNCERTAINTY_WEIGHT * stats.uncertainty())).abs()
}

/// Score every team, highest first. Equal scores are ordered by id.
pub fn rank_teams(stats: &TeamStatsMap) -> Vec<RankingEntry> {
    let mut entries: Vec<RankingEntry> = stats
        .iter()
        .map(|(team, s)| RankingEntry {
            team: team.clone(),
            score: composite_score(s),
        })
        .collect();

    entries.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.team.cmp(&b.team)));
    entries
}

/// Seed list in ranking order.
pub fn seed_list(ranking: &[RankingEntry]) -> Vec<TeamId> {
    ranking.iter().map(|e| e.team.clone()).collect()
}
