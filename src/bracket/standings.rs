use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use crate::series::SeriesResult;
use crate::team::TeamId;

/// Win–loss record in series. Orders by wins, then by fewer losses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Record {
    pub wins: u32,
    pub losses: u32,
}

impl Record {
    pub fn new(wins: u32, losses: u32) -> Self {
        Record { wins, losses }
    }
}

impl Ord for Record {
    fn cmp(&self, other: &Self) -> Ordering {
        self.wins
            .cmp(&other.wins)
            .then_with(|| other.losses.cmp(&self.losses))
    }
}

impl PartialOrd for Record {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.wins, self.losses)
    }
}

/// Running tally for one team.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Standing {
    pub series_wins: u32,
    pub series_losses: u32,
    pub game_wins: u32,
    pub game_losses: u32,
}

impl Standing {
    pub fn game_differential(&self) -> i32 {
        self.game_wins as i32 - self.game_losses as i32
    }

    pub fn record(&self) -> Record {
        Record::new(self.series_wins, self.series_losses)
    }
}

/// Series wins desc, then game differential desc, then game wins desc.
pub fn by_wins(a: &Standing, b: &Standing) -> Ordering {
    b.series_wins
        .cmp(&a.series_wins)
        .then_with(|| b.game_differential().cmp(&a.game_differential()))
        .then_with(|| b.game_wins.cmp(&a.game_wins))
}

/// Series losses asc, then game differential desc, then game wins desc.
pub fn by_losses(a: &Standing, b: &Standing) -> Ordering {
    a.series_losses
        .cmp(&b.series_losses)
        .then_with(|| b.game_differential().cmp(&a.game_differential()))
        .then_with(|| b.game_wins.cmp(&a.game_wins))
}

/// Standings keyed by team.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Standings {
    table: HashMap<TeamId, Standing>,
}

impl Standings {
    pub fn new(teams: &[TeamId]) -> Self {
        Standings {
            table: teams.iter().map(|t| (t.clone(), Standing::default())).collect(),
        }
    }

    /// Credit both sides of a finished series.
    pub fn record(&mut self, result: &SeriesResult) {
        let winner = self.table.entry(result.winner.clone()).or_default();
        winner.series_wins += 1;
        winner.game_wins += result.winner_games;
        winner.game_losses += result.loser_games;

        let loser = self.table.entry(result.loser.clone()).or_default();
        loser.series_losses += 1;
        loser.game_wins += result.loser_games;
        loser.game_losses += result.winner_games;
    }

    pub fn get(&self, team: &TeamId) -> Option<&Standing> {
        self.table.get(team)
    }

    pub fn record_of(&self, team: &TeamId) -> Record {
        self.get(team).map(Standing::record).unwrap_or_default()
    }

    /// Order `teams` with `compare`. Full ties keep their input order.
    pub fn ranked(
        &self,
        teams: &[TeamId],
        compare: fn(&Standing, &Standing) -> Ordering,
    ) -> Vec<TeamId> {
        let empty = Standing::default();
        let mut ranked = teams.to_vec();
        ranked.sort_by(|a, b| {
            compare(
                self.table.get(a).unwrap_or(&empty),
                self.table.get(b).unwrap_or(&empty),
            )
        });
        ranked
    }
}
