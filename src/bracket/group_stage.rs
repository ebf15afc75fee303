use rand::Rng;

use crate::bracket::single_elimination::run_knockout;
use crate::bracket::standings::{by_wins, Standings};
use crate::bracket::{Bracket, OutcomeLog, TournamentOutcome};
use crate::constants::{GROUP_COUNT, GROUP_QUALIFIERS, GROUP_SIZE};
use crate::error::{InputError, Result, SimError};
use crate::scoring::{ScoringConfig, ScoringPreset};
use crate::series::{play_series, BestOf, MatchContext, SeriesResult};
use crate::team::TeamId;

const GROUP_NAMES: [&str; GROUP_COUNT] = ["A", "B", "C", "D"];

/// Four round-robin groups of four feeding an eight-team knockout.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupStage {
    pub group_best_of: BestOf,
    pub playoff_best_of: BestOf,
    pub scoring: ScoringConfig,
}

impl Default for GroupStage {
    fn default() -> Self {
        GroupStage {
            group_best_of: BestOf::Five,
            playoff_best_of: BestOf::Seven,
            scoring: ScoringPreset::Narrow.config(),
        }
    }
}

/// Final table of one group, best team first.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupTable {
    pub name: &'static str,
    pub ranked: Vec<TeamId>,
    pub standings: Standings,
}

/// Play every pairing in `teams` once and rank the table.
pub fn play_group<R: Rng + ?Sized>(
    name: &'static str,
    teams: &[TeamId],
    best_of: BestOf,
    ctx: &MatchContext<'_>,
    rng: &mut R,
) -> Result<(GroupTable, Vec<SeriesResult>)> {
    let mut standings = Standings::new(teams);
    let mut played = Vec::with_capacity(teams.len() * teams.len().saturating_sub(1) / 2);

    for (i, home) in teams.iter().enumerate() {
        for away in &teams[i + 1..] {
            let result = play_series(home, away, best_of, ctx, rng)?;
            standings.record(&result);
            played.push(result);
        }
    }

    let ranked = standings.ranked(teams, by_wins);
    log::debug!("group {} final order: {:?}", name, ranked);
    Ok((
        GroupTable {
            name,
            ranked,
            standings,
        },
        played,
    ))
}

/// Cross-group playoff order: A1–C2, B1–D2, C1–A2, D1–B2.
pub fn playoff_order(tables: &[GroupTable]) -> Result<Vec<TeamId>> {
    let place = |group: usize, rank: usize| -> Result<TeamId> {
        tables
            .get(group)
            .and_then(|t| t.ranked.get(rank))
            .cloned()
            .ok_or_else(|| {
                SimError::Inconsistent(format!("group {} has no place {}", group, rank + 1))
            })
    };

    let mut order = Vec::with_capacity(GROUP_COUNT * GROUP_QUALIFIERS);
    for group in 0..GROUP_COUNT {
        let opposite = (group + GROUP_COUNT / 2) % GROUP_COUNT;
        order.push(place(group, 0)?);
        order.push(place(opposite, 1)?);
    }
    Ok(order)
}

impl Bracket for GroupStage {
    fn name(&self) -> &'static str {
        "group stage"
    }

    fn check_entrants(&self, count: usize) -> Result<()> {
        let expected = GROUP_COUNT * GROUP_SIZE;
        if count != expected {
            return Err(InputError::BracketSize {
                format: self.name(),
                expected: expected.to_string(),
                actual: count,
            }
            .into());
        }
        Ok(())
    }

    fn scoring(&self) -> ScoringConfig {
        self.scoring
    }

    fn play<R: Rng + ?Sized>(
        &self,
        seeds: &[TeamId],
        ctx: &MatchContext<'_>,
        rng: &mut R,
    ) -> Result<TournamentOutcome> {
        if seeds.len() != GROUP_COUNT * GROUP_SIZE {
            return Err(SimError::Inconsistent(format!(
                "cannot split {} teams into {} groups of {}",
                seeds.len(),
                GROUP_COUNT,
                GROUP_SIZE
            )));
        }

        let mut outcome = OutcomeLog::default();
        let mut tables = Vec::with_capacity(GROUP_COUNT);

        for (name, members) in GROUP_NAMES.iter().copied().zip(seeds.chunks_exact(GROUP_SIZE)) {
            let (table, played) = play_group(name, members, self.group_best_of, ctx, rng)?;
            outcome.eliminate(&table.ranked[GROUP_QUALIFIERS..]);
            outcome.round(format!("Group {}", name), played);
            tables.push(table);
        }

        let playoff = playoff_order(&tables)?;
        outcome.reach("Playoffs", &playoff);
        let champion = run_knockout(
            &playoff,
            self.playoff_best_of,
            self.playoff_best_of,
            ctx,
            rng,
            &mut outcome,
        )?;
        outcome.reach("Champion", std::slice::from_ref(&champion));
        Ok(outcome.finish(champion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::test_support::graded_field;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashSet;

    #[test]
    fn test_requires_sixteen() {
        let stage = GroupStage::default();
        assert!(stage.check_entrants(16).is_ok());
        assert!(stage.check_entrants(8).is_err());
    }

    #[test]
    fn test_group_plays_all_pairings() {
        let (seeds, stats) = graded_field(4);
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        let (table, played) = play_group("A", &seeds, BestOf::Five, &ctx, &mut rng).unwrap();
        assert_eq!(played.len(), 6);

        let pairs: HashSet<(TeamId, TeamId)> = played
            .iter()
            .map(|s| {
                let (a, b) = (s.winner.clone(), s.loser.clone());
                if a < b { (a, b) } else { (b, a) }
            })
            .collect();
        assert_eq!(pairs.len(), 6);

        let total_wins: u32 = seeds
            .iter()
            .map(|t| table.standings.get(t).unwrap().series_wins)
            .sum();
        assert_eq!(total_wins, 6);
        assert_eq!(table.ranked.len(), 4);
    }

    #[test]
    fn test_group_table_is_sorted() {
        let (seeds, stats) = graded_field(4);
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(99);

        let (table, _) = play_group("B", &seeds, BestOf::Five, &ctx, &mut rng).unwrap();
        for pair in table.ranked.windows(2) {
            let a = table.standings.get(&pair[0]).unwrap();
            let b = table.standings.get(&pair[1]).unwrap();
            assert_ne!(by_wins(a, b), std::cmp::Ordering::Greater);
        }
    }

    #[test]
    fn test_playoff_cross_pairs_groups() {
        let (seeds, _) = graded_field(16);
        let tables: Vec<GroupTable> = GROUP_NAMES
            .iter()
            .copied()
            .zip(seeds.chunks_exact(4))
            .map(|(name, members)| GroupTable {
                name,
                ranked: members.to_vec(),
                standings: Standings::new(members),
            })
            .collect();

        let order = playoff_order(&tables).unwrap();
        // A1 v C2, B1 v D2, C1 v A2, D1 v B2
        let expected = [0, 9, 4, 13, 8, 1, 12, 5];
        let expected: Vec<TeamId> = expected.iter().map(|&i| seeds[i].clone()).collect();
        assert_eq!(order, expected);
    }

    #[test]
    fn test_full_run() {
        let (seeds, stats) = graded_field(16);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let outcome = GroupStage::default().simulate(&seeds, &stats, &mut rng).unwrap();

        assert_eq!(outcome.eliminated.len(), 15);
        let unique: HashSet<_> = outcome.eliminated.iter().collect();
        assert_eq!(unique.len(), 15);
        assert_eq!(outcome.stages[0].name, "Playoffs");
        assert_eq!(outcome.stages[0].teams.len(), 8);

        let group_rounds = outcome.rounds.iter().filter(|r| r.label.starts_with("Group")).count();
        assert_eq!(group_rounds, 4);
        assert!(outcome
            .rounds
            .iter()
            .filter(|r| !r.label.starts_with("Group"))
            .flat_map(|r| r.series.iter())
            .all(|s| s.best_of == BestOf::Seven));
    }
}
