use rand::Rng;

use crate::bracket::{play_round, Bracket, OutcomeLog, TournamentOutcome};
use crate::error::{InputError, Result, SimError};
use crate::scoring::{ScoringConfig, ScoringPreset};
use crate::series::{BestOf, MatchContext};
use crate::team::TeamId;

/// Knockout bracket over a power-of-two seed list.
#[derive(Clone, Debug, PartialEq)]
pub struct SingleElimination {
    pub best_of: BestOf,
    /// Series length of the two-team final
    pub final_best_of: BestOf,
    pub scoring: ScoringConfig,
}

impl Default for SingleElimination {
    fn default() -> Self {
        SingleElimination {
            best_of: BestOf::Seven,
            final_best_of: BestOf::Seven,
            scoring: ScoringPreset::Standard.config(),
        }
    }
}

/// Label for a knockout round by the number of teams still in it.
pub fn round_label(remaining: usize) -> String {
    match remaining {
        2 => "Grand Finals".to_string(),
        4 => "Semifinals".to_string(),
        8 => "Quarterfinals".to_string(),
        n => format!("Round of {}", n),
    }
}

/// Play a knockout from `entrants` down to one team and return it.
///
/// Each round is a fresh vector built from the previous round's winners; the
/// input slice is never touched. Round losers are logged as eliminated.
pub(crate) fn run_knockout<R: Rng + ?Sized>(
    entrants: &[TeamId],
    best_of: BestOf,
    final_best_of: BestOf,
    ctx: &MatchContext<'_>,
    rng: &mut R,
    outcome: &mut OutcomeLog,
) -> Result<TeamId> {
    let mut remaining = entrants.to_vec();

    while remaining.len() > 1 {
        let label = round_label(remaining.len());
        let series_length = if remaining.len() == 2 { final_best_of } else { best_of };
        outcome.reach(label.clone(), &remaining);

        let round = play_round(&remaining, series_length, ctx, rng)?;
        outcome.eliminate(&round.losers);
        outcome.round(label, round.series);
        remaining = round.winners;
    }

    remaining
        .pop()
        .ok_or_else(|| SimError::Inconsistent("knockout finished with no teams".to_string()))
}

impl Bracket for SingleElimination {
    fn name(&self) -> &'static str {
        "single elimination"
    }

    fn check_entrants(&self, count: usize) -> Result<()> {
        if count < 2 || !count.is_power_of_two() {
            return Err(InputError::BracketSize {
                format: self.name(),
                expected: "a power of two (at least 2)".to_string(),
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
        let mut outcome = OutcomeLog::default();
        let champion = run_knockout(
            seeds,
            self.best_of,
            self.final_best_of,
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
    use crate::bracket::test_support::{even_field, graded_field};
    use crate::series::BestOf;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_rejects_non_power_of_two() {
        let bracket = SingleElimination::default();
        assert!(bracket.check_entrants(12).is_err());
        assert!(bracket.check_entrants(1).is_err());
        assert!(bracket.check_entrants(0).is_err());
        assert!(bracket.check_entrants(2).is_ok());
        assert!(bracket.check_entrants(64).is_ok());
    }

    #[test]
    fn test_sixteen_teams_four_rounds() {
        let (seeds, stats) = graded_field(16);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let outcome = SingleElimination::default().simulate(&seeds, &stats, &mut rng).unwrap();

        assert_eq!(outcome.rounds.len(), 4);
        assert_eq!(outcome.rounds.last().unwrap().label, "Grand Finals");
        assert_eq!(outcome.eliminated.len(), 15);

        let unique: HashSet<_> = outcome.eliminated.iter().collect();
        assert_eq!(unique.len(), 15);
        assert!(!outcome.eliminated.contains(&outcome.champion));
        assert_eq!(outcome.stages.last().unwrap().teams, vec![outcome.champion.clone()]);
    }

    #[test]
    fn test_caller_seeds_untouched() {
        let (seeds, stats) = graded_field(8);
        let before = seeds.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        SingleElimination::default().simulate(&seeds, &stats, &mut rng).unwrap();
        assert_eq!(seeds, before);
    }

    #[test]
    fn test_final_uses_its_own_length() {
        let (seeds, stats) = graded_field(4);
        let bracket = SingleElimination {
            best_of: BestOf::Five,
            final_best_of: BestOf::Seven,
            ..SingleElimination::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let outcome = bracket.simulate(&seeds, &stats, &mut rng).unwrap();

        assert!(outcome.rounds[0].series.iter().all(|s| s.best_of == BestOf::Five));
        assert_eq!(outcome.rounds[1].series[0].best_of, BestOf::Seven);
        assert_eq!(outcome.rounds[1].series[0].winner, outcome.champion);
    }

    #[test]
    fn test_even_field_has_no_pairing_bias() {
        let (seeds, stats) = even_field(16);
        let bracket = SingleElimination::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let trials = 10_000;

        let mut wins: HashMap<TeamId, usize> = HashMap::new();
        for _ in 0..trials {
            let outcome = bracket.simulate(&seeds, &stats, &mut rng).unwrap();
            *wins.entry(outcome.champion).or_insert(0) += 1;
        }

        for team in &seeds {
            let pct = *wins.get(team).unwrap_or(&0) as f64 / trials as f64 * 100.0;
            assert!((pct - 6.25).abs() < 1.25, "{} won {:.2}% of tournaments", team, pct);
        }
    }
}
