//! Double elimination with a routed losers bracket.
//!
//! Teams dropping out of winners round `k` land in a fixed losers round:
//! round 1 feeds losers round 1, round `k >= 2` feeds losers round `2k - 2`.
//! In between, losers rounds with no dropouts halve the field. A bracket with
//! `K` winners rounds therefore has `2K - 2` losers rounds, and the two
//! surviving teams meet once in the Grand Finals.

use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::bracket::{play_round, Bracket, OutcomeLog, TournamentOutcome};
use crate::constants::DOUBLE_ELIMINATION_ENTRANTS;
use crate::error::{InputError, Result, SimError};
use crate::scoring::{ScoringConfig, ScoringPreset};
use crate::series::{play_series, BestOf, MatchContext};
use crate::team::TeamId;

#[derive(Clone, Debug, PartialEq)]
pub struct DoubleElimination {
    pub winners_best_of: BestOf,
    pub losers_best_of: BestOf,
    pub grand_final_best_of: BestOf,
    pub scoring: ScoringConfig,
}

impl Default for DoubleElimination {
    fn default() -> Self {
        DoubleElimination {
            winners_best_of: BestOf::Five,
            losers_best_of: BestOf::Five,
            grand_final_best_of: BestOf::Seven,
            scoring: ScoringPreset::Conservative.config(),
        }
    }
}

/// Number of losers rounds for `winners_rounds` winners rounds.
pub fn losers_rounds(winners_rounds: usize) -> usize {
    2 * winners_rounds - 2
}

/// Zero-based losers round that receives the losers of winners round `k` (1-based).
pub fn dropout_round(k: usize) -> usize {
    if k == 1 {
        0
    } else {
        2 * k - 3
    }
}

/// Last zero-based losers round whose entrants are all known once winners
/// round `k` of `winners_rounds` has been played.
fn last_ready_round(k: usize, winners_rounds: usize) -> usize {
    if k == 1 {
        0
    } else if k < winners_rounds {
        2 * k - 2
    } else {
        2 * k - 3
    }
}

fn winners_label(k: usize, winners_rounds: usize) -> String {
    if k == winners_rounds {
        "Winners Final".to_string()
    } else {
        format!("Winners Round {}", k)
    }
}

fn losers_label(index: usize, total: usize) -> String {
    if index + 1 == total {
        "Losers Final".to_string()
    } else {
        format!("Losers Round {}", index + 1)
    }
}

impl Bracket for DoubleElimination {
    fn name(&self) -> &'static str {
        "double elimination"
    }

    fn check_entrants(&self, count: usize) -> Result<()> {
        if count != DOUBLE_ELIMINATION_ENTRANTS {
            return Err(InputError::BracketSize {
                format: self.name(),
                expected: DOUBLE_ELIMINATION_ENTRANTS.to_string(),
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
        if seeds.len() < 4 || !seeds.len().is_power_of_two() {
            return Err(SimError::Inconsistent(format!(
                "losers bracket routing needs a power of two of at least 4 teams, got {}",
                seeds.len()
            )));
        }

        let winners_rounds = seeds.len().trailing_zeros() as usize;
        let total_losers_rounds = losers_rounds(winners_rounds);
        let mut buckets: Vec<Vec<TeamId>> = vec![Vec::new(); total_losers_rounds];
        let mut outcome = OutcomeLog::default();

        let mut upper = seeds.to_vec();
        let mut next_lower = 0;
        let mut lower_champion = None;

        for k in 1..=winners_rounds {
            let label = winners_label(k, winners_rounds);
            outcome.reach(label.clone(), &upper);
            let round = play_round(&upper, self.winners_best_of, ctx, rng)?;
            buckets[dropout_round(k)].extend(round.losers.iter().cloned());
            outcome.round(label, round.series);
            upper = round.winners;

            while next_lower <= last_ready_round(k, winners_rounds) {
                let mut entrants = std::mem::take(&mut buckets[next_lower]);
                if next_lower > 0 {
                    entrants.shuffle(rng);
                }

                let label = losers_label(next_lower, total_losers_rounds);
                outcome.reach(label.clone(), &entrants);
                let round = play_round(&entrants, self.losers_best_of, ctx, rng)?;
                outcome.eliminate(&round.losers);
                outcome.round(label, round.series);

                if next_lower + 1 < total_losers_rounds {
                    buckets[next_lower + 1].extend(round.winners);
                } else {
                    lower_champion = match round.winners.as_slice() {
                        [team] => Some(team.clone()),
                        other => {
                            return Err(SimError::Inconsistent(format!(
                                "losers final left {} teams",
                                other.len()
                            )))
                        }
                    };
                }
                next_lower += 1;
            }
        }

        let upper_champion = match upper.as_slice() {
            [team] => team.clone(),
            other => {
                return Err(SimError::Inconsistent(format!(
                    "winners bracket left {} teams",
                    other.len()
                )))
            }
        };
        let lower_champion = lower_champion.ok_or_else(|| {
            SimError::Inconsistent("losers bracket produced no finalist".to_string())
        })?;

        let finalists = [upper_champion.clone(), lower_champion.clone()];
        outcome.reach("Grand Finals", &finalists);
        let result = play_series(
            &upper_champion,
            &lower_champion,
            self.grand_final_best_of,
            ctx,
            rng,
        )?;
        let champion = result.winner.clone();
        outcome.eliminate(std::slice::from_ref(&result.loser));
        outcome.round("Grand Finals", vec![result]);
        outcome.reach("Champion", std::slice::from_ref(&champion));

        let finished = outcome.finish(champion);
        let unique: HashSet<&TeamId> = finished.eliminated.iter().collect();
        let eliminated = finished.eliminated.len();
        if eliminated != seeds.len() - 1 || unique.len() != eliminated {
            return Err(SimError::Inconsistent(format!(
                "{} eliminations ({} distinct) for {} teams",
                finished.eliminated.len(),
                unique.len(),
                seeds.len()
            )));
        }

        Ok(finished)
    }
}
