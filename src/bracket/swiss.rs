use std::collections::BTreeMap;

use rand::Rng;

use crate::bracket::single_elimination::run_knockout;
use crate::bracket::standings::{by_losses, by_wins, Record, Standings};
use crate::bracket::{play_round, seeded_order, Bracket, OutcomeLog, TournamentOutcome};
use crate::error::{InputError, Result, SimError};
use crate::scoring::{ScoringConfig, ScoringPreset};
use crate::series::{BestOf, MatchContext};
use crate::team::TeamId;

/// Swiss rounds followed by a seeded knockout for the qualifiers.
///
/// Teams only ever meet opponents with the same series record. A team
/// qualifies on reaching the win cap and is out on reaching the loss cap.
#[derive(Clone, Debug, PartialEq)]
pub struct SwissStage {
    pub round_best_of: BestOf,
    pub playoff_best_of: BestOf,
    pub scoring: ScoringConfig,
}

impl Default for SwissStage {
    fn default() -> Self {
        SwissStage {
            round_best_of: BestOf::Five,
            playoff_best_of: BestOf::Seven,
            scoring: ScoringPreset::Conservative.config(),
        }
    }
}

/// Win and loss caps for a field, or `None` if the field size has no
/// layout that keeps every record bucket even.
pub fn swiss_caps(entrants: usize) -> Option<(u32, u32)> {
    match entrants {
        8 => Some((2, 2)),
        16 => Some((3, 3)),
        _ => None,
    }
}

/// Pairing order for one Swiss round after the first.
///
/// Teams are bucketed by record, best record first. Each bucket is ranked by
/// standings and folded so the top of the bucket meets the bottom. The result
/// is laid out as adjacent pairs for [`play_round`].
pub fn bucket_pairings(active: &[TeamId], standings: &Standings) -> Result<Vec<TeamId>> {
    let mut buckets: BTreeMap<Record, Vec<TeamId>> = BTreeMap::new();
    for team in active {
        buckets.entry(standings.record_of(team)).or_default().push(team.clone());
    }

    let mut pairing = Vec::with_capacity(active.len());
    for (record, teams) in buckets.iter().rev() {
        if teams.len() % 2 != 0 {
            return Err(SimError::Inconsistent(format!(
                "record bucket {} holds an odd number of teams ({})",
                record,
                teams.len()
            )));
        }
        let ranked = standings.ranked(teams, by_wins);
        let half = ranked.len() / 2;
        for i in 0..half {
            pairing.push(ranked[i].clone());
            pairing.push(ranked[ranked.len() - 1 - i].clone());
        }
    }
    Ok(pairing)
}

impl Bracket for SwissStage {
    fn name(&self) -> &'static str {
        "swiss"
    }

    fn check_entrants(&self, count: usize) -> Result<()> {
        if swiss_caps(count).is_none() {
            return Err(InputError::BracketSize {
                format: self.name(),
                expected: "8 or 16".to_string(),
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
        let (win_cap, loss_cap) = swiss_caps(seeds.len()).ok_or_else(|| {
            SimError::Inconsistent(format!("no swiss layout for {} teams", seeds.len()))
        })?;
        let max_rounds = (win_cap + loss_cap - 1) as usize;

        let mut outcome = OutcomeLog::default();
        let mut standings = Standings::new(seeds);
        let mut active = seeds.to_vec();
        let mut qualified = Vec::with_capacity(seeds.len() / 2);
        let mut round_number = 0;

        while !active.is_empty() {
            round_number += 1;
            if round_number > max_rounds {
                return Err(SimError::Inconsistent(format!(
                    "{} teams still undecided after {} swiss rounds",
                    active.len(),
                    max_rounds
                )));
            }

            let pairing = if round_number == 1 {
                active.clone()
            } else {
                bucket_pairings(&active, &standings)?
            };

            let round = play_round(&pairing, self.round_best_of, ctx, rng)?;
            for result in &round.series {
                standings.record(result);
            }

            let mut still_active = Vec::with_capacity(active.len());
            for team in pairing {
                let record = standings.record_of(&team);
                if record.wins >= win_cap {
                    qualified.push(team);
                } else if record.losses >= loss_cap {
                    outcome.eliminate(std::slice::from_ref(&team));
                } else {
                    still_active.push(team);
                }
            }
            log::debug!(
                "swiss round {}: {} qualified, {} still playing",
                round_number,
                qualified.len(),
                still_active.len()
            );

            outcome.round(format!("Swiss Round {}", round_number), round.series);
            active = still_active;
        }

        if qualified.len() != seeds.len() / 2 {
            return Err(SimError::Inconsistent(format!(
                "swiss stage qualified {} of {} teams",
                qualified.len(),
                seeds.len()
            )));
        }

        let ranked = standings.ranked(&qualified, by_losses);
        let playoff: Vec<TeamId> = seeded_order(ranked.len())
            .into_iter()
            .map(|i| ranked[i].clone())
            .collect();

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
