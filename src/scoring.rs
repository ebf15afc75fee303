//! Single-game scoring model.
//!
//! Each side's score is drawn from a band proportional to an adjusted base
//! built from its shooting efficiency and assists, penalised by the opponent's
//! saves and by a random variation scaled with the side's uncertainty.

use rand::Rng;

use crate::constants::{
    ASSIST_WEIGHT, MAX_TIE_REPLAYS, MIN_ADJUSTED_BASE, SAVE_WEIGHT, SCORE_HIGH_MULTIPLIER,
    SCORE_LOW_MULTIPLIER, SHOOTING_WEIGHT,
};
use crate::error::{InputError, Result, SimError};
use crate::team::{TeamId, TeamStatistics};

/// Variation bands observed across bracket variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ScoringPreset {
    /// Variation drawn from [0, 0.85] × uncertainty
    #[default]
    Standard,
    /// Variation drawn from [0.15, 0.85] × uncertainty
    Conservative,
    /// Variation drawn from [0.2, 0.8] × uncertainty
    Narrow,
}

impl ScoringPreset {
    pub fn config(self) -> ScoringConfig {
        let (variation_low, variation_high) = match self {
            ScoringPreset::Standard => (0.0, 0.85),
            ScoringPreset::Conservative => (0.15, 0.85),
            ScoringPreset::Narrow => (0.2, 0.8),
        };
        ScoringConfig {
            variation_low,
            variation_high,
            ..ScoringConfig::default()
        }
    }
}

/// Weights and random bands for the scoring model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoringConfig {
    pub shooting_weight: f64,
    pub assist_weight: f64,
    pub save_weight: f64,
    /// Lower bound of the variation draw as a fraction of uncertainty
    pub variation_low: f64,
    /// Upper bound of the variation draw as a fraction of uncertainty
    pub variation_high: f64,
    /// Final score band multipliers applied to the adjusted base
    pub score_low: f64,
    pub score_high: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            shooting_weight: SHOOTING_WEIGHT,
            assist_weight: ASSIST_WEIGHT,
            save_weight: SAVE_WEIGHT,
            variation_low: 0.0,
            variation_high: 0.85,
            score_low: SCORE_LOW_MULTIPLIER,
            score_high: SCORE_HIGH_MULTIPLIER,
        }
    }
}

impl From<ScoringPreset> for ScoringConfig {
    fn from(preset: ScoringPreset) -> Self {
        preset.config()
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.shooting_weight,
            self.assist_weight,
            self.save_weight,
            self.variation_low,
            self.variation_high,
            self.score_low,
            self.score_high,
        ];
        if values.iter().any(|v| !v.is_finite()) {
            let reason = "scoring values must be finite".to_string();
            return Err(InputError::InvalidConfig(reason).into());
        }
        if self.variation_low < 0.0 || self.variation_low > self.variation_high {
            return Err(InputError::InvalidConfig(format!(
                "variation band [{}, {}] is empty or negative",
                self.variation_low, self.variation_high
            ))
            .into());
        }
        if self.score_low <= 0.0 || self.score_low >= self.score_high {
            return Err(InputError::InvalidConfig(format!(
                "score band [{}, {}) must be positive and non-empty",
                self.score_low, self.score_high
            ))
            .into());
        }
        Ok(())
    }

    /// Deterministic part of a side's score before variation.
    pub fn base_score(&self, side: &TeamStatistics, opponent: &TeamStatistics) -> f64 {
        self.shooting_weight * side.shooting_percentage() + self.assist_weight * side.assists()
            - self.save_weight * opponent.saves()
    }
}

/// Draw one side's score for a single game.
///
/// The result is always positive; a higher adjusted base shifts the whole
/// band upwards. Statistics large enough to push the band past `f64::MAX`
/// are rejected as [`InputError::InvalidStatistics`].
pub fn side_score<R: Rng + ?Sized>(
    side: &TeamStatistics,
    opponent: &TeamStatistics,
    config: &ScoringConfig,
    rng: &mut R,
) -> Result<f64> {
    let uncertainty = side.uncertainty();
    let variation =
        rng.gen_range(config.variation_low * uncertainty..=config.variation_high * uncertainty);
    let adjusted = (config.base_score(side, opponent) - variation).max(MIN_ADJUSTED_BASE);

    let (low, high) = (config.score_low * adjusted, config.score_high * adjusted);
    if !high.is_finite() {
        return Err(InputError::InvalidStatistics {
            team: "<unnamed>".to_string(),
            reason: format!("adjusted base {} overflows the score band", adjusted),
        }
        .into());
    }
    Ok(rng.gen_range(low..high))
}

/// Put the team name on a statistics error raised without one.
fn name_team(err: SimError, team: &TeamId) -> SimError {
    match err {
        SimError::Input(InputError::InvalidStatistics { reason, .. }) => {
            InputError::InvalidStatistics {
                team: team.to_string(),
                reason,
            }
            .into()
        }
        other => other,
    }
}

/// Outcome of one game once any tied draws have been replayed.
#[derive(Clone, Debug, PartialEq)]
pub struct GameResult {
    pub winner: TeamId,
    pub loser: TeamId,
    pub winner_score: f64,
    pub loser_score: f64,
    /// Tied draws thrown away before this result
    pub replays: u32,
}

impl GameResult {
    pub fn won_by(&self, team: &TeamId) -> bool {
        &self.winner == team
    }
}

/// Play one game, replaying tied draws until one side scores strictly more.
///
/// Replays are capped at [`MAX_TIE_REPLAYS`]; hitting the cap returns
/// [`SimError::UnresolvedTie`].
pub fn play_game<R: Rng + ?Sized>(
    team1: (&TeamId, &TeamStatistics),
    team2: (&TeamId, &TeamStatistics),
    config: &ScoringConfig,
    rng: &mut R,
) -> Result<GameResult> {
    let (id1, stats1) = team1;
    let (id2, stats2) = team2;

    for replays in 0..=MAX_TIE_REPLAYS {
        let score1 = side_score(stats1, stats2, config, rng).map_err(|e| name_team(e, id1))?;
        let score2 = side_score(stats2, stats1, config, rng).map_err(|e| name_team(e, id2))?;

        if score1 > score2 {
            return Ok(GameResult {
                winner: id1.clone(),
                loser: id2.clone(),
                winner_score: score1,
                loser_score: score2,
                replays,
            });
        }
        if score2 > score1 {
            return Ok(GameResult {
                winner: id2.clone(),
                loser: id1.clone(),
                winner_score: score2,
                loser_score: score1,
                replays,
            });
        }
        log::trace!("{} vs {} tied at {:.3}, replaying", id1, id2, score1);
    }

    Err(SimError::UnresolvedTie {
        team1: id1.clone(),
        team2: id2.clone(),
        replays: MAX_TIE_REPLAYS,
    })
}
