use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::constants::{BEST_OF_FIVE_THRESHOLD, BEST_OF_SEVEN_THRESHOLD};
use crate::error::{InputError, Result, SimError};
use crate::scoring::{play_game, ScoringConfig};
use crate::team::{check_seeds, TeamId, TeamStatistics, TeamStatsMap};

/// Series length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BestOf {
    Five,
    Seven,
}

impl BestOf {
    /// Games a side must win to take the series
    pub fn threshold(self) -> u32 {
        match self {
            BestOf::Five => BEST_OF_FIVE_THRESHOLD,
            BestOf::Seven => BEST_OF_SEVEN_THRESHOLD,
        }
    }

    /// Most decided games a series can take
    pub fn max_games(self) -> u32 {
        2 * self.threshold() - 1
    }

    pub fn from_games(games: u32) -> Result<Self> {
        match games {
            5 => Ok(BestOf::Five),
            7 => Ok(BestOf::Seven),
            other => Err(InputError::InvalidConfig(format!(
                "unsupported series length best-of-{}",
                other
            ))
            .into()),
        }
    }
}

/// Everything a series needs besides the two team ids.
#[derive(Clone, Copy, Debug)]
pub struct MatchContext<'a> {
    pub stats: &'a TeamStatsMap,
    pub scoring: ScoringConfig,
}

impl<'a> MatchContext<'a> {
    pub fn new(stats: &'a TeamStatsMap, scoring: ScoringConfig) -> Self {
        MatchContext { stats, scoring }
    }

    pub fn stats_for(&self, team: &TeamId) -> Result<&'a TeamStatistics> {
        self.stats
            .get(team)
            .ok_or_else(|| InputError::UnknownTeam(team.clone()).into())
    }
}

/// Outcome of a completed series.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesResult {
    pub winner: TeamId,
    pub loser: TeamId,
    pub winner_games: u32,
    pub loser_games: u32,
    pub best_of: BestOf,
    /// Tied draws replayed across all games of the series
    pub tie_replays: u32,
}

impl SeriesResult {
    pub fn games_played(&self) -> u32 {
        self.winner_games + self.loser_games
    }

    /// Game differential from `team`'s point of view
    pub fn differential_for(&self, team: &TeamId) -> i32 {
        let margin = self.winner_games as i32 - self.loser_games as i32;
        if &self.winner == team {
            margin
        } else {
            -margin
        }
    }

    pub fn involves(&self, team: &TeamId) -> bool {
        &self.winner == team || &self.loser == team
    }
}

/// Play games until one side reaches the series threshold.
pub fn play_series<R: Rng + ?Sized>(
    team1: &TeamId,
    team2: &TeamId,
    best_of: BestOf,
    ctx: &MatchContext<'_>,
    rng: &mut R,
) -> Result<SeriesResult> {
    let stats1 = ctx.stats_for(team1)?;
    let stats2 = ctx.stats_for(team2)?;
    let threshold = best_of.threshold();

    let mut wins1 = 0;
    let mut wins2 = 0;
    let mut tie_replays = 0;

    for _ in 0..best_of.max_games() {
        let game = play_game((team1, stats1), (team2, stats2), &ctx.scoring, rng)?;
        tie_replays += game.replays;
        if game.won_by(team1) {
            wins1 += 1;
        } else {
            wins2 += 1;
        }
        if wins1 == threshold || wins2 == threshold {
            break;
        }
    }

    let (winner, loser, winner_games, loser_games) = if wins1 == threshold {
        (team1, team2, wins1, wins2)
    } else if wins2 == threshold {
        (team2, team1, wins2, wins1)
    } else {
        return Err(SimError::Inconsistent(format!(
            "series {} vs {} ended {}-{} without reaching {}",
            team1, team2, wins1, wins2, threshold
        )));
    };

    log::debug!(
        "{} beat {} {}-{} ({:?})",
        winner,
        loser,
        winner_games,
        loser_games,
        best_of
    );

    Ok(SeriesResult {
        winner: winner.clone(),
        loser: loser.clone(),
        winner_games,
        loser_games,
        best_of,
        tie_replays,
    })
}

/// Head-to-head odds from repeated series.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesOdds {
    pub team1: TeamId,
    pub team2: TeamId,
    pub team1_wins: u64,
    pub team2_wins: u64,
}

impl SeriesOdds {
    pub fn total(&self) -> u64 {
        self.team1_wins + self.team2_wins
    }

    /// Percentage of series won by the first team
    pub fn team1_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.team1_wins as f64 / n as f64 * 100.0,
        }
    }

    pub fn team2_percentage(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            n => self.team2_wins as f64 / n as f64 * 100.0,
        }
    }
}

/// Run the same series `iterations` times in parallel and count winners.
///
/// Each series gets its own generator seeded from a master generator, so a
/// given `seed` reproduces the same counts regardless of thread count.
pub fn series_odds(
    team1: &TeamId,
    team2: &TeamId,
    best_of: BestOf,
    ctx: &MatchContext<'_>,
    iterations: usize,
    seed: Option<u64>,
) -> Result<SeriesOdds> {
    if iterations == 0 {
        return Err(InputError::InvalidConfig("iterations must be positive".to_string()).into());
    }
    if team1 == team2 {
        return Err(InputError::DuplicateTeam(team1.clone()).into());
    }
    check_seeds(&[team1.clone(), team2.clone()], ctx.stats)?;
    ctx.scoring.validate()?;

    let mut master = match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    };
    let seeds: Vec<u64> = (0..iterations).map(|_| master.gen::<u64>()).collect();

    let team1_wins = seeds
        .par_iter()
        .map(|&s| {
            let mut rng = ChaCha8Rng::seed_from_u64(s);
            play_series(team1, team2, best_of, ctx, &mut rng).map(|r| u64::from(&r.winner == team1))
        })
        .try_reduce(|| 0, |a, b| Ok(a + b))?;

    Ok(SeriesOdds {
        team1: team1.clone(),
        team2: team2.clone(),
        team1_wins,
        team2_wins: iterations as u64 - team1_wins,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn make_stats() -> TeamStatsMap {
        let mut stats = TeamStatsMap::new();
        stats.insert(TeamId::from("A"), TeamStatistics::new(1.2, 0.4, 0.3, 2.0, 0.0, 3).unwrap());
        stats.insert(TeamId::from("B"), TeamStatistics::new(0.8, 0.4, 0.3, 2.0, 0.0, 3).unwrap());
        stats.insert(TeamId::from("C"), TeamStatistics::new(1.0, 0.3, 0.3, 2.0, 0.4, 3).unwrap());
        stats
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(BestOf::Five.threshold(), 3);
        assert_eq!(BestOf::Seven.threshold(), 4);
        assert_eq!(BestOf::Seven.max_games(), 7);
        assert_eq!(BestOf::from_games(5).unwrap(), BestOf::Five);
        assert!(BestOf::from_games(3).is_err());
    }

    #[test]
    fn test_unknown_team() {
        let stats = make_stats();
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let (a, z) = (TeamId::from("A"), TeamId::from("Z"));
        let err = play_series(&a, &z, BestOf::Five, &ctx, &mut rng).unwrap_err();
        assert_eq!(err, SimError::Input(InputError::UnknownTeam(TeamId::from("Z"))));
    }

    #[test]
    fn test_differential() {
        let result = SeriesResult {
            winner: TeamId::from("A"),
            loser: TeamId::from("B"),
            winner_games: 4,
            loser_games: 1,
            best_of: BestOf::Seven,
            tie_replays: 0,
        };
        assert_eq!(result.differential_for(&TeamId::from("A")), 3);
        assert_eq!(result.differential_for(&TeamId::from("B")), -3);
        assert_eq!(result.games_played(), 5);
    }

    #[test]
    fn test_seeded_series_repeatable() {
        let stats = make_stats();
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let a = TeamId::from("A");
        let c = TeamId::from("C");

        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let first = play_series(&a, &c, BestOf::Seven, &ctx, &mut rng).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let second = play_series(&a, &c, BestOf::Seven, &ctx, &mut rng).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_better_shooting_favoured_in_best_of_seven() {
        let stats = make_stats();
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let (a, b) = (TeamId::from("A"), TeamId::from("B"));
        let odds = series_odds(&a, &b, BestOf::Seven, &ctx, 2000, Some(42)).unwrap();

        assert_eq!(odds.total(), 2000);
        assert!(odds.team1_percentage() > 60.0, "A won only {:.2}%", odds.team1_percentage());
        assert!((odds.team1_percentage() + odds.team2_percentage() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_odds_seeded() {
        let stats = make_stats();
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let a = TeamId::from("A");
        let c = TeamId::from("C");

        let first = series_odds(&a, &c, BestOf::Five, &ctx, 200, Some(5)).unwrap();
        let second = series_odds(&a, &c, BestOf::Five, &ctx, 200, Some(5)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_series_odds_rejects_bad_input() {
        let stats = make_stats();
        let ctx = MatchContext::new(&stats, ScoringConfig::default());
        let a = TeamId::from("A");

        assert!(series_odds(&a, &TeamId::from("B"), BestOf::Five, &ctx, 0, None).is_err());
        assert!(series_odds(&a, &a, BestOf::Five, &ctx, 10, None).is_err());
    }

    proptest! {
        #[test]
        fn prop_series_invariants(seed in any::<u64>(), seven in any::<bool>()) {
            let stats = make_stats();
            let ctx = MatchContext::new(&stats, ScoringConfig::default());
            let best_of = if seven { BestOf::Seven } else { BestOf::Five };
            let mut rng = ChaCha8Rng::seed_from_u64(seed);

            let (b, c) = (TeamId::from("B"), TeamId::from("C"));
            let result = play_series(&b, &c, best_of, &ctx, &mut rng).unwrap();
            prop_assert_eq!(result.winner_games, best_of.threshold());
            prop_assert!(result.loser_games < best_of.threshold());
            prop_assert!(result.games_played() <= best_of.max_games());
            prop_assert_ne!(result.winner, result.loser);
        }
    }
}
