use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;
use std::fmt;

use crate::bracket::{Bracket, TournamentOutcome};
use crate::constants::{DEFAULT_CONFIDENCE, DEFAULT_ITERATIONS};
use crate::error::{InputError, Result, SimError};
use crate::ranking::{rank_teams, seed_list};
use crate::series::MatchContext;
use crate::team::{TeamId, TeamStatsMap};

/// What a batch does when a single trial fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// The first failed trial fails the whole batch
    #[default]
    FailFast,
    /// Failed trials are logged, counted and left out of the percentages
    SkipFailed,
}

/// Batch settings for the repetition driver.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationConfig {
    pub iterations: usize,
    /// Master seed; `None` draws one from the OS
    pub seed: Option<u64>,
    pub error_policy: ErrorPolicy,
    /// Confidence level for the reported margins, in (0, 1)
    pub confidence: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            iterations: DEFAULT_ITERATIONS,
            seed: None,
            error_policy: ErrorPolicy::FailFast,
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.iterations == 0 {
            return Err(InputError::InvalidConfig("iterations must be positive".to_string()).into());
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(InputError::InvalidConfig(format!(
                "confidence must be between 0 and 1, got {}",
                self.confidence
            ))
            .into());
        }
        Ok(())
    }
}

/// Champion and stage counts over a set of trials.
///
/// Merging sums counts per team, so tallies from any split of the trials
/// combine to the same totals.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tally {
    pub trials: u64,
    pub failed: u64,
    pub champions: HashMap<TeamId, u64>,
    pub stages: HashMap<String, HashMap<TeamId, u64>>,
    /// Stage names in first-seen order
    pub stage_order: Vec<String>,
}

impl Tally {
    pub fn record(&mut self, outcome: &TournamentOutcome) {
        self.trials += 1;
        *self.champions.entry(outcome.champion.clone()).or_insert(0) += 1;

        for stage in &outcome.stages {
            if !self.stages.contains_key(&stage.name) {
                self.stage_order.push(stage.name.clone());
            }
            let counts = self.stages.entry(stage.name.clone()).or_default();
            for team in &stage.teams {
                *counts.entry(team.clone()).or_insert(0) += 1;
            }
        }
    }

    pub fn merge(mut self, other: Tally) -> Tally {
        self.trials += other.trials;
        self.failed += other.failed;
        for (team, count) in other.champions {
            *self.champions.entry(team).or_insert(0) += count;
        }
        for name in other.stage_order {
            if !self.stage_order.contains(&name) {
                self.stage_order.push(name);
            }
        }
        for (name, counts) in other.stages {
            let mine = self.stages.entry(name).or_default();
            for (team, count) in counts {
                *mine.entry(team).or_insert(0) += count;
            }
        }
        self
    }
}

/// One team's share of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct TeamShare {
    pub team: TeamId,
    pub count: u64,
    /// Percentage of completed trials
    pub percentage: f64,
    /// Half-width of the confidence interval, in percentage points
    pub margin: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StageShares {
    pub stage: String,
    pub shares: Vec<TeamShare>,
}

/// Aggregated result of a batch.
#[derive(Clone, Debug, PartialEq)]
pub struct SimulationReport {
    pub format: String,
    pub trials: u64,
    pub failed: u64,
    /// Tournament wins, highest first
    pub champions: Vec<TeamShare>,
    /// Stage reach percentages in stage order
    pub stages: Vec<StageShares>,
}

impl SimulationReport {
    pub fn champion_share(&self, team: &TeamId) -> Option<&TeamShare> {
        self.champions.iter().find(|s| &s.team == team)
    }

    pub fn stage(&self, name: &str) -> Option<&StageShares> {
        self.stages.iter().find(|s| s.stage == name)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tournament wins ({}, {} trials):", self.format, self.trials)?;
        for share in &self.champions {
            writeln!(f, "  {}: {:.2}% (±{:.2})", share.team, share.percentage, share.margin)?;
        }
        for stage in &self.stages {
            writeln!(f, "Reached {}:", stage.stage)?;
            for share in &stage.shares {
                writeln!(f, "  {}: {:.2}%", share.team, share.percentage)?;
            }
        }
        if self.failed > 0 {
            writeln!(f, "{} trials failed and were skipped", self.failed)?;
        }
        Ok(())
    }
}

/// Repetition driver: plays one bracket many times and aggregates the results.
#[derive(Clone, Debug)]
pub struct Simulator<B> {
    bracket: B,
    seeds: Vec<TeamId>,
    stats: TeamStatsMap,
    config: SimulationConfig,
}

impl<B: Bracket + Sync> Simulator<B> {
    /// Validate everything once so trials can skip the checks.
    pub fn new(
        bracket: B,
        seeds: Vec<TeamId>,
        stats: TeamStatsMap,
        config: SimulationConfig,
    ) -> Result<Self> {
        config.validate()?;
        bracket.validate(&seeds, &stats)?;
        Ok(Simulator {
            bracket,
            seeds,
            stats,
            config,
        })
    }

    /// Seed the bracket in composite ranking order, best team first.
    pub fn seeded_by_ranking(
        bracket: B,
        stats: TeamStatsMap,
        config: SimulationConfig,
    ) -> Result<Self> {
        let seeds = seed_list(&rank_teams(&stats));
        Self::new(bracket, seeds, stats, config)
    }

    pub fn seeds(&self) -> &[TeamId] {
        &self.seeds
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Per-trial seeds drawn from the master generator.
    pub fn trial_seeds(&self) -> Vec<u64> {
        let mut rng = match self.config.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        (0..self.config.iterations).map(|_| rng.gen::<u64>()).collect()
    }

    /// Play a single tournament with its own generator.
    pub fn run_trial(&self, seed: u64) -> Result<TournamentOutcome> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let ctx = MatchContext::new(&self.stats, self.bracket.scoring());
        self.bracket.play(&self.seeds, &ctx, &mut rng)
    }

    /// Play one trial per seed in parallel and merge the tallies.
    pub fn tally_trials(&self, seeds: &[u64]) -> Result<Tally> {
        let policy = self.config.error_policy;
        seeds
            .par_iter()
            .map(|&seed| (seed, self.run_trial(seed)))
            .try_fold(Tally::default, |mut tally, (seed, result)| match result {
                Ok(outcome) => {
                    tally.record(&outcome);
                    Ok(tally)
                }
                Err(err) if policy == ErrorPolicy::SkipFailed => {
                    log::warn!("skipping trial {}: {}", seed, err);
                    tally.failed += 1;
                    Ok(tally)
                }
                Err(err) => Err(err),
            })
            .try_reduce(Tally::default, |a, b| Ok(a.merge(b)))
    }

    /// Run the configured number of trials and report percentages.
    pub fn run(&self) -> Result<SimulationReport> {
        let tally = self.tally_trials(&self.trial_seeds())?;
        log::info!(
            "{}: {} trials complete, {} skipped",
            self.bracket.name(),
            tally.trials,
            tally.failed
        );
        self.report(&tally)
    }

    /// Turn a tally into percentages over completed trials.
    pub fn report(&self, tally: &Tally) -> Result<SimulationReport> {
        if tally.trials == 0 {
            return Err(SimError::Inconsistent(format!(
                "no trial completed ({} failed)",
                tally.failed
            )));
        }

        let normal = Normal::new(0.0, 1.0).map_err(|e| InputError::InvalidConfig(e.to_string()))?;
        let z = normal.inverse_cdf(0.5 + self.config.confidence / 2.0);
        let n = tally.trials as f64;

        let shares = |counts: Option<&HashMap<TeamId, u64>>| -> Vec<TeamShare> {
            let mut shares: Vec<TeamShare> = self
                .seeds
                .iter()
                .map(|team| {
                    let count = counts.and_then(|c| c.get(team)).copied().unwrap_or(0);
                    let p = count as f64 / n;
                    TeamShare {
                        team: team.clone(),
                        count,
                        percentage: p * 100.0,
                        margin: z * (p * (1.0 - p) / n).sqrt() * 100.0,
                    }
                })
                .collect();
            shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.team.cmp(&b.team)));
            shares
        };

        let champions = shares(Some(&tally.champions));
        let stages = tally
            .stage_order
            .iter()
            .map(|name| StageShares {
                stage: name.clone(),
                shares: shares(tally.stages.get(name)),
            })
            .collect();

        Ok(SimulationReport {
            format: self.bracket.name().to_string(),
            trials: tally.trials,
            failed: tally.failed,
            champions,
            stages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bracket::test_support::{even_field, graded_field};
    use crate::bracket::{OutcomeLog, SingleElimination, TournamentFormat};
    use crate::scoring::ScoringConfig;

    fn config(iterations: usize, seed: u64) -> SimulationConfig {
        SimulationConfig {
            iterations,
            seed: Some(seed),
            ..SimulationConfig::default()
        }
    }

    fn knockout(
        seeds: Vec<TeamId>,
        stats: TeamStatsMap,
        cfg: SimulationConfig,
    ) -> Simulator<SingleElimination> {
        Simulator::new(SingleElimination::default(), seeds, stats, cfg).unwrap()
    }

    /// Fails roughly half of its trials.
    struct Flaky;

    impl Bracket for Flaky {
        fn name(&self) -> &'static str {
            "flaky"
        }

        fn check_entrants(&self, _count: usize) -> Result<()> {
            Ok(())
        }

        fn scoring(&self) -> ScoringConfig {
            ScoringConfig::default()
        }

        fn play<R: Rng + ?Sized>(
            &self,
            seeds: &[TeamId],
            _ctx: &MatchContext<'_>,
            rng: &mut R,
        ) -> Result<TournamentOutcome> {
            if rng.gen_bool(0.5) {
                return Err(SimError::Inconsistent("coin came up tails".to_string()));
            }
            Ok(OutcomeLog::default().finish(seeds[0].clone()))
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(SimulationConfig::default().validate().is_ok());
        assert!(config(0, 1).validate().is_err());
        let bad_confidence = SimulationConfig {
            confidence: 1.0,
            ..SimulationConfig::default()
        };
        assert!(bad_confidence.validate().is_err());
    }

    #[test]
    fn test_new_rejects_bad_field() {
        let (seeds, stats) = graded_field(12);
        let result = Simulator::new(SingleElimination::default(), seeds, stats, config(10, 1));
        assert!(matches!(result, Err(SimError::Input(InputError::BracketSize { .. }))));
    }

    #[test]
    fn test_percentages_sum_to_hundred() {
        let (seeds, stats) = graded_field(8);
        let sim = knockout(seeds, stats, config(500, 9));
        let report = sim.run().unwrap();

        assert_eq!(report.trials, 500);
        assert_eq!(report.champions.len(), 8);
        let total: f64 = report.champions.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
        for pair in report.champions.windows(2) {
            assert!(pair[0].count >= pair[1].count);
        }
    }

    #[test]
    fn test_seeded_batches_repeat() {
        let (seeds, stats) = graded_field(16);
        let format: TournamentFormat = "groups".parse().unwrap();
        let sim = Simulator::new(format, seeds, stats, config(200, 17)).unwrap();
        assert_eq!(sim.run().unwrap(), sim.run().unwrap());
    }

    #[test]
    fn test_batch_equals_sum_of_single_trials() {
        let (seeds, stats) = graded_field(8);
        let sim = knockout(seeds, stats, config(50, 3));
        let trial_seeds = sim.trial_seeds();

        let batch = sim.tally_trials(&trial_seeds).unwrap();
        let summed = trial_seeds
            .iter()
            .map(|&s| sim.tally_trials(&[s]).unwrap())
            .fold(Tally::default(), Tally::merge);

        assert_eq!(batch.trials, summed.trials);
        assert_eq!(batch.champions, summed.champions);
        assert_eq!(batch.stages, summed.stages);
    }

    #[test]
    fn test_merge_is_associative() {
        let (seeds, stats) = graded_field(8);
        let sim = knockout(seeds, stats, config(30, 4));
        let trial_seeds = sim.trial_seeds();
        let a = sim.tally_trials(&trial_seeds[..10]).unwrap();
        let b = sim.tally_trials(&trial_seeds[10..20]).unwrap();
        let c = sim.tally_trials(&trial_seeds[20..]).unwrap();

        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));
        assert_eq!(left, right);
        assert_eq!(left.trials, 30);
    }

    #[test]
    fn test_stage_reach_percentages() {
        let (seeds, stats) = graded_field(8);
        let sim = knockout(seeds, stats, config(400, 21));
        let report = sim.run().unwrap();

        let opening = report.stage("Quarterfinals").unwrap();
        assert!(opening.shares.iter().all(|s| (s.percentage - 100.0).abs() < 1e-9));

        // Four of eight teams reach the semifinals in every trial.
        let semis = report.stage("Semifinals").unwrap();
        let total: f64 = semis.shares.iter().map(|s| s.percentage).sum();
        assert!((total - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_even_field_parallel_batch() {
        let (seeds, stats) = even_field(16);
        let sim = knockout(seeds, stats, config(10_000, 2025));
        let report = sim.run().unwrap();

        for share in &report.champions {
            assert!(
                (share.percentage - 6.25).abs() < 1.25,
                "{} at {:.2}%",
                share.team,
                share.percentage
            );
            assert!(share.margin > 0.0 && share.margin < 1.0);
        }
    }

    #[test]
    fn test_seeded_by_ranking() {
        // The graded field improves towards T01, so ranking order is id order.
        let (seeds, stats) = graded_field(8);
        let sim = Simulator::seeded_by_ranking(SingleElimination::default(), stats, config(20, 6))
            .unwrap();
        assert_eq!(sim.seeds(), seeds.as_slice());
        assert_eq!(sim.run().unwrap().trials, 20);
    }

    #[test]
    fn test_fail_fast_policy() {
        let (seeds, stats) = graded_field(4);
        let sim = Simulator::new(Flaky, seeds, stats, config(50, 1)).unwrap();
        assert!(matches!(sim.run(), Err(SimError::Inconsistent(_))));
    }

    #[test]
    fn test_skip_failed_policy() {
        let (seeds, stats) = graded_field(4);
        let cfg = SimulationConfig {
            error_policy: ErrorPolicy::SkipFailed,
            ..config(200, 1)
        };
        let sim = Simulator::new(Flaky, seeds.clone(), stats, cfg).unwrap();
        let report = sim.run().unwrap();

        assert!(report.failed > 0);
        assert_eq!(report.trials + report.failed, 200);
        assert!((report.champion_share(&seeds[0]).unwrap().percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_display() {
        let (seeds, stats) = graded_field(4);
        let sim = knockout(seeds, stats, config(20, 5));
        let text = sim.run().unwrap().to_string();
        assert!(text.starts_with("Tournament wins (single elimination, 20 trials):"));
        assert!(text.contains("Reached Grand Finals:"));
    }
}
