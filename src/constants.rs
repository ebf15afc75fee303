/// Games needed to take a best-of-5 series
pub const BEST_OF_FIVE_THRESHOLD: u32 = 3;

/// Games needed to take a best-of-7 series
pub const BEST_OF_SEVEN_THRESHOLD: u32 = 4;

/// Upper bound on consecutive tied draws replayed for a single game
pub const MAX_TIE_REPLAYS: u32 = 64;

/// Floor applied to a side's adjusted base before the final score draw.
///
/// Keeps the final draw range non-degenerate so two sides can always be
/// separated by a replay.
pub const MIN_ADJUSTED_BASE: f64 = 1e-3;

/// Scoring weights shared by every preset
pub const SHOOTING_WEIGHT: f64 = 1.0;
pub const ASSIST_WEIGHT: f64 = 0.5;
pub const SAVE_WEIGHT: f64 = 0.25;

/// Final score multipliers applied to the adjusted base
pub const SCORE_LOW_MULTIPLIER: f64 = 50.0;
pub const SCORE_HIGH_MULTIPLIER: f64 = 100.0;

/// Ranking weights for the composite score
pub const RANK_SHOOTING_WEIGHT: f64 = 0.5;
pub const RANK_ASSIST_WEIGHT: f64 = 0.3;
pub const RANK_SAVE_WEIGHT: f64 = 0.2;
pub const RANK_UNCERTAINTY_WEIGHT: f64 = 0.5;

/// Entrants accepted by the double-elimination bracket
pub const DOUBLE_ELIMINATION_ENTRANTS: usize = 16;

/// Group stage shape: four groups of four, top two advance
pub const GROUP_COUNT: usize = 4;
pub const GROUP_SIZE: usize = 4;
pub const GROUP_QUALIFIERS: usize = 2;

/// Default number of Monte Carlo trials per batch
pub const DEFAULT_ITERATIONS: usize = 10_000;

/// Default confidence level for reported percentage intervals
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
