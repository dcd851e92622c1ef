use custom_debug_derive::Debug;
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::debug::{opt_fmt, ConfigError};

pub const DEFAULT_TIME_LIMIT: f64 = 60.0;
pub const DEFAULT_SOFT_FRACTION: f64 = 0.90;
pub const DEFAULT_HARD_FRACTION: f64 = 0.95;
pub const DEFAULT_REFINEMENT_ROUNDS: usize = 8;
/// Pairs per second the scheduler is assumed to commit.
pub const DEFAULT_CAPACITY: f64 = 2500.0;
pub const DEFAULT_MAX_BATCH: usize = 100;

#[derive(Debug, Clone)]
pub struct Settings {
    /// File with the two graphs.
    pub input: PathBuf,
    /// File the permutation is written to.
    pub output: PathBuf,
    /// Time allowance of the whole invocation.
    pub time_limit: Duration,
    /// Share of the allowance after which batches grow.
    pub soft_fraction: f64,
    /// Share of the allowance after which matching stops.
    pub hard_fraction: f64,
    /// Colour refinement rounds before matching.
    pub refinement_rounds: usize,
    /// Assumed throughput in pairs per second.
    pub capacity: f64,
    /// Upper bound for a single batch of pairs.
    pub max_batch: usize,
    /// Where to dump the statistics of the run.
    #[debug(with = "opt_fmt")]
    pub statistics: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            input: PathBuf::from("graphs"),
            output: PathBuf::from("ans"),
            time_limit: Duration::from_secs_f64(DEFAULT_TIME_LIMIT),
            soft_fraction: DEFAULT_SOFT_FRACTION,
            hard_fraction: DEFAULT_HARD_FRACTION,
            refinement_rounds: DEFAULT_REFINEMENT_ROUNDS,
            capacity: DEFAULT_CAPACITY,
            max_batch: DEFAULT_MAX_BATCH,
            statistics: None,
        }
    }
}

impl Settings {
    /// Turn a time allowance in seconds into a duration.
    pub fn parse_time_limit(seconds: f64) -> Result<Duration, ConfigError> {
        Duration::try_from_secs_f64(seconds)
            .map_err(|_| ConfigError(format!("time limit {} is not a valid duration", seconds)))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let fractions_ordered = 0.0 < self.soft_fraction
            && self.soft_fraction <= self.hard_fraction
            && self.hard_fraction < 1.0;
        if !fractions_ordered {
            return Err(ConfigError(format!(
                "deadline fractions must satisfy 0 < soft <= hard < 1, got soft={} hard={}",
                self.soft_fraction, self.hard_fraction
            )));
        }

        if !(self.capacity.is_finite() && self.capacity > 0.0) {
            return Err(ConfigError(format!(
                "capacity must be positive, got {}",
                self.capacity
            )));
        }

        if self.max_batch == 0 {
            return Err(ConfigError("maximum batch size must be positive".to_string()));
        }

        Ok(())
    }

    pub fn deadlines(&self, start: Instant) -> Deadlines {
        Deadlines::new(
            start,
            self.time_limit,
            self.soft_fraction,
            self.hard_fraction,
        )
    }
}

/// Soft and hard deadline relative to the start of the process.
#[derive(Debug, Clone, Copy)]
pub struct Deadlines {
    #[debug(skip)]
    start: Instant,
    soft: Duration,
    hard: Duration,
}

impl Deadlines {
    pub fn new(
        start: Instant,
        time_limit: Duration,
        soft_fraction: f64,
        hard_fraction: f64,
    ) -> Self {
        Deadlines {
            start,
            soft: time_limit.mul_f64(soft_fraction),
            hard: time_limit.mul_f64(hard_fraction),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn soft(&self) -> Duration {
        self.soft
    }

    pub fn hard(&self) -> Duration {
        self.hard
    }

    pub fn hard_expired(&self, elapsed: Duration) -> bool {
        elapsed >= self.hard
    }

    /// Time left until the soft deadline, zero once it has passed.
    pub fn until_soft(&self, elapsed: Duration) -> Duration {
        self.soft.saturating_sub(elapsed)
    }
}
