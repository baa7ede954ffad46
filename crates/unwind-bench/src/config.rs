//! Workload configuration and thread-count lists.

use std::num::NonZeroUsize;
use std::thread;

use thiserror::Error;

pub const DEFAULT_PASSES: u32 = 10;
pub const DEFAULT_CALLS_PER_PASS: u32 = 10_000;

/// Overrides the number of fresh units each worker creates.
pub const ENV_PASSES: &str = "UNWIND_BENCH_PASSES";
/// Overrides the number of checked calls made through each unit.
pub const ENV_CALLS_PER_PASS: &str = "UNWIND_BENCH_CALLS_PER_PASS";

/// Largest worker count accepted in a `--threads` list.
pub const MAX_THREAD_COUNT: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for env var {var} (expected a positive integer)")]
    InvalidEnv { var: &'static str, value: String },

    #[error("invalid thread count {0:?}")]
    InvalidThreadCount(String),

    #[error("thread count {0} exceeds the maximum of {MAX_THREAD_COUNT}")]
    TooManyThreads(u32),

    #[error("no non-zero thread counts given")]
    EmptyThreadCounts,
}

/// Shape of one worker's run: `passes` units, `calls_per_pass` checked calls each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchConfig {
    pub passes: u32,
    pub calls_per_pass: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            passes: DEFAULT_PASSES,
            calls_per_pass: DEFAULT_CALLS_PER_PASS,
        }
    }
}

impl BenchConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`Self::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let passes = match lookup(ENV_PASSES) {
            Some(raw) => parse_positive(ENV_PASSES, &raw)?,
            None => defaults.passes,
        };
        let calls_per_pass = match lookup(ENV_CALLS_PER_PASS) {
            Some(raw) => parse_positive(ENV_CALLS_PER_PASS, &raw)?,
            None => defaults.calls_per_pass,
        };
        Ok(Self {
            passes,
            calls_per_pass,
        })
    }

    /// Total checked calls one worker performs.
    pub fn calls_per_run(&self) -> u64 {
        u64::from(self.passes) * u64::from(self.calls_per_pass)
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u32, ConfigError> {
    match raw.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: raw.to_string(),
        }),
    }
}

/// `1, 2, 4, …` doubling up to `max`, always ending exactly at `max`.
pub fn thread_counts_up_to(max: u32) -> Vec<u32> {
    let mut counts = vec![1u32];
    while let Some(&last) = counts.last() {
        if last >= max {
            break;
        }
        counts.push(last.saturating_mul(2).min(max));
    }
    counts
}

/// Thread counts used when none are given: half the hardware threads, assuming the other half
/// are hyperthread siblings.
pub fn default_thread_counts() -> Vec<u32> {
    let hardware = thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1);
    let cap = u32::try_from(hardware / 2).unwrap_or(u32::MAX).max(1);
    thread_counts_up_to(cap)
}

/// Parse a whitespace-separated list of thread counts. Zero entries are skipped; counts above
/// [`MAX_THREAD_COUNT`] are rejected.
pub fn parse_thread_counts(desc: &str) -> Result<Vec<u32>, ConfigError> {
    let mut counts = Vec::new();
    for token in desc.split_whitespace() {
        let count = token
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidThreadCount(token.to_string()))?;
        if count > MAX_THREAD_COUNT {
            return Err(ConfigError::TooManyThreads(count));
        }
        if count != 0 {
            counts.push(count);
        }
    }
    if counts.is_empty() {
        return Err(ConfigError::EmptyThreadCounts);
    }
    Ok(counts)
}
