//! Single-thread benchmark driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use unwind_jit::{Callback, JitBackend};

use crate::config::BenchConfig;
use crate::error::BenchError;
use crate::harness::{check_with, Outcome};
use crate::oracle::{reference_callback, Expectation};
use crate::rng::SequenceGenerator;

/// Input that always makes the reference callback terminate abruptly.
pub const FAULT_INPUT: i32 = -1;

/// Mask applied to a draw to derive a positive input (`1..=0x1_0000`).
const INPUT_MASK: u64 = 0xFFFF;

/// Deterministic `(input, expectation)` stream for one worker.
///
/// Each draw injects [`FAULT_INPUT`] with probability `failure_rate_per_mille / 1000`.
#[derive(Clone, Debug)]
pub struct InputStream {
    rng: SequenceGenerator,
    failure_rate_per_mille: u32,
}

impl InputStream {
    pub fn new(failure_rate_per_mille: u32, seed: u64) -> Self {
        Self {
            rng: SequenceGenerator::new(seed),
            failure_rate_per_mille,
        }
    }
}

impl Iterator for InputStream {
    type Item = (i32, Expectation);

    fn next(&mut self) -> Option<Self::Item> {
        let r = self.rng.next_u64();
        let input = if r % 1000 < u64::from(self.failure_rate_per_mille) {
            FAULT_INPUT
        } else {
            // Fits: at most 0x1_0000.
            (r & INPUT_MASK) as i32 + 1
        };
        Some((input, Expectation::for_input(input)))
    }
}

/// Timing and outcome counts of one worker run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Wall time covering unit creation, every call and unit destruction.
    pub elapsed: Duration,
    pub returned: u64,
    pub aborted: u64,
}

impl RunStats {
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }

    pub fn checks(&self) -> u64 {
        self.returned + self.aborted
    }
}

/// Runs the churn loop on the calling thread: `passes` × (fresh unit, `calls_per_pass` checks,
/// destroy).
#[derive(Clone, Copy)]
pub struct BenchDriver<'a> {
    backend: &'a JitBackend,
    config: BenchConfig,
    callback: Callback,
}

impl<'a> BenchDriver<'a> {
    pub fn new(backend: &'a JitBackend, config: BenchConfig) -> Self {
        Self {
            backend,
            config,
            callback: reference_callback,
        }
    }

    /// Call `callback` instead of [`reference_callback`]. Outcomes are still checked against the
    /// reference expectations, so any other behaviour surfaces as a mismatch.
    #[doc(hidden)]
    pub fn with_callback(self, callback: Callback) -> Self {
        Self { callback, ..self }
    }

    pub fn run(&self, failure_rate_per_mille: u32, seed: u64) -> Result<RunStats, BenchError> {
        self.run_until(failure_rate_per_mille, seed, &AtomicBool::new(false))
    }

    /// Like [`Self::run`], but returns early with the counts so far once `stop` is set.
    ///
    /// `stop` is polled before each pass.
    pub fn run_until(
        &self,
        failure_rate_per_mille: u32,
        seed: u64,
        stop: &AtomicBool,
    ) -> Result<RunStats, BenchError> {
        let mut inputs = InputStream::new(failure_rate_per_mille, seed);
        let calls = self.config.calls_per_pass as usize;
        let mut stats = RunStats::default();

        let start = Instant::now();
        for pass in 0..self.config.passes {
            if stop.load(Ordering::Acquire) {
                tracing::debug!(seed, pass, "worker stopped early");
                break;
            }
            // A new unit per pass keeps the code registry churning.
            let mut unit = self.backend.create_unit()?;
            for (input, expected) in inputs.by_ref().take(calls) {
                match check_with(&mut unit, self.callback, input, expected)? {
                    Outcome::Returned(_) => stats.returned += 1,
                    Outcome::Aborted => stats.aborted += 1,
                }
            }
            unit.destroy();
            tracing::trace!(seed, pass, "pass complete");
        }
        stats.elapsed = start.elapsed();

        if stats.checks() == 0 {
            tracing::warn!(seed, "invalid result!");
        }
        tracing::debug!(
            seed,
            failure_rate_per_mille,
            elapsed_ms = stats.elapsed_ms(),
            returned = stats.returned,
            aborted = stats.aborted,
            "worker run complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_rate_never_injects_faults() {
        assert!(InputStream::new(0, 3)
            .take(50_000)
            .all(|(input, expected)| input >= 1 && matches!(expected, Expectation::Value(_))));
    }

    #[test]
    fn full_rate_always_injects_faults() {
        assert!(InputStream::new(1000, 3)
            .take(50_000)
            .all(|item| item == (FAULT_INPUT, Expectation::Abort)));
    }

    #[test]
    fn positive_inputs_stay_in_range() {
        for (input, _) in InputStream::new(100, 11).take(50_000) {
            assert!(input == FAULT_INPUT || (1..=0x1_0000).contains(&input));
        }
    }

    #[test]
    fn fault_share_tracks_rate() {
        let faults = InputStream::new(100, 0)
            .take(100_000)
            .filter(|&(input, _)| input == FAULT_INPUT)
            .count();
        // 10% ± 1%.
        assert!((9_000..=11_000).contains(&faults), "faults={faults}");
    }

    #[test]
    fn stats_expose_millis_and_counts() {
        let stats = RunStats {
            elapsed: Duration::from_millis(1_234),
            returned: 3,
            aborted: 4,
        };
        assert_eq!(stats.elapsed_ms(), 1_234);
        assert_eq!(stats.checks(), 7);
    }
}
