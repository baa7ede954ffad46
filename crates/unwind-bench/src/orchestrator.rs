//! Multi-thread orchestration and the slowest-worker reduction.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use crate::driver::{BenchDriver, RunStats};
use crate::error::BenchError;

/// One worker's seed and result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerRun {
    pub seed: u64,
    pub stats: RunStats,
}

/// Result of one benchmark cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRun {
    /// Elapsed time of the slowest worker.
    pub slowest: Duration,
    /// Per-worker results in seed order.
    pub workers: Vec<WorkerRun>,
}

impl CellRun {
    pub fn slowest_ms(&self) -> u64 {
        u64::try_from(self.slowest.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Raise `slot` to `value` if it is larger, without taking a lock.
pub fn record_max(slot: &AtomicU64, value: u64) {
    let mut current = slot.load(Ordering::Relaxed);
    while value > current {
        match slot.compare_exchange_weak(current, value, Ordering::AcqRel, Ordering::Relaxed) {
            Ok(_) => break,
            Err(observed) => current = observed,
        }
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// Runs one [`BenchDriver`] per worker thread and keeps the slowest time.
///
/// Threads are spawned and joined per call; worker `i` uses seed `i`. The first worker to fail
/// asks the others to stop after their current pass, and its error is returned once all have
/// been joined.
#[derive(Clone, Copy)]
pub struct Orchestrator<'a> {
    driver: BenchDriver<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(driver: BenchDriver<'a>) -> Self {
        Self { driver }
    }

    pub fn run(
        &self,
        failure_rate_per_mille: u32,
        thread_count: u32,
    ) -> Result<CellRun, BenchError> {
        if thread_count <= 1 {
            let stats = self.driver.run(failure_rate_per_mille, 0)?;
            return Ok(CellRun {
                slowest: stats.elapsed,
                workers: vec![WorkerRun { seed: 0, stats }],
            });
        }

        let max_nanos = AtomicU64::new(0);
        let stop = AtomicBool::new(false);
        let joined = thread::scope(|scope| {
            let mut handles = Vec::new();
            for index in 0..thread_count {
                let driver = self.driver;
                let max_nanos = &max_nanos;
                let stop = &stop;
                let seed = u64::from(index);
                let spawned = thread::Builder::new()
                    .name(format!("unwind-worker-{index}"))
                    .spawn_scoped(scope, move || {
                        let result = driver.run_until(failure_rate_per_mille, seed, stop);
                        match &result {
                            Ok(stats) => record_max(max_nanos, duration_nanos(stats.elapsed)),
                            Err(_) => stop.store(true, Ordering::Release),
                        }
                        result
                    });
                match spawned {
                    Ok(handle) => handles.push((seed, handle)),
                    Err(err) => {
                        // Workers already running are joined when the scope ends.
                        stop.store(true, Ordering::Release);
                        return Err(BenchError::Spawn { index, err });
                    }
                }
            }

            // Join everything before inspecting results so no panicked worker is left unjoined.
            Ok(handles
                .into_iter()
                .map(|(seed, handle)| (seed, handle.join()))
                .collect::<Vec<_>>())
        })?;

        let mut workers = Vec::with_capacity(joined.len());
        for (seed, result) in joined {
            match result {
                Ok(Ok(stats)) => workers.push(WorkerRun { seed, stats }),
                Ok(Err(err)) => return Err(err),
                Err(_) => return Err(BenchError::WorkerPanicked { seed }),
            }
        }

        let cell = CellRun {
            slowest: Duration::from_nanos(max_nanos.load(Ordering::Acquire)),
            workers,
        };
        tracing::debug!(
            failure_rate_per_mille,
            thread_count,
            slowest_ms = cell.slowest_ms(),
            "cell complete"
        );
        Ok(cell)
    }
}
