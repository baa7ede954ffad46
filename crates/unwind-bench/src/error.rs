use thiserror::Error;
use unwind_jit::BackendError;

use crate::harness::Mismatch;

/// Ways a benchmark run can be abandoned.
///
/// There are no retries: every variant ends the run.
#[derive(Debug, Error)]
pub enum BenchError {
    /// The code generator could not produce a usable unit.
    #[error("code generation backend failed: {0}")]
    Backend(#[from] BackendError),

    /// An invocation disagreed with the oracle.
    #[error(transparent)]
    Mismatch(#[from] Mismatch),

    #[error("spawn benchmark worker {index}: {err}")]
    Spawn { index: u32, err: std::io::Error },

    #[error("benchmark worker with seed {seed} panicked")]
    WorkerPanicked { seed: u64 },

    #[error("write report: {0}")]
    Output(#[from] std::io::Error),
}

impl BenchError {
    /// Whether the failure leaves the process in a state that must not exit normally.
    ///
    /// Backend failures and worker panics abort; correctness and I/O failures exit with status 1.
    pub fn is_unrecoverable(&self) -> bool {
        matches!(self, Self::Backend(_) | Self::WorkerPanicked { .. })
    }
}
