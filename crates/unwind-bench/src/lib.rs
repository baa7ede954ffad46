//! Concurrent benchmark of error propagation out of dynamically generated code.
//!
//! Each worker repeatedly compiles a fresh trampoline ([`unwind_jit::DynamicUnit`]), calls it many
//! times with inputs that sometimes make the callback terminate abruptly, and validates every
//! outcome against a local oracle. Worker timings are reduced to the slowest worker per
//! `{failure rate, thread count}` cell and printed as a table.
//!
//! Data flow: [`report`] → [`orchestrator`] → N × [`driver`] → [`harness`] → generated code.

pub mod cli;
pub mod config;
pub mod driver;
pub mod error;
pub mod harness;
pub mod oracle;
pub mod orchestrator;
pub mod report;
pub mod rng;

pub use config::{BenchConfig, ConfigError};
pub use driver::{BenchDriver, InputStream, RunStats};
pub use error::BenchError;
pub use harness::{check, Mismatch, Observed, Outcome};
pub use oracle::{reference_callback, Expectation};
pub use orchestrator::{CellRun, Orchestrator, WorkerRun};
pub use report::{BenchmarkCell, Report, ReportDriver, ReportRow, FAILURE_RATES_PER_MILLE};
pub use rng::SequenceGenerator;
