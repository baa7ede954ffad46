use std::io;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use unwind_bench::cli::{parse_args, ParseFailure};
use unwind_bench::harness::sanity_check;
use unwind_bench::{BenchConfig, BenchDriver, BenchError, Orchestrator, ReportDriver};
use unwind_jit::JitBackend;

fn main() -> ExitCode {
    // Stdout carries the report; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(ParseFailure::Informational(text)) => {
            print!("{text}");
            return ExitCode::SUCCESS;
        }
        Err(ParseFailure::UnknownOption(token)) => {
            println!("unknown option {token}");
            return ExitCode::from(1);
        }
    };

    let thread_counts = match args.thread_counts() {
        Ok(counts) => counts,
        Err(err) => {
            println!("{err}");
            return ExitCode::from(1);
        }
    };

    let config = match BenchConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("unwind-bench: {err}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(
        passes = config.passes,
        calls_per_pass = config.calls_per_pass,
        ?thread_counts,
        "starting benchmark"
    );

    match run(config, &thread_counts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn run(config: BenchConfig, thread_counts: &[u32]) -> Result<(), BenchError> {
    let backend = JitBackend::new()?;

    let mut unit = backend.create_unit()?;
    sanity_check(&mut unit)?;
    unit.destroy();

    let driver = BenchDriver::new(&backend, config);
    let report = ReportDriver::new(Orchestrator::new(driver));
    let stdout = io::stdout();
    report.run(thread_counts, &mut stdout.lock())?;
    Ok(())
}

fn fail(err: BenchError) -> ExitCode {
    tracing::error!("benchmark failed: {err}");
    if err.is_unrecoverable() {
        std::process::abort();
    }
    ExitCode::from(1)
}
