//! Command-line surface: a single optional `--threads "<counts>"`.

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::Parser;

use crate::config::{default_thread_counts, parse_thread_counts, ConfigError};

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(
    name = "unwind-bench",
    about = "Measure how error propagation out of freshly JIT-compiled code scales with threads.",
    args_override_self = true
)]
pub struct Args {
    /// Space-separated worker thread counts (default: 1, 2, 4, … up to half the hardware threads)
    #[arg(long, value_name = "COUNTS")]
    pub threads: Option<String>,
}

impl Args {
    /// The thread counts to sweep.
    pub fn thread_counts(&self) -> Result<Vec<u32>, ConfigError> {
        match &self.threads {
            Some(desc) => parse_thread_counts(desc),
            None => Ok(default_thread_counts()),
        }
    }
}

/// What to do after argument parsing fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseFailure {
    /// `--help`/`--version`: print clap's text and exit successfully.
    Informational(String),
    /// Anything else: report the offending token and exit with status 1.
    UnknownOption(String),
}

pub fn parse_args<I, T>(argv: I) -> Result<Args, ParseFailure>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            ParseFailure::Informational(err.to_string())
        }
        _ => ParseFailure::UnknownOption(offending_token(&err)),
    })
}

/// The argument clap rejected, without any `<VALUE>` placeholder it appends.
fn offending_token(err: &clap::Error) -> String {
    match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg
            .split_whitespace()
            .next()
            .unwrap_or(arg.as_str())
            .to_string(),
        _ => err.kind().as_str().unwrap_or("argument").to_string(),
    }
}
