//! Failure-rate × thread-count sweep and its text table.

use std::fmt;
use std::io::Write;
use std::time::Duration;

use crate::error::BenchError;
use crate::orchestrator::Orchestrator;

/// Failure rates swept by default, in parts per thousand (0%, 0.1%, 1%, 10%).
pub const FAILURE_RATES_PER_MILLE: [u32; 4] = [0, 1, 10, 100];

/// One measured `{failure rate, thread count}` point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchmarkCell {
    pub failure_rate_per_mille: u32,
    pub thread_count: u32,
    pub duration: Duration,
}

impl BenchmarkCell {
    pub fn duration_ms(&self) -> u64 {
        u64::try_from(self.duration.as_millis()).unwrap_or(u64::MAX)
    }
}

/// All cells for one failure rate, in thread-count order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRow {
    pub failure_rate_per_mille: u32,
    pub cells: Vec<BenchmarkCell>,
}

/// The full report matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Report {
    pub thread_counts: Vec<u32>,
    pub rows: Vec<ReportRow>,
}

/// `testing using 1 2 4 threads`
pub fn header_line(thread_counts: &[u32]) -> String {
    let mut line = String::from("testing using");
    for count in thread_counts {
        line.push_str(&format!(" {count}"));
    }
    line.push_str(" threads");
    line
}

/// `failure rate 0.1%:`
pub fn row_prefix(failure_rate_per_mille: u32) -> String {
    format!(
        "failure rate {}%:",
        f64::from(failure_rate_per_mille) / 10.0
    )
}

impl fmt::Display for ReportRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&row_prefix(self.failure_rate_per_mille))?;
        for cell in &self.cells {
            write!(f, " {}", cell.duration_ms())?;
        }
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", header_line(&self.thread_counts))?;
        for row in &self.rows {
            writeln!(f, "{row}")?;
        }
        Ok(())
    }
}

/// Sweeps failure rates × thread counts through an [`Orchestrator`].
pub struct ReportDriver<'a> {
    orchestrator: Orchestrator<'a>,
    failure_rates: Vec<u32>,
}

impl<'a> ReportDriver<'a> {
    pub fn new(orchestrator: Orchestrator<'a>) -> Self {
        Self::with_failure_rates(orchestrator, FAILURE_RATES_PER_MILLE.to_vec())
    }

    pub fn with_failure_rates(orchestrator: Orchestrator<'a>, failure_rates: Vec<u32>) -> Self {
        Self {
            orchestrator,
            failure_rates,
        }
    }

    /// Run every cell, streaming the table to `out` as cells complete.
    pub fn run(&self, thread_counts: &[u32], out: &mut impl Write) -> Result<Report, BenchError> {
        writeln!(out, "{}", header_line(thread_counts))?;
        out.flush()?;

        let mut rows = Vec::with_capacity(self.failure_rates.len());
        for &failure_rate_per_mille in &self.failure_rates {
            write!(out, "{}", row_prefix(failure_rate_per_mille))?;
            let mut cells = Vec::with_capacity(thread_counts.len());
            for &thread_count in thread_counts {
                let run = self.orchestrator.run(failure_rate_per_mille, thread_count)?;
                let cell = BenchmarkCell {
                    failure_rate_per_mille,
                    thread_count,
                    duration: run.slowest,
                };
                tracing::info!(
                    failure_rate_per_mille,
                    thread_count,
                    duration_ms = cell.duration_ms(),
                    "benchmark cell"
                );
                write!(out, " {}", cell.duration_ms())?;
                out.flush()?;
                cells.push(cell);
            }
            writeln!(out)?;
            rows.push(ReportRow {
                failure_rate_per_mille,
                cells,
            });
        }

        Ok(Report {
            thread_counts: thread_counts.to_vec(),
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(rate: u32, threads: u32, ms: u64) -> BenchmarkCell {
        BenchmarkCell {
            failure_rate_per_mille: rate,
            thread_count: threads,
            duration: Duration::from_millis(ms),
        }
    }

    #[test]
    fn rate_labels() {
        let labels: Vec<_> = FAILURE_RATES_PER_MILLE.iter().map(|&r| row_prefix(r)).collect();
        assert_eq!(
            labels,
            [
                "failure rate 0%:",
                "failure rate 0.1%:",
                "failure rate 1%:",
                "failure rate 10%:"
            ]
        );
    }

    #[test]
    fn renders_table() {
        let report = Report {
            thread_counts: vec![1, 2, 4],
            rows: vec![
                ReportRow {
                    failure_rate_per_mille: 0,
                    cells: vec![cell(0, 1, 10), cell(0, 2, 12), cell(0, 4, 15)],
                },
                ReportRow {
                    failure_rate_per_mille: 100,
                    cells: vec![cell(100, 1, 30), cell(100, 2, 41), cell(100, 4, 95)],
                },
            ],
        };
        assert_eq!(
            report.to_string(),
            "testing using 1 2 4 threads\n\
             failure rate 0%: 10 12 15\n\
             failure rate 10%: 30 41 95\n"
        );
    }
}
