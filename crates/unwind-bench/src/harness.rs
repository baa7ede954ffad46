//! Single checked call into a dynamic unit.

use std::fmt;

use thiserror::Error;
use unwind_jit::{Callback, DynamicUnit, InvokeError};

use crate::error::BenchError;
use crate::oracle::{reference_callback, Expectation};

/// Inputs run against a freshly created unit before any timing starts.
pub const SANITY_CASES: [(i32, Expectation); 4] = [
    (2, Expectation::Value(1)),
    (1, Expectation::Value(4)),
    (0, Expectation::Abort),
    (-1, Expectation::Abort),
];

/// A validated call outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Returned(i32),
    Aborted,
}

/// What a call actually produced, for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Observed {
    Value(i32),
    Exception,
    Trap(String),
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{value}"),
            Self::Exception => f.write_str("exception"),
            Self::Trap(message) => write!(f, "trap ({message})"),
        }
    }
}

/// A call whose outcome disagreed with the oracle.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unexpected result for input {input}, expected {expected}, got {observed}")]
pub struct Mismatch {
    pub input: i32,
    pub expected: Expectation,
    pub observed: Observed,
}

/// Invoke `unit` with the reference callback and validate the outcome.
pub fn check(unit: &mut DynamicUnit, input: i32) -> Result<Outcome, BenchError> {
    check_with(unit, reference_callback, input, Expectation::for_input(input))
}

/// Invoke `unit` with `callback` and validate the outcome against `expected`.
///
/// A normal return must be non-negative and equal to the expected value; an abrupt termination
/// is only accepted when an abort was expected. Anything else is a [`Mismatch`].
pub fn check_with(
    unit: &mut DynamicUnit,
    callback: Callback,
    input: i32,
    expected: Expectation,
) -> Result<Outcome, BenchError> {
    let observed = match unit.invoke(callback, input) {
        Ok(value) => {
            if value >= 0 && expected == Expectation::Value(value) {
                return Ok(Outcome::Returned(value));
            }
            Observed::Value(value)
        }
        Err(InvokeError::Abort(_)) => {
            if expected == Expectation::Abort {
                return Ok(Outcome::Aborted);
            }
            Observed::Exception
        }
        Err(InvokeError::Trap(message)) => Observed::Trap(message),
        Err(InvokeError::Backend(err)) => return Err(err.into()),
    };

    Err(Mismatch {
        input,
        expected,
        observed,
    }
    .into())
}

/// Run [`SANITY_CASES`] against `unit`.
pub fn sanity_check(unit: &mut DynamicUnit) -> Result<(), BenchError> {
    for (input, expected) in SANITY_CASES {
        check_with(unit, reference_callback, input, expected)?;
    }
    Ok(())
}
