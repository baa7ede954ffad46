//! Reference workload and its locally computed expectation.

use std::fmt;

use unwind_jit::Abort;

/// The callback every trampoline invocation dispatches to.
///
/// Terminates abruptly for `value < 1`; otherwise one Collatz step.
pub fn reference_callback(value: i32) -> Result<i32, Abort> {
    if value < 1 {
        return Err(Abort { value });
    }
    if value & 1 != 0 {
        Ok(value.wrapping_mul(3).wrapping_add(1))
    } else {
        Ok(value / 2)
    }
}

/// What a call with a given input must produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expectation {
    Value(i32),
    Abort,
}

impl Expectation {
    /// Computed independently of [`reference_callback`] so the two can cross-check each other.
    pub fn for_input(input: i32) -> Self {
        if input < 1 {
            Self::Abort
        } else if input & 1 != 0 {
            Self::Value(input.wrapping_mul(3).wrapping_add(1))
        } else {
            Self::Value(input / 2)
        }
    }

    /// Integer encoding used in reports: the expected value, or `-1` for an abort.
    pub fn sentinel(self) -> i32 {
        match self {
            Self::Value(value) => value,
            Self::Abort => -1,
        }
    }
}

impl fmt::Display for Expectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sentinel())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collatz_step() {
        assert_eq!(reference_callback(1), Ok(4));
        assert_eq!(reference_callback(2), Ok(1));
        assert_eq!(reference_callback(7), Ok(22));
        assert_eq!(reference_callback(0), Err(Abort { value: 0 }));
        assert_eq!(reference_callback(-1), Err(Abort { value: -1 }));
    }

    #[test]
    fn expectation_agrees_with_callback() {
        for input in -16..=0x1_0001 {
            let expected = Expectation::for_input(input);
            match reference_callback(input) {
                Ok(value) => assert_eq!(expected, Expectation::Value(value)),
                Err(_) => assert_eq!(expected, Expectation::Abort),
            }
        }
    }

    #[test]
    fn abort_renders_as_negative_sentinel() {
        assert_eq!(Expectation::Abort.to_string(), "-1");
        assert_eq!(Expectation::Value(4).to_string(), "4");
    }
}
