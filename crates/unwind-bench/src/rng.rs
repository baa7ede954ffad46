//! Per-worker deterministic input stream.

/// Multiplier applied to the xorshift state before it is handed out.
const OUTPUT_MULTIPLIER: u64 = 0x2545_F491_4F6C_DD1D;

/// Weak but fast xorshift64* generator.
///
/// Seeded from the worker index so every worker replays the same inputs on every run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SequenceGenerator {
    state: u64,
}

impl SequenceGenerator {
    /// The state is forced odd, so it is never zero (a fixed point of xorshift).
    pub fn new(seed: u64) -> Self {
        Self {
            state: (seed << 1) | 1,
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(OUTPUT_MULTIPLIER)
    }
}
