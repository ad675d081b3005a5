//! Deterministic PRNG
//!
//! Fast xorshift32 used wherever the effects core needs randomness
//! (spawn-timer desync, shake phase reseed). Deterministic and seedable so
//! tests can pin down behaviour; no external deps.

/// Xorshift32 state. A zero seed would lock the generator at zero, so it is
/// remapped to a fixed non-zero value.
#[derive(Debug, Clone)]
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x9e3779b9 } else { seed },
        }
    }

    /// Next value in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 17;
        self.state ^= self.state << 5;
        // Map the top 24 bits so the result stays below 1.0
        (self.state >> 8) as f32 / (1u32 << 24) as f32
    }
}

impl Default for XorShift32 {
    fn default() -> Self {
        Self::new(12345)
    }
}
