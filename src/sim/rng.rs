//! Deterministic hash RNG
//!
//! `random(seed)` is a pure function: the seed's decimal text is folded into
//! a 32-bit hash, pushed through `sin`, and the fractional part is returned.
//! There is no generator state, so two participants that agree on a seed
//! agree on the value without ever exchanging it.

use std::fmt::Display;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Map any displayable seed (number or string) to a value in `[0, 1)`
pub fn random<S: Display>(seed: S) -> f64 {
    let text = seed.to_string();
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(unit as i32);
    }
    let x = (hash as f64).sin() * 10_000.0;
    let frac = x - x.floor();
    // floor() of a value just below an integer can round the difference up to 1.0
    if frac >= 1.0 { 0.0 } else { frac }
}

/// Pick an index in `0..len` from a seed (0 when `len` is 0)
pub fn random_index<S: Display>(seed: S, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    ((random(seed) * len as f64) as usize).min(len - 1)
}

/// Seed distributed once per multi-participant session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedSeed(pub u64);

impl SharedSeed {
    /// Exclusive upper bound for generated seeds
    pub const RANGE: u64 = 1_000_000;

    /// Draw a fresh seed for a new session (host side only)
    pub fn generate() -> Self {
        let seed = rand::rng().random_range(0..Self::RANGE);
        log::info!("Generated shared seed {}", seed);
        Self(seed)
    }

    /// Offset the seed deterministically
    #[inline]
    pub fn offset(self, by: u64) -> u64 {
        self.0.wrapping_add(by)
    }
}
