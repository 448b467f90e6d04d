//! Random sources for phase jitter, perturbation offsets and pacing
//! Location: src/simulation/noise.rs

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Uniform random draws, injectable for deterministic tests
pub trait RandomSource: Send {
    /// Draw uniformly from `[low, high]`. Returns `low` when `high <= low`.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Default source backed by `StdRng`
pub struct RngSource {
    rng: StdRng,
}

impl RngSource {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Seeded when `seed` is given, entropy otherwise
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl RandomSource for RngSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !low.is_finite() || !high.is_finite() || high <= low {
            return low;
        }
        if !(high - low).is_finite() {
            // span overflows; interpolate between the ends instead
            let t: f64 = self.rng.gen();
            return low * (1.0 - t) + high * t;
        }
        self.rng.gen_range(low..=high)
    }
}

/// Always returns the centre of the requested interval.
///
/// Jitter drawn from `[-j, j]` is exactly zero and so is every perturbation
/// offset, which makes generated values follow the bare waveform formulas.
#[derive(Debug, Default, Clone, Copy)]
pub struct MidpointSource;

impl RandomSource for MidpointSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if high <= low {
            return low;
        }
        low + (high - low) / 2.0
    }
}

/// Replays a fixed sequence of unit fractions in `[0, 1]`, then repeats the
/// last one. Each draw maps its fraction onto the requested interval.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    fractions: VecDeque<f64>,
    last: f64,
}

impl ScriptedSource {
    pub fn new(fractions: impl IntoIterator<Item = f64>) -> Self {
        Self {
            fractions: fractions.into_iter().collect(),
            last: 0.5,
        }
    }
}

impl RandomSource for ScriptedSource {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if let Some(next) = self.fractions.pop_front() {
            self.last = next.clamp(0.0, 1.0);
        }
        if high <= low {
            return low;
        }
        low + (high - low) * self.last
    }
}
