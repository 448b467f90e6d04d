//! Shared logical clock and cycle pacing
//! Location: src/simulation/clock.rs

use super::noise::RandomSource;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Monotonic tick counter; starts at 0 and never resets
#[derive(Debug, Default)]
pub struct Clock {
    tick: AtomicU64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.tick.load(Ordering::Acquire)
    }

    /// Move to the next tick, returning the new value
    pub fn advance(&self) -> u64 {
        self.tick.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Wait between two cycles
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum CyclePacing {
    /// Constant interval
    Fixed { interval_ms: u64 },
    /// Uniform in `[min_ms, max_ms]`
    Random { min_ms: u64, max_ms: u64 },
}

impl CyclePacing {
    /// Random pacing over the default one-to-three second window
    pub fn random() -> Self {
        use crate::config::constants::engine;
        CyclePacing::Random {
            min_ms: engine::DEFAULT_RANDOM_PACING_MIN_MS,
            max_ms: engine::DEFAULT_RANDOM_PACING_MAX_MS,
        }
    }

    pub fn next_delay(&self, source: &mut dyn RandomSource) -> Duration {
        match *self {
            CyclePacing::Fixed { interval_ms } => Duration::from_millis(interval_ms),
            CyclePacing::Random { min_ms, max_ms } => {
                let ms = source.uniform(min_ms as f64, max_ms as f64);
                Duration::from_millis(ms.round() as u64)
            }
        }
    }
}

impl Default for CyclePacing {
    fn default() -> Self {
        CyclePacing::Fixed {
            interval_ms: crate::config::constants::engine::DEFAULT_CYCLE_INTERVAL_MS,
        }
    }
}
