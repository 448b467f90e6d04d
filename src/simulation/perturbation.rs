//! Perturbation scheduler: slowly drifting additive noise per tag
//! Location: src/simulation/perturbation.rs

use super::noise::RandomSource;
use super::state::RuntimeState;
use tracing::trace;

/// Redraws every tag's offset on a fixed tick cadence.
///
/// An offset is `uniform(-f, f) * (max - min)` where `f` is the perturbation
/// fraction. Offsets are drawn once at startup and again on every tick with
/// `tick > 0 && tick % refresh_interval == 0`.
#[derive(Debug, Clone, Copy)]
pub struct PerturbationScheduler {
    refresh_interval: u64,
    fraction: f64,
}

impl PerturbationScheduler {
    /// `refresh_interval` of 0 is treated as 1
    pub fn new(refresh_interval: u64, fraction: f64) -> Self {
        Self {
            refresh_interval: refresh_interval.max(1),
            fraction: fraction.abs(),
        }
    }

    pub fn refresh_interval(&self) -> u64 {
        self.refresh_interval
    }

    pub fn is_due(&self, tick: u64) -> bool {
        tick > 0 && tick % self.refresh_interval == 0
    }

    pub fn draw_offset(&self, width: f64, source: &mut dyn RandomSource) -> f64 {
        source.uniform(-self.fraction, self.fraction) * width
    }

    /// Startup draw for every tag
    pub fn initialize(&self, state: &RuntimeState, source: &mut dyn RandomSource) {
        self.refresh(state, source);
    }

    /// Redraw all offsets. Completes before the caller computes any value.
    pub fn refresh(&self, state: &RuntimeState, source: &mut dyn RandomSource) {
        for cell in state.cells() {
            let offset = self.draw_offset(cell.range().width(), source);
            cell.set_offset(offset);
        }
        trace!(tags = state.len(), "Perturbation offsets refreshed");
    }

    /// Refresh when `tick` is on the cadence; returns whether it did
    pub fn maybe_refresh(
        &self,
        tick: u64,
        state: &RuntimeState,
        source: &mut dyn RandomSource,
    ) -> bool {
        if self.is_due(tick) {
            self.refresh(state, source);
            true
        } else {
            false
        }
    }
}

impl Default for PerturbationScheduler {
    fn default() -> Self {
        use crate::config::constants::engine;
        Self::new(
            engine::DEFAULT_REFRESH_INTERVAL_TICKS,
            engine::DEFAULT_PERTURBATION_FRACTION,
        )
    }
}
