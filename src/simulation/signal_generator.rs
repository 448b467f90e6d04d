//! Signal generation engine
//! Location: src/simulation/signal_generator.rs
//!
//! Per tick and per tag: waveform base value from the shared tick and fresh
//! phase jitter, plus the tag's perturbation offset, clamped to the tag range
//! and rounded to the configured precision.

use super::noise::RandomSource;
use super::state::{RuntimeState, TagCell, TagReading, TickSnapshot};
use crate::config::constants::engine;
use crate::topology::WaveformClass;
use crate::utils::bounds::{clamp_to_range, round_within_range};
use rayon::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneratorSettings {
    /// Decimal places of every generated value
    pub precision: u32,
    /// Half-width of the uniform phase jitter interval
    pub phase_jitter: f64,
    /// Compute tags on the rayon pool
    pub parallel: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            precision: engine::DEFAULT_PRECISION,
            phase_jitter: engine::DEFAULT_PHASE_JITTER,
            parallel: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalGenerator {
    settings: GeneratorSettings,
}

impl SignalGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Value of one tag at `tick`, always within `[min, max]`.
    ///
    /// A degenerate range yields its midpoint; non-finite intermediate
    /// results collapse to the midpoint as well.
    pub fn compute(
        &self,
        waveform: WaveformClass,
        tick: u64,
        min: f64,
        max: f64,
        offset: f64,
        jitter: f64,
    ) -> f64 {
        let midpoint = min + (max - min) / 2.0;

        let mut raw = waveform.base_value(tick, min, max, jitter) + offset;
        if !raw.is_finite() {
            raw = midpoint;
        }

        let clamped = clamp_to_range(raw, min, max);
        round_within_range(clamped, min, max, self.settings.precision)
    }

    fn compute_cell(&self, cell: &TagCell, tick: u64, jitter: f64) -> TagReading {
        let range = cell.range();
        let offset = cell.offset();
        TagReading {
            id: cell.id(),
            path: cell.path().to_string(),
            value: self.compute(cell.waveform(), tick, range.min(), range.max(), offset, jitter),
            offset,
        }
    }

    /// Compute every tag for `tick` without committing.
    ///
    /// All random draws happen up front and in topology order, so a seeded
    /// source gives the same values whether or not tags run in parallel.
    pub fn generate(
        &self,
        tick: u64,
        state: &RuntimeState,
        source: &mut dyn RandomSource,
    ) -> TickSnapshot {
        let spread = self.settings.phase_jitter.abs();
        let jitters: Vec<f64> = state
            .cells()
            .iter()
            .map(|cell| match cell.waveform() {
                WaveformClass::CompositeOscillator => 0.0,
                _ => source.uniform(-spread, spread),
            })
            .collect();

        let readings: Vec<TagReading> = if self.settings.parallel {
            state
                .cells()
                .par_iter()
                .zip(jitters.par_iter())
                .map(|(cell, &jitter)| self.compute_cell(cell, tick, jitter))
                .collect()
        } else {
            state
                .cells()
                .iter()
                .zip(jitters.iter())
                .map(|(cell, &jitter)| self.compute_cell(cell, tick, jitter))
                .collect()
        };

        TickSnapshot {
            tick: Some(tick),
            readings,
        }
    }

    /// Compute every tag for `tick` and commit the result as one snapshot
    pub fn step(
        &self,
        tick: u64,
        state: &RuntimeState,
        source: &mut dyn RandomSource,
    ) -> Arc<TickSnapshot> {
        let snapshot = self.generate(tick, state, source);
        state.commit(snapshot);
        state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::noise::{MidpointSource, RngSource};
    use crate::topology::{default_topology, Factory, WaveformRules};

    fn generator() -> SignalGenerator {
        SignalGenerator::new(GeneratorSettings::default())
    }

    #[test]
    fn test_speed_at_tick_zero() {
        let value = generator().compute(WaveformClass::FastOscillator, 0, 3.0, 7.0, 0.0, 0.0);
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_torque_at_tick_zero() {
        let value = generator().compute(WaveformClass::CompositeOscillator, 0, 10.0, 30.0, 0.0, 0.0);
        assert_eq!(value, 23.0);
    }

    #[test]
    fn test_clamped_above_maximum() {
        // slow oscillator peaks at the maximum on tick 0: 10 + 2.4 = 12.4
        let value = generator().compute(WaveformClass::SlowOscillator, 0, 0.0, 10.0, 2.4, 0.0);
        assert_eq!(value, 10.0);
    }

    #[test]
    fn test_clamped_below_minimum() {
        // a jitter of -pi/2 puts the fast oscillator at its trough
        let jitter = -std::f64::consts::FRAC_PI_2;
        let value = generator().compute(WaveformClass::FastOscillator, 0, 0.0, 10.0, -1.0, jitter);
        assert_eq!(value, 0.0);
    }

    #[test]
    fn test_formulas_match_at_later_ticks() {
        let g = SignalGenerator::new(GeneratorSettings {
            precision: 6,
            ..GeneratorSettings::default()
        });

        for tick in [1_u64, 7, 42, 999] {
            let t = tick as f64;
            let fast = 5.0 + 2.0 * (t * 0.1).sin();
            let slow = 55.0 + 35.0 * (t * 0.15).cos();
            let composite = 20.0 + 10.0 * (0.7 * (t * 0.08).sin() + 0.3 * (t * 0.2).cos());

            let got = g.compute(WaveformClass::FastOscillator, tick, 3.0, 7.0, 0.0, 0.0);
            assert!((got - fast).abs() < 1e-6);
            let got = g.compute(WaveformClass::SlowOscillator, tick, 20.0, 90.0, 0.0, 0.0);
            assert!((got - slow).abs() < 1e-6);
            let got = g.compute(WaveformClass::CompositeOscillator, tick, 10.0, 30.0, 0.0, 0.0);
            assert!((got - composite).abs() < 1e-6);
        }
    }

    #[test]
    fn test_degenerate_range() {
        for class in WaveformClass::ALL {
            assert_eq!(generator().compute(class, 13, 4.2, 4.2, 0.0, 0.3), 4.2);
        }
    }

    #[test]
    fn test_non_finite_offset_collapses_to_midpoint() {
        let value = generator().compute(WaveformClass::FastOscillator, 3, 0.0, 10.0, f64::NAN, 0.0);
        assert_eq!(value, 5.0);
    }

    #[test]
    fn test_values_rounded_to_precision() {
        let g = generator();
        for tick in 0..200 {
            let value = g.compute(WaveformClass::FastOscillator, tick, 3.0, 7.0, 0.123, 0.0);
            let scaled = value * 100.0;
            assert!((scaled - scaled.round()).abs() < 1e-6, "{} not rounded", value);
        }
    }

    #[test]
    fn test_generate_with_midpoint_source() {
        let factory = Factory::from_spec(&default_topology(), WaveformRules::default()).unwrap();
        let state = RuntimeState::new(&factory);
        let snapshot = generator().step(0, &state, &mut MidpointSource);

        assert_eq!(snapshot.tick, Some(0));
        let speed = factory.find("Line1", "Machine1", "speed").unwrap();
        let torque = factory.find("Line1", "Machine2", "torque").unwrap();
        let temperature = factory.find("Line1", "Machine1", "temperature").unwrap();
        assert_eq!(snapshot.value(speed), Some(5.0));
        assert_eq!(snapshot.value(torque), Some(23.0));
        assert_eq!(snapshot.value(temperature), Some(90.0));
        assert_eq!(state.current_value(speed), Some(5.0));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let factory = Factory::from_spec(&default_topology(), WaveformRules::default()).unwrap();
        let state = RuntimeState::new(&factory);

        let sequential = generator();
        let parallel = SignalGenerator::new(GeneratorSettings {
            parallel: true,
            ..GeneratorSettings::default()
        });

        for tick in 0..20 {
            let a = sequential.generate(tick, &state, &mut RngSource::seeded(tick));
            let b = parallel.generate(tick, &state, &mut RngSource::seeded(tick));
            assert_eq!(a, b);
        }
    }
}
