//! Waveform classes and the name-driven class lookup
//! Location: src/topology/waveform.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic shape that drives a tag's base value over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveformClass {
    /// `sin(tick * 0.1 + jitter)`: speeds, rotation rates, flows
    #[serde(alias = "fast")]
    FastOscillator,
    /// `cos(tick * 0.15 + jitter)`: temperatures, pressures, vibration
    #[serde(alias = "slow")]
    SlowOscillator,
    /// `0.7*sin(tick*0.08) + 0.3*cos(tick*0.2)`: torque, humidity
    #[serde(alias = "composite")]
    CompositeOscillator,
}

/// What to do with a tag whose name matches no known class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformPolicy {
    /// Assign the configured default class
    Lenient,
    /// Reject the topology
    Strict,
}

const FAST_NAMES: &[&str] = &["speed", "rpm", "flow_rate"];
const SLOW_NAMES: &[&str] = &["temperature", "pressure", "vibration"];
const COMPOSITE_NAMES: &[&str] = &["torque", "humidity"];

impl WaveformClass {
    pub const ALL: [WaveformClass; 3] = [
        WaveformClass::FastOscillator,
        WaveformClass::SlowOscillator,
        WaveformClass::CompositeOscillator,
    ];

    /// Resolve a class from a tag name.
    ///
    /// The name is normalised (lowercase, `-` and spaces become `_`) and
    /// matched either as a whole or by its trailing `_`-separated suffix, so
    /// `Motor-Speed` resolves like `speed`.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                other => other.to_ascii_lowercase(),
            })
            .collect();

        let matches = |keyword: &&str| {
            normalized == **keyword
                || normalized
                    .strip_suffix(*keyword)
                    .is_some_and(|prefix| prefix.ends_with('_'))
        };

        if FAST_NAMES.iter().any(matches) {
            Some(WaveformClass::FastOscillator)
        } else if SLOW_NAMES.iter().any(matches) {
            Some(WaveformClass::SlowOscillator)
        } else if COMPOSITE_NAMES.iter().any(matches) {
            Some(WaveformClass::CompositeOscillator)
        } else {
            None
        }
    }

    /// Normalised shape in `[-1, 1]` at `tick`.
    ///
    /// `jitter` is phase noise; the composite shape ignores it.
    pub fn shape(self, tick: u64, jitter: f64) -> f64 {
        let t = tick as f64;
        match self {
            WaveformClass::FastOscillator => (t * 0.1 + jitter).sin(),
            WaveformClass::SlowOscillator => (t * 0.15 + jitter).cos(),
            WaveformClass::CompositeOscillator => 0.7 * (t * 0.08).sin() + 0.3 * (t * 0.2).cos(),
        }
    }

    /// Base value for a range `[min, max]` before perturbation and clamping
    pub fn base_value(self, tick: u64, min: f64, max: f64, jitter: f64) -> f64 {
        let amplitude = (max - min) / 2.0;
        let midpoint = min + amplitude;
        if amplitude == 0.0 {
            return midpoint;
        }
        midpoint + amplitude * self.shape(tick, jitter)
    }
}

impl fmt::Display for WaveformClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaveformClass::FastOscillator => write!(f, "fast-oscillator"),
            WaveformClass::SlowOscillator => write!(f, "slow-oscillator"),
            WaveformClass::CompositeOscillator => write!(f, "composite-oscillator"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(WaveformClass::from_tag_name("speed"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("rpm"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("flow_rate"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("temperature"), Some(WaveformClass::SlowOscillator));
        assert_eq!(WaveformClass::from_tag_name("pressure"), Some(WaveformClass::SlowOscillator));
        assert_eq!(WaveformClass::from_tag_name("vibration"), Some(WaveformClass::SlowOscillator));
        assert_eq!(WaveformClass::from_tag_name("torque"), Some(WaveformClass::CompositeOscillator));
        assert_eq!(WaveformClass::from_tag_name("humidity"), Some(WaveformClass::CompositeOscillator));
    }

    #[test]
    fn test_normalized_and_suffixed_names() {
        assert_eq!(WaveformClass::from_tag_name("Flow-Rate"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("flow rate"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("motor_speed"), Some(WaveformClass::FastOscillator));
        assert_eq!(WaveformClass::from_tag_name("oil-temperature"), Some(WaveformClass::SlowOscillator));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(WaveformClass::from_tag_name("voltage"), None);
        assert_eq!(WaveformClass::from_tag_name(""), None);
        // suffix must sit on a word boundary
        assert_eq!(WaveformClass::from_tag_name("airspeed"), None);
    }

    #[test]
    fn test_base_value_at_tick_zero() {
        let fast = WaveformClass::FastOscillator.base_value(0, 3.0, 7.0, 0.0);
        assert_eq!(fast, 5.0);

        let slow = WaveformClass::SlowOscillator.base_value(0, 20.0, 90.0, 0.0);
        assert_eq!(slow, 90.0);

        let composite = WaveformClass::CompositeOscillator.base_value(0, 10.0, 30.0, 0.4);
        assert!((composite - 23.0).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_range_is_constant() {
        for class in WaveformClass::ALL {
            for tick in [0, 1, 17, 1_000_000] {
                assert_eq!(class.base_value(tick, 4.2, 4.2, 0.3), 4.2);
            }
        }
    }

    #[test]
    fn test_serde_aliases() {
        #[derive(Deserialize)]
        struct Wrapper {
            class: WaveformClass,
        }

        let parsed: Wrapper = toml::from_str("class = \"fast\"").unwrap();
        assert_eq!(parsed.class, WaveformClass::FastOscillator);

        let parsed: Wrapper = toml::from_str("class = \"composite_oscillator\"").unwrap();
        assert_eq!(parsed.class, WaveformClass::CompositeOscillator);
    }
}
