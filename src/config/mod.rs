// src/config/mod.rs
//! Simulator configuration

pub mod constants;
pub mod loader;

pub use constants::*;
pub use loader::ConfigLoader;

use crate::error::TopologyError;
use crate::simulation::{CyclePacing, GeneratorSettings, PerturbationScheduler};
use crate::topology::{
    default_topology, Factory, TopologySpec, WaveformClass, WaveformPolicy, WaveformRules,
};
use serde::{Deserialize, Serialize};

/// Complete simulator configuration
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub engine: EngineSettings,

    #[serde(default)]
    pub pacing: CyclePacing,

    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Embedded default plant when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topology: Option<TopologySpec>,
}

/// Signal generation settings
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EngineSettings {
    #[serde(default = "defaults::refresh_interval_ticks")]
    pub refresh_interval_ticks: u64,

    #[serde(default = "defaults::precision")]
    pub precision: u32,

    #[serde(default = "defaults::perturbation_fraction")]
    pub perturbation_fraction: f64,

    #[serde(default = "defaults::phase_jitter")]
    pub phase_jitter: f64,

    #[serde(default)]
    pub parallel: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default = "defaults::waveform_policy")]
    pub waveform_policy: WaveformPolicy,

    #[serde(default = "defaults::default_waveform")]
    pub default_waveform: WaveformClass,
}

/// Identity of the server the values are published to
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    #[serde(default = "defaults::server_name")]
    pub server_name: String,

    #[serde(default = "defaults::namespace_uri")]
    pub namespace_uri: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "defaults::level")]
    pub level: String,

    /// Log every published value at info level instead of debug
    #[serde(default)]
    pub log_writes: bool,
}

mod defaults {
    use crate::config::constants::*;
    use crate::topology::{WaveformClass, WaveformPolicy};

    pub fn refresh_interval_ticks() -> u64 { engine::DEFAULT_REFRESH_INTERVAL_TICKS }
    pub fn precision() -> u32 { engine::DEFAULT_PRECISION }
    pub fn perturbation_fraction() -> f64 { engine::DEFAULT_PERTURBATION_FRACTION }
    pub fn phase_jitter() -> f64 { engine::DEFAULT_PHASE_JITTER }
    pub fn waveform_policy() -> WaveformPolicy { WaveformPolicy::Lenient }
    pub fn default_waveform() -> WaveformClass { WaveformClass::SlowOscillator }

    pub fn endpoint() -> String { server::DEFAULT_ENDPOINT.to_string() }
    pub fn server_name() -> String { server::DEFAULT_SERVER_NAME.to_string() }
    pub fn namespace_uri() -> String { server::DEFAULT_NAMESPACE_URI.to_string() }

    pub fn level() -> String { logging::DEFAULT_LEVEL.to_string() }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            refresh_interval_ticks: defaults::refresh_interval_ticks(),
            precision: defaults::precision(),
            perturbation_fraction: defaults::perturbation_fraction(),
            phase_jitter: defaults::phase_jitter(),
            parallel: false,
            seed: None,
            waveform_policy: defaults::waveform_policy(),
            default_waveform: defaults::default_waveform(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            server_name: defaults::server_name(),
            namespace_uri: defaults::namespace_uri(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: defaults::level(),
            log_writes: false,
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            engine: EngineSettings::default(),
            pacing: CyclePacing::default(),
            server: ServerSettings::default(),
            logging: LoggingSettings::default(),
            topology: None,
        }
    }
}

impl SimulatorConfig {
    /// Check value ranges; returns every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let engine_cfg = &self.engine;

        if engine_cfg.refresh_interval_ticks < engine::MIN_REFRESH_INTERVAL_TICKS {
            errors.push(format!(
                "engine.refresh_interval_ticks must be at least {}",
                engine::MIN_REFRESH_INTERVAL_TICKS
            ));
        }

        if engine_cfg.precision > engine::MAX_PRECISION {
            errors.push(format!(
                "engine.precision ({}) must not exceed {}",
                engine_cfg.precision,
                engine::MAX_PRECISION
            ));
        }

        if !(0.0..=engine::MAX_PERTURBATION_FRACTION).contains(&engine_cfg.perturbation_fraction) {
            errors.push(format!(
                "engine.perturbation_fraction ({}) must be within [0, {}]",
                engine_cfg.perturbation_fraction,
                engine::MAX_PERTURBATION_FRACTION
            ));
        }

        if !(0.0..=engine::MAX_PHASE_JITTER).contains(&engine_cfg.phase_jitter) {
            errors.push(format!(
                "engine.phase_jitter ({}) must be within [0, {}]",
                engine_cfg.phase_jitter,
                engine::MAX_PHASE_JITTER
            ));
        }

        match self.pacing {
            CyclePacing::Fixed { interval_ms } if interval_ms == 0 => {
                errors.push("pacing.interval_ms must be greater than 0".to_string());
            }
            CyclePacing::Random { min_ms, max_ms } if max_ms == 0 || min_ms > max_ms => {
                errors.push(format!(
                    "pacing random interval [{}, {}] must be non-empty and above 0",
                    min_ms, max_ms
                ));
            }
            _ => {}
        }

        if self.server.endpoint.trim().is_empty() {
            errors.push("server.endpoint cannot be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn waveform_rules(&self) -> WaveformRules {
        WaveformRules {
            policy: self.engine.waveform_policy,
            default_class: self.engine.default_waveform,
        }
    }

    pub fn generator_settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            precision: self.engine.precision,
            phase_jitter: self.engine.phase_jitter,
            parallel: self.engine.parallel,
        }
    }

    pub fn perturbation_scheduler(&self) -> PerturbationScheduler {
        PerturbationScheduler::new(
            self.engine.refresh_interval_ticks,
            self.engine.perturbation_fraction,
        )
    }

    /// Validated factory from the configured topology, or the default plant
    pub fn build_factory(&self) -> Result<Factory, TopologyError> {
        match &self.topology {
            Some(spec) => Factory::from_spec(spec, self.waveform_rules()),
            None => Factory::from_spec(&default_topology(), self.waveform_rules()),
        }
    }
}
