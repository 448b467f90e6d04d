//! Factory-Sim: live telemetry for a virtual factory
//!
//! This library turns a static description of production lines, machines and
//! measured tags into an evolving time series per tag and hands every value
//! to a publish adapter. It features:
//!
//! - A validated, immutable topology model with name-driven waveform classes
//! - A signal generation engine combining waveforms, phase jitter and
//!   slowly refreshed perturbation offsets, clamped and rounded per tag
//! - Atomic per-tick snapshots of the runtime state
//! - Layered TOML configuration with environment overrides
//! - An in-memory address space and a tracing publisher
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use factory_sim::config::SimulatorConfig;
//! use factory_sim::publish::InMemoryAddressSpace;
//! use factory_sim::simulator::{shutdown_channel, FactorySimulator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SimulatorConfig::default();
//!     let mut simulator = FactorySimulator::new(&config, InMemoryAddressSpace::default()).await?;
//!
//!     let (_shutdown, signal) = shutdown_channel();
//!     let summary = simulator.run_until(Some(10), signal).await;
//!     println!("Published {} values", summary.published);
//!
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod publish;
pub mod simulation;
pub mod simulator;
pub mod topology;
pub mod utils;

// Re-export commonly used types for convenience
pub use config::{ConfigLoader, SimulatorConfig};
pub use error::{ConfigError, PublishError, SimError, SimResult, StateError, TopologyError};
pub use publish::{InMemoryAddressSpace, PublishAdapter, TracingPublisher};
pub use simulation::{RuntimeState, SignalGenerator, TickSnapshot};
pub use simulator::{shutdown_channel, CycleReport, FactorySimulator, RunSummary};
pub use topology::{Factory, TagId, WaveformClass};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: "Signal generation engine for simulated factory telemetry".to_string(),
        features: vec![
            "Typed factory topology".to_string(),
            "Waveform and perturbation signal engine".to_string(),
            "Atomic tick snapshots".to_string(),
            "Layered TOML configuration".to_string(),
            "Pluggable publish adapters".to_string(),
        ],
    }
}

/// Library version information
#[derive(Debug, Clone)]
pub struct VersionInfo {
    /// Library name
    pub name: String,
    /// Version string
    pub version: String,
    /// Description
    pub description: String,
    /// List of features
    pub features: Vec<String>,
}
