// src/config/constants.rs
//! System-wide configuration constants

/// Signal generation defaults
pub mod engine {
    pub const DEFAULT_CYCLE_INTERVAL_MS: u64 = 1000;
    pub const DEFAULT_RANDOM_PACING_MIN_MS: u64 = 1000;
    pub const DEFAULT_RANDOM_PACING_MAX_MS: u64 = 3000;

    pub const DEFAULT_REFRESH_INTERVAL_TICKS: u64 = 5;
    pub const MIN_REFRESH_INTERVAL_TICKS: u64 = 1;

    pub const DEFAULT_PRECISION: u32 = 2;
    pub const MAX_PRECISION: u32 = 10;

    /// Offsets are drawn from +/- this fraction of the tag's range width
    pub const DEFAULT_PERTURBATION_FRACTION: f64 = 0.1;
    pub const MAX_PERTURBATION_FRACTION: f64 = 1.0;

    /// Phase jitter is drawn from +/- this many radians
    pub const DEFAULT_PHASE_JITTER: f64 = 0.5;
    /// Half a period; wider jitter only repeats phases
    pub const MAX_PHASE_JITTER: f64 = std::f64::consts::PI;
}

/// Identity of the simulated data-access server
pub mod server {
    pub const DEFAULT_ENDPOINT: &str = "opc.tcp://0.0.0.0:4840/factory/";
    pub const DEFAULT_SERVER_NAME: &str = "Multi-Line OPC UA Factory Simulator";
    pub const DEFAULT_NAMESPACE_URI: &str = "http://helloworld.com/opcua/factory/";
    pub const ROOT_OBJECT_NAME: &str = "Factory";
    pub const INITIAL_VARIABLE_VALUE: f64 = 0.0;
}

/// Configuration file locations and environment overrides
pub mod paths {
    pub const SYSTEM_CONFIG_PATH: &str = "/etc/factory-sim/config.toml";
    pub const USER_CONFIG_DIR: &str = ".config/factory-sim";
    pub const DEFAULT_CONFIG_FILE: &str = "factory-sim.toml";
    pub const LOCAL_CONFIG_FILE: &str = "config/local.toml";

    pub const ENV_PREFIX: &str = "FACTORY_";
    /// Separates the section from the key: `FACTORY_ENGINE__PRECISION`
    pub const ENV_SECTION_SEPARATOR: &str = "__";
}

pub mod logging {
    pub const DEFAULT_LEVEL: &str = "info";
}
