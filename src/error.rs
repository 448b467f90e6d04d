// src/error.rs
//! Unified error handling for the factory simulator
//!
//! Each concern owns a focused error enum; [`SimError`] unifies them so that
//! startup code can propagate any of them with `?`.

use thiserror::Error;

/// Errors raised while building the topology model
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopologyError {
    #[error("factory defines no lines")]
    EmptyFactory,

    #[error("empty {kind} name under '{parent}'")]
    EmptyName { kind: &'static str, parent: String },

    #[error("tag '{path}' has inverted bounds: minimum {min} must be below maximum {max}")]
    InvertedBounds { path: String, min: f64, max: f64 },

    #[error("tag '{path}' has a non-finite bound")]
    NonFiniteBound { path: String },

    #[error("duplicate line name: {0}")]
    DuplicateLine(String),

    #[error("duplicate machine name '{machine}' in line '{line}'")]
    DuplicateMachine { line: String, machine: String },

    #[error("duplicate tag name '{tag}' in machine '{line}/{machine}'")]
    DuplicateTag {
        line: String,
        machine: String,
        tag: String,
    },

    #[error("no waveform class known for tag '{path}'")]
    UnknownWaveform { path: String },
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("configuration parse error: {0}")]
    Parse(String),

    #[error("configuration validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Failures reported by a publish adapter
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PublishError {
    #[error("write rejected for '{node}': {reason}")]
    Rejected { node: String, reason: String },

    #[error("server unreachable: {0}")]
    Unreachable(String),

    #[error("unknown variable handle: {0}")]
    UnknownHandle(String),

    #[error("registration failed: {0}")]
    Registration(String),
}

/// Errors from the tag runtime state
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    #[error("unknown tag: {0}")]
    UnknownTag(String),

    #[error("value {value} for '{path}' is outside [{min}, {max}]")]
    OutOfRange {
        path: String,
        value: f64,
        min: f64,
        max: f64,
    },
}

/// Top-level error type of the crate
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    State(#[from] StateError),
}

/// Result alias for simulator operations
pub type SimResult<T> = Result<T, SimError>;
