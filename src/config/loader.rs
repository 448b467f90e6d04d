// src/config/loader.rs
//! Layered configuration loader
//!
//! Defaults are serialised to a TOML tree, every existing configuration file
//! is merged over it in order, then `FACTORY_<SECTION>__<KEY>` environment
//! variables are applied. The merged tree is validated and deserialised.

use crate::config::{constants::paths, SimulatorConfig};
use crate::error::ConfigError;
use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Configuration loader
pub struct ConfigLoader {
    config_paths: Vec<PathBuf>,
    current_config: Arc<RwLock<SimulatorConfig>>,
}

impl ConfigLoader {
    /// Loader over the standard search paths
    pub fn new() -> Self {
        Self::with_paths(Self::discover_config_paths())
    }

    /// Loader over explicit paths, later paths taking precedence
    pub fn with_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            config_paths: paths,
            current_config: Arc::new(RwLock::new(SimulatorConfig::default())),
        }
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    /// Load, merge, override from the environment and validate
    pub fn load(&mut self) -> Result<SimulatorConfig, ConfigError> {
        let config = self.load_and_merge_configs(std::env::vars())?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Like [`load`](Self::load) with an explicit set of environment variables
    pub fn load_with_env<I>(&mut self, vars: I) -> Result<SimulatorConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config = self.load_and_merge_configs(vars)?;
        *self.current_config.write() = config.clone();
        Ok(config)
    }

    /// Last successfully loaded configuration
    pub fn current(&self) -> SimulatorConfig {
        self.current_config.read().clone()
    }

    /// Parse and validate a single file on its own
    pub fn validate_config_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let mut merged = default_tree()?;
        merge_toml_values(&mut merged, load_config_file(path)?);
        into_config(merged).map(|_| ())
    }

    /// Write the current configuration as TOML
    pub fn export_config<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let toml_content = toml::to_string_pretty(&self.current())?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    fn load_and_merge_configs<I>(&self, vars: I) -> Result<SimulatorConfig, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut merged = default_tree()?;

        for config_path in &self.config_paths {
            match load_config_file(config_path) {
                Ok(file_config) => {
                    debug!(path = %config_path.display(), "Merging configuration file");
                    merge_toml_values(&mut merged, file_config);
                }
                Err(ConfigError::FileNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        apply_environment_overrides(&mut merged, vars);
        into_config(merged)
    }

    fn discover_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(paths::SYSTEM_CONFIG_PATH)];

        if let Some(home_dir) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
            paths.push(
                PathBuf::from(home_dir)
                    .join(paths::USER_CONFIG_DIR)
                    .join("config.toml"),
            );
        }

        paths.push(PathBuf::from(paths::DEFAULT_CONFIG_FILE));
        paths.push(PathBuf::from(paths::LOCAL_CONFIG_FILE));
        paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn default_tree() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(SimulatorConfig::default()).map_err(ConfigError::from)
}

fn into_config(merged: toml::Value) -> Result<SimulatorConfig, ConfigError> {
    let config: SimulatorConfig = merged
        .try_into()
        .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
    config.validate().map_err(ConfigError::Validation)?;
    Ok(config)
}

fn load_config_file<P: AsRef<Path>>(path: P) -> Result<toml::Value, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: toml::Value = toml::from_str(&content)?;
    Ok(config)
}

fn merge_toml_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                if let Some(base_value) = base_table.get_mut(&key) {
                    merge_toml_values(base_value, value);
                } else {
                    base_table.insert(key, value);
                }
            }
        }
        (base_value, overlay_value) => {
            *base_value = overlay_value;
        }
    }
}

fn apply_environment_overrides<I>(config: &mut toml::Value, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let Some(rest) = key.strip_prefix(paths::ENV_PREFIX) else {
            continue;
        };
        let Some((section, field)) = rest.split_once(paths::ENV_SECTION_SEPARATOR) else {
            continue;
        };
        if section.is_empty() || field.is_empty() {
            continue;
        }

        debug!(variable = %key, "Applying environment override");
        set_nested_value(
            config,
            &section.to_lowercase(),
            &field.to_lowercase(),
            parse_env_value(&value),
        );
    }
}

fn parse_env_value(value: &str) -> toml::Value {
    if let Ok(int_val) = value.parse::<i64>() {
        toml::Value::Integer(int_val)
    } else if let Ok(float_val) = value.parse::<f64>() {
        toml::Value::Float(float_val)
    } else if let Ok(bool_val) = value.parse::<bool>() {
        toml::Value::Boolean(bool_val)
    } else {
        toml::Value::String(value.to_string())
    }
}

fn set_nested_value(config: &mut toml::Value, section: &str, field: &str, value: toml::Value) {
    if let toml::Value::Table(root) = config {
        let entry = root
            .entry(section.to_string())
            .or_insert_with(|| toml::Value::Table(toml::value::Table::new()));
        if let toml::Value::Table(table) = entry {
            table.insert(field.to_string(), value);
        }
    }
}
