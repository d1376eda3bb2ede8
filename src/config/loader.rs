//! Configuration Loader
//!
//! Environment-aware loading: a YAML file supplies the base settings, an
//! optional section named after the current environment (`development`,
//! `test`, `production`) is merged over them, and `TASKER_FANOUT_*` variables
//! have the last word.

use serde_yaml::Value as YamlValue;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::error::{ConfigResult, ConfigurationError};
use super::{FanOutConfig, SubstrateKind};
use crate::orchestration::types::FailurePolicy;

const ENVIRONMENT_SECTIONS: [&str; 3] = ["development", "test", "production"];

/// Loads [`FanOutConfig`] from YAML and the process environment
pub struct ConfigLoader;

impl ConfigLoader {
    /// Variable naming the configuration file
    pub const CONFIG_PATH_VAR: &'static str = "TASKER_FANOUT_CONFIG";
    /// File used when [`Self::CONFIG_PATH_VAR`] is unset
    pub const DEFAULT_CONFIG_PATH: &'static str = "config/fanout.yaml";

    /// Load configuration for the detected environment.
    ///
    /// A missing configuration file is not an error; defaults are used.
    pub fn load() -> ConfigResult<FanOutConfig> {
        let environment = Self::detect_environment();
        let path = env::var(Self::CONFIG_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(Self::DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            Self::load_from_path(&path, &environment)?
        } else {
            debug!(
                path = %path.display(),
                "No fan-out configuration file found, using defaults"
            );
            FanOutConfig::default()
        };

        Self::apply_env_overrides(&mut config, |name| env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file for an explicit environment, without
    /// environment-variable overrides
    pub fn load_from_path(path: &Path, environment: &str) -> ConfigResult<FanOutConfig> {
        let yaml = std::fs::read_to_string(path).map_err(|e| ConfigurationError::FileRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_yaml_str(&yaml, environment, &path.display().to_string())
    }

    /// Parse configuration from YAML text for an explicit environment
    pub fn from_yaml_str(
        yaml: &str,
        environment: &str,
        source_name: &str,
    ) -> ConfigResult<FanOutConfig> {
        let mut yaml_data: YamlValue = serde_yaml::from_str(yaml)
            .map_err(|e| ConfigurationError::invalid_yaml(source_name, e))?;

        if yaml_data.is_null() {
            yaml_data = YamlValue::Mapping(Default::default());
        }

        if let Some(env_overrides) = yaml_data
            .get(YamlValue::String(environment.to_string()))
            .cloned()
        {
            debug!(environment = %environment, "Applying environment-specific overrides");
            Self::merge_yaml_values(&mut yaml_data, env_overrides);
        }

        if let YamlValue::Mapping(ref mut map) = yaml_data {
            for section in ENVIRONMENT_SECTIONS {
                map.remove(YamlValue::String(section.to_string()));
            }
        }

        let config: FanOutConfig = serde_yaml::from_value(yaml_data).map_err(|e| {
            ConfigurationError::invalid_yaml(
                source_name,
                format!("Failed to deserialize configuration: {e}"),
            )
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `TASKER_FANOUT_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(config: &mut FanOutConfig, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("TASKER_FANOUT_FAILURE_POLICY") {
            config.failure_policy = match value.trim() {
                "collect_all" => FailurePolicy::CollectAll,
                "fail_fast" => FailurePolicy::FailFast,
                _ => {
                    return Err(invalid_override(
                        "TASKER_FANOUT_FAILURE_POLICY",
                        &value,
                        "expected collect_all or fail_fast",
                    ))
                }
            };
        }

        if let Some(value) = lookup("TASKER_FANOUT_MAX_CONCURRENT_TASKS") {
            config.max_concurrent_tasks =
                parse_optional(&value, "TASKER_FANOUT_MAX_CONCURRENT_TASKS")?;
        }

        if let Some(value) = lookup("TASKER_FANOUT_DEFAULT_TASK_TIMEOUT_MS") {
            config.default_task_timeout_ms =
                parse_optional(&value, "TASKER_FANOUT_DEFAULT_TASK_TIMEOUT_MS")?;
        }

        if let Some(value) = lookup("TASKER_FANOUT_SUBSTRATE") {
            config.substrate.kind = match value.trim() {
                "shared" => SubstrateKind::Shared,
                "dedicated" => SubstrateKind::Dedicated,
                _ => {
                    return Err(invalid_override(
                        "TASKER_FANOUT_SUBSTRATE",
                        &value,
                        "expected shared or dedicated",
                    ))
                }
            };
        }

        if let Some(value) = lookup("TASKER_FANOUT_WORKER_THREADS") {
            config.substrate.worker_threads =
                parse_optional(&value, "TASKER_FANOUT_WORKER_THREADS")?;
        }

        Ok(())
    }

    /// Current environment name
    pub fn detect_environment() -> String {
        env::var("TASKER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    /// Recursively merge YAML values (environment overrides into base config)
    fn merge_yaml_values(base: &mut YamlValue, override_value: YamlValue) {
        match (&mut *base, override_value) {
            (YamlValue::Mapping(base_map), YamlValue::Mapping(override_map)) => {
                for (key, value) in override_map {
                    if let Some(existing_value) = base_map.get_mut(&key) {
                        Self::merge_yaml_values(existing_value, value);
                    } else {
                        base_map.insert(key, value);
                    }
                }
            }
            (base_ref, override_val) => {
                *base_ref = override_val;
            }
        }
    }
}

fn invalid_override(variable: &str, value: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::InvalidEnvOverride {
        variable: variable.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Empty or `none` clears the setting
fn parse_optional<T>(value: &str, variable: &str) -> ConfigResult<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    trimmed
        .parse::<T>()
        .map(Some)
        .map_err(|e| invalid_override(variable, value, &e.to_string()))
}
