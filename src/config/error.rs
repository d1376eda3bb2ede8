//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("Failed to read configuration file {path}: {reason}")]
    FileRead { path: String, reason: String },

    #[error("Invalid YAML in {source_name}: {reason}")]
    InvalidYaml { source_name: String, reason: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Invalid environment override {variable}={value}: {reason}")]
    InvalidEnvOverride {
        variable: String,
        value: String,
        reason: String,
    },
}

impl ConfigurationError {
    pub fn invalid_yaml(source_name: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidYaml {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
