//! Configuration management for the TTS playground
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (TTS_PLAYGROUND__ prefix)

pub mod settings;

pub use settings::{
    load_settings, BackendConfig, ObservabilityConfig, PlaygroundConfig, ServerConfig, Settings,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
