#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! rpcgen Configuration
//!
//! This crate provides the generator configuration shared by every stage.
//! It handles loading, saving, and validating configuration files that specify:
//! - The naming style applied to generated file names
//! - Logging configuration
//! - Generation policy switches (toolchain checks, call-stage strictness)
//!
//! Configuration is stored in TOML format and can be loaded from files or created
//! with sensible defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use convert_case::{Case, Casing};
use serde::Deserialize;
use thiserror::Error;

pub mod run_context;
pub use run_context::{RunContext, RunContextBuilder};

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    /// Failed to parse the TOML configuration file
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    /// Configuration file was not found at the specified path
    #[error("Config file not found at: {0}")]
    NotFound(PathBuf),
    /// Could not locate the user's configuration directory
    #[error("Could not find user config directory")]
    ConfigDirUnavailable,
    /// A value is present but unusable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File naming settings
    pub naming: NamingConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Generation policy settings
    pub generation: GenerationConfig,
}

/// File naming configuration
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Style applied to generated file names
    pub style: NamingStyle,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log file path (optional)
    pub file: Option<PathBuf>,
}

/// Generation policy configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Verify that `protoc` and `go` are on `PATH` before generating
    pub check_toolchain: bool,
    /// Abort immediately when the call stage fails instead of deferring its error
    pub strict_call_stage: bool,
}

/// Naming style for generated file names.
///
/// Applied to a name such as `SayHelloLogic`:
/// - `gozero` → `sayhellologic`
/// - `go_zero` → `say_hello_logic`
/// - `goZero` → `sayHelloLogic`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum NamingStyle {
    /// All lower case, no separators
    #[default]
    #[serde(rename = "gozero")]
    Flat,
    /// Lower snake case
    #[serde(rename = "go_zero")]
    Snake,
    /// Lower camel case
    #[serde(rename = "goZero")]
    Camel,
}

impl NamingStyle {
    /// Format `name` according to this style
    pub fn format(&self, name: &str) -> String {
        match self {
            NamingStyle::Flat => name.to_case(Case::Snake).replace('_', ""),
            NamingStyle::Snake => name.to_case(Case::Snake),
            NamingStyle::Camel => name.to_case(Case::Camel),
        }
    }

    /// The configuration spelling of this style
    pub fn as_str(&self) -> &'static str {
        match self {
            NamingStyle::Flat => "gozero",
            NamingStyle::Snake => "go_zero",
            NamingStyle::Camel => "goZero",
        }
    }
}

impl fmt::Display for NamingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for NamingStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gozero" => Ok(NamingStyle::Flat),
            "go_zero" => Ok(NamingStyle::Snake),
            "goZero" => Ok(NamingStyle::Camel),
            other => Err(ConfigError::Invalid(format!(
                "unknown naming style '{}', expected one of: gozero, go_zero, goZero",
                other
            ))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self { Self { level: "info".to_string(), file: None } }
}

impl Default for GenerationConfig {
    fn default() -> Self { Self { check_toolchain: true, strict_call_stage: false } }
}

impl Config {
    /// Load configuration from a TOML file at `path`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` when given, otherwise the default path if it exists, otherwise defaults
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Ok(default) if default.exists() => Self::from_file(default),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Returns the default config file path:
    /// `{config_dir()}/rpcgen/config.toml`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir =
            dirs::config_dir().ok_or(ConfigError::ConfigDirUnavailable)?.join("rpcgen");
        Ok(config_dir.join("config.toml"))
    }

    /// Reject values that would only fail later, mid-generation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::Invalid("logging.level must not be empty".to_string()));
        }
        Ok(())
    }
}
