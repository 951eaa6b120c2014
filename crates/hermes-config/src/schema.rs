//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Manifest file names tried in each directory by default.
pub const DEFAULT_MANIFEST_NAMES: [&str; 2] = ["serverless.yml", "serverless.yaml"];

/// Service location and manifest options.
///
/// # Example
///
/// ```
/// use hermes_config::ServiceConfig;
///
/// let config = ServiceConfig::default();
/// assert!(config.path.is_none());
/// assert_eq!(config.manifest_names, vec!["serverless.yml", "serverless.yaml"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Service directory. When unset, it is discovered by walking up from
    /// the working directory.
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Manifest file names tried in each directory, in order.
    #[serde(default = "default_manifest_names")]
    pub manifest_names: Vec<String>,

    /// Value of `${opt:stage}`.
    #[serde(default)]
    pub stage: Option<String>,

    /// Value of `${opt:region}`.
    #[serde(default)]
    pub region: Option<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            path: None,
            manifest_names: default_manifest_names(),
            stage: None,
            region: None,
        }
    }
}

fn default_manifest_names() -> Vec<String> {
    DEFAULT_MANIFEST_NAMES.iter().map(ToString::to_string).collect()
}

/// Invocation behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InvocationConfig {
    /// Apply the declared environment to the process environment for the
    /// duration of each invocation.
    #[serde(default = "default_true")]
    pub apply_process_env: bool,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        Self {
            apply_process_env: true,
        }
    }
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs.
    Json,
    /// Human-readable pretty format.
    #[default]
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log level or filter directives (`warn`, `hermes_core=debug,info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_true() -> bool {
    true
}
