//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::{ConfigError, ConfigFormat, HermesConfig, LogFormat};

/// Configuration loader with layered approach.
///
/// Later layers override earlier ones:
/// 1. Default values
/// 2. Configuration file (TOML or JSON)
/// 3. Environment variables
///
/// # Example
///
/// ```no_run
/// use hermes_config::ConfigLoader;
///
/// # fn main() -> Result<(), hermes_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("hermes.toml")?
///     .with_env_prefix("HERMES")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: HermesConfig,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HermesConfig::default(),
            env_prefix: None,
        }
    }

    /// Start with default configuration values.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = HermesConfig::default();
        self
    }

    /// Start with the verbose preset.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_verbose().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_verbose(mut self) -> Self {
        self.config = HermesConfig::verbose();
        self
    }

    /// Start with the quiet preset.
    #[must_use]
    pub fn with_quiet(mut self) -> Self {
        self.config = HermesConfig::quiet();
        self
    }

    /// Load configuration from a file.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file does not exist, cannot be read,
    /// has an unsupported extension, or does not parse (unknown fields
    /// included).
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let format = ConfigFormat::from_path(path)
            .ok_or_else(|| ConfigError::unsupported_format(path.display().to_string()))?;
        let file_config = Self::parse(&content, format, Some(path))?;
        self.merge_config(file_config);

        Ok(self)
    }

    /// Load configuration from a file if it exists.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Load configuration from a string in `"toml"` or `"json"` format.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the format is unsupported or parsing fails.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [service]
    ///     stage = "test"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.service.stage.as_deref(), Some("test"));
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let format =
            ConfigFormat::from_name(format).ok_or_else(|| ConfigError::unsupported_format(format))?;
        let file_config = Self::parse(content, format, None)?;

        self.merge_config(file_config);
        Ok(self)
    }

    /// Set the environment variable prefix for overrides.
    ///
    /// Variables use the form `PREFIX__SECTION__KEY`, e.g.
    /// `HERMES__SERVICE__STAGE=test` or `HERMES__LOGGING__LEVEL=debug`.
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Apply environment overrides and validate.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if an override does not parse or the final
    /// configuration is invalid.
    pub fn load(mut self) -> Result<HermesConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> HermesConfig {
        self.config
    }

    fn parse(
        content: &str,
        format: ConfigFormat,
        path: Option<&Path>,
    ) -> Result<HermesConfig, ConfigError> {
        match format {
            ConfigFormat::Toml => {
                toml::from_str(content).map_err(|e| ConfigError::parse(path, format, e))
            }
            ConfigFormat::Json => {
                serde_json::from_str(content).map_err(|e| ConfigError::parse(path, format, e))
            }
        }
    }

    // Full replace: a file is a complete configuration with serde defaults.
    fn merge_config(&mut self, file_config: HermesConfig) {
        self.config = file_config;
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let env_vars: HashMap<String, String> =
            env::vars().filter(|(k, _)| k.starts_with(prefix)).collect();

        for (key, value) in env_vars {
            self.apply_env_var(&key, &value, prefix)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, prefix: &str) -> Result<(), ConfigError> {
        let Some(key_without_prefix) = key
            .strip_prefix(prefix)
            .and_then(|k| k.strip_prefix("__"))
        else {
            // Shares the prefix but is not an override, e.g. HERMESX.
            return Ok(());
        };

        let parts: Vec<&str> = key_without_prefix.split("__").collect();

        match parts.as_slice() {
            // Service section
            ["SERVICE", "PATH"] => {
                self.config.service.path = non_empty(value).map(PathBuf::from);
            }
            ["SERVICE", "MANIFEST_NAMES"] => {
                self.config.service.manifest_names = value
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string)
                    .collect();
            }
            ["SERVICE", "STAGE"] => {
                self.config.service.stage = non_empty(value).map(ToString::to_string);
            }
            ["SERVICE", "REGION"] => {
                self.config.service.region = non_empty(value).map(ToString::to_string);
            }

            // Invocation section
            ["INVOCATION", "APPLY_PROCESS_ENV"] => {
                self.config.invocation.apply_process_env = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }

            // Logging section
            ["LOGGING", "ENABLED"] => {
                self.config.logging.enabled = parse_bool(value)
                    .ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))?;
            }
            ["LOGGING", "LEVEL"] => {
                self.config.logging.level = value.to_string();
            }
            ["LOGGING", "FORMAT"] => {
                self.config.logging.format = match value.to_lowercase().as_str() {
                    "json" => LogFormat::Json,
                    "pretty" => LogFormat::Pretty,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'json' or 'pretty'",
                        ))
                    }
                };
            }

            // Unknown keys are ignored
            _ => {}
        }

        Ok(())
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let value = value.trim();
    (!value.is_empty()).then_some(value)
}

/// Parse a boolean from a string.
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_new() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, HermesConfig::default());
    }

    #[test]
    fn test_loader_with_quiet() {
        let config = ConfigLoader::new().with_quiet().load().unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_loader_with_string_json() {
        let json = r#"{ "invocation": { "apply_process_env": false } }"#;
        let config = ConfigLoader::new()
            .with_string(json, "json")
            .unwrap()
            .load()
            .unwrap();
        assert!(!config.invocation.apply_process_env);
    }

    #[test]
    fn test_loader_with_string_unsupported_format() {
        assert!(matches!(
            ConfigLoader::new().with_string("", "ini"),
            Err(ConfigError::UnsupportedFormat { found }) if found == "ini"
        ));
    }

    #[test]
    fn test_loader_parse_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hermes.toml");
        fs::write(&path, "[service]
stage = 3
").unwrap();

        let err = ConfigLoader::new().with_file(&path).unwrap_err();
        assert!(matches!(
            &err,
            ConfigError::Parse { path: Some(p), format: ConfigFormat::Toml, .. } if p == &path
        ));
        assert!(err.to_string().contains("hermes.toml"));
    }

    #[test]
    fn test_loader_string_parse_error_has_no_path() {
        let err = ConfigLoader::new()
            .with_string(r#"{ "bogus": true }"#, "json")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Parse { path: None, format: ConfigFormat::Json, .. }
        ));
    }

    #[test]
    fn test_loader_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hermes.toml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[service]\npath = \"svc\"\n\n[logging]\nformat = \"json\"").unwrap();

        let config = ConfigLoader::new().with_file(&path).unwrap().load().unwrap();
        assert_eq!(config.service.path, Some(PathBuf::from("svc")));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_loader_with_file_not_found() {
        let result = ConfigLoader::new().with_file("/nonexistent/hermes.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_loader_with_optional_file_not_found() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/hermes.toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config, HermesConfig::default());
    }

    #[test]
    fn test_loader_rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hermes.yaml");
        fs::write(&path, "service: {}").unwrap();
        assert!(matches!(
            ConfigLoader::new().with_file(&path),
            Err(ConfigError::UnsupportedFormat { found }) if found.ends_with("hermes.yaml")
        ));
    }

    #[test]
    fn test_loader_validates_on_load() {
        let toml = "[service]\nmanifest_names = []\n";
        let loader = ConfigLoader::new().with_string(toml, "toml").unwrap();
        assert!(loader.load().is_err());
    }

    #[test]
    fn test_parse_bool() {
        for s in ["true", "TRUE", "1", "yes", "on"] {
            assert_eq!(parse_bool(s), Some(true), "{s}");
        }
        for s in ["false", "False", "0", "no", "off"] {
            assert_eq!(parse_bool(s), Some(false), "{s}");
        }
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_apply_env_var_service() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("HERMES__SERVICE__PATH", "/srv/app", "HERMES").unwrap();
        loader.apply_env_var("HERMES__SERVICE__STAGE", "dev", "HERMES").unwrap();
        loader
            .apply_env_var("HERMES__SERVICE__MANIFEST_NAMES", "sls.yml, serverless.yml", "HERMES")
            .unwrap();

        let config = loader.load_unvalidated();
        assert_eq!(config.service.path, Some(PathBuf::from("/srv/app")));
        assert_eq!(config.service.stage.as_deref(), Some("dev"));
        assert_eq!(config.service.manifest_names, vec!["sls.yml", "serverless.yml"]);
    }

    #[test]
    fn test_apply_env_var_empty_clears_option() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("HERMES__SERVICE__REGION", "eu-west-1", "HERMES").unwrap();
        loader.apply_env_var("HERMES__SERVICE__REGION", "", "HERMES").unwrap();
        assert!(loader.load_unvalidated().service.region.is_none());
    }

    #[test]
    fn test_apply_env_var_boolean() {
        let mut loader = ConfigLoader::new();
        loader
            .apply_env_var("HERMES__INVOCATION__APPLY_PROCESS_ENV", "off", "HERMES")
            .unwrap();
        loader.apply_env_var("HERMES__LOGGING__ENABLED", "no", "HERMES").unwrap();
        let config = loader.load_unvalidated();
        assert!(!config.invocation.apply_process_env);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_apply_env_var_invalid_boolean() {
        let mut loader = ConfigLoader::new();
        let err = loader
            .apply_env_var("HERMES__LOGGING__ENABLED", "sometimes", "HERMES")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    fn test_apply_env_var_log_format() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("HERMES__LOGGING__FORMAT", "JSON", "HERMES").unwrap();
        loader.apply_env_var("HERMES__LOGGING__LEVEL", "hermes_core=debug", "HERMES").unwrap();
        let config = loader.load_unvalidated();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "hermes_core=debug");

        let mut loader = ConfigLoader::new();
        assert!(loader.apply_env_var("HERMES__LOGGING__FORMAT", "xml", "HERMES").is_err());
    }

    #[test]
    fn test_apply_env_var_unknown_key_ignored() {
        let mut loader = ConfigLoader::new();
        loader.apply_env_var("HERMES__SERVER__PORT", "80", "HERMES").unwrap();
        loader.apply_env_var("HERMESX", "1", "HERMES").unwrap();
        assert_eq!(loader.load_unvalidated(), HermesConfig::default());
    }
}
