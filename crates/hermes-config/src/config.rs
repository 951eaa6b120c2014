//! Main configuration types.
//!
//! This module provides the top-level [`HermesConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{ConfigError, InvocationConfig, LogFormat, LoggingConfig, ServiceConfig};

/// Complete harness configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use hermes_config::HermesConfig;
///
/// let config = HermesConfig::default();
/// assert!(config.invocation.apply_process_env);
/// assert_eq!(config.logging.level, "warn");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct HermesConfig {
    /// Service location and manifest options.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Invocation behavior.
    #[serde(default)]
    pub invocation: InvocationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HermesConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, ServiceConfig};
    ///
    /// let config = HermesConfig::builder()
    ///     .service(ServiceConfig {
    ///         stage: Some("test".to_string()),
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert_eq!(config.service.stage.as_deref(), Some("test"));
    /// ```
    #[must_use]
    pub fn builder() -> HermesConfigBuilder {
        HermesConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if:
    /// - No manifest file names are configured
    /// - A manifest file name is empty or contains a path separator
    /// - `stage` or `region` is set to an empty string
    /// - The log level is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.manifest_names.is_empty() {
            return Err(ConfigError::invalid_value(
                "service.manifest_names",
                "at least one manifest file name is required",
            ));
        }

        for name in &self.service.manifest_names {
            if name.trim().is_empty() || name.contains(['/', '\\']) {
                return Err(ConfigError::invalid_value(
                    "service.manifest_names",
                    format!("not a plain file name: {name:?}"),
                ));
            }
        }

        for (field, value) in [
            ("service.stage", &self.service.stage),
            ("service.region", &self.service.region),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ConfigError::invalid_value(field, "must not be empty when set"));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::invalid_value("logging.level", "must not be empty"));
        }

        Ok(())
    }

    /// Verbose preset for debugging route selection and invocation.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::HermesConfig;
    ///
    /// let config = HermesConfig::verbose();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn verbose() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.logging.format = LogFormat::Pretty;
        config
    }

    /// Quiet preset for CI: JSON logs, errors only.
    ///
    /// # Example
    ///
    /// ```
    /// use hermes_config::{HermesConfig, LogFormat};
    ///
    /// let config = HermesConfig::quiet();
    /// assert_eq!(config.logging.format, LogFormat::Json);
    /// ```
    #[must_use]
    pub fn quiet() -> Self {
        let mut config = Self::default();
        config.logging.level = "error".to_string();
        config.logging.format = LogFormat::Json;
        config
    }
}

/// Builder for [`HermesConfig`].
#[derive(Debug, Default)]
pub struct HermesConfigBuilder {
    service: Option<ServiceConfig>,
    invocation: Option<InvocationConfig>,
    logging: Option<LoggingConfig>,
}

impl HermesConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the service configuration.
    #[must_use]
    pub fn service(mut self, service: ServiceConfig) -> Self {
        self.service = Some(service);
        self
    }

    /// Set the invocation configuration.
    #[must_use]
    pub fn invocation(mut self, invocation: InvocationConfig) -> Self {
        self.invocation = Some(invocation);
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> HermesConfig {
        HermesConfig {
            service: self.service.unwrap_or_default(),
            invocation: self.invocation.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if validation fails.
    pub fn build_validated(self) -> Result<HermesConfig, ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(HermesConfig::default().validate().is_ok());
    }

    #[test]
    fn test_builder_all_sections() {
        let config = HermesConfig::builder()
            .service(ServiceConfig {
                path: Some(PathBuf::from("svc")),
                ..Default::default()
            })
            .invocation(InvocationConfig {
                apply_process_env: false,
            })
            .logging(LoggingConfig {
                enabled: false,
                ..Default::default()
            })
            .build();

        assert_eq!(config.service.path, Some(PathBuf::from("svc")));
        assert!(!config.invocation.apply_process_env);
        assert!(!config.logging.enabled);
    }

    #[test]
    fn test_validate_empty_manifest_names() {
        let mut config = HermesConfig::default();
        config.service.manifest_names.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service.manifest_names"));
    }

    #[test]
    fn test_validate_manifest_name_with_separator() {
        let mut config = HermesConfig::default();
        config.service.manifest_names = vec!["conf/serverless.yml".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_stage() {
        let mut config = HermesConfig::default();
        config.service.stage = Some(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("service.stage"));
    }

    #[test]
    fn test_validate_empty_log_level() {
        let mut config = HermesConfig::default();
        config.logging.level = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_presets() {
        let verbose = HermesConfig::verbose();
        assert_eq!(verbose.logging.level, "debug");
        assert_eq!(verbose.logging.format, LogFormat::Pretty);

        let quiet = HermesConfig::quiet();
        assert_eq!(quiet.logging.level, "error");
        assert_eq!(quiet.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_build_validated_failure() {
        let result = HermesConfig::builder()
            .service(ServiceConfig {
                manifest_names: Vec::new(),
                ..Default::default()
            })
            .build_validated();
        assert!(result.is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = HermesConfig::verbose();
        let text = toml::to_string(&config).unwrap();
        let parsed: HermesConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<HermesConfig, _> = toml::from_str("[server]\nport = 1\n");
        assert!(result.is_err());
    }
}
