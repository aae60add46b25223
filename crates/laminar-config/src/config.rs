//! Main configuration types.
//!
//! This module provides the top-level [`EngineConfig`] struct and its builder.

use serde::{Deserialize, Serialize};

use crate::{EngineSection, LoggingSection};

/// Complete Laminar configuration.
///
/// This is the root configuration type that contains all configuration sections.
/// Use [`ConfigLoader`](crate::ConfigLoader) to load configuration from files
/// and environment variables.
///
/// # Example
///
/// ```
/// use laminar_config::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert!(!config.engine.enable_trace);
/// assert!(!config.engine.continue_on_error);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Engine behaviour (tracing, failure policy).
    #[serde(default)]
    pub engine: EngineSection,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSection,
}

impl EngineConfig {
    /// Create a new configuration builder.
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_config::{EngineConfig, EngineSection};
    ///
    /// let config = EngineConfig::builder()
    ///     .engine(EngineSection {
    ///         enable_trace: true,
    ///         ..Default::default()
    ///     })
    ///     .build();
    ///
    /// assert!(config.engine.enable_trace);
    /// ```
    #[must_use]
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if the log level is empty or is not
    /// a valid filter directive.
    pub fn validate(&self) -> Result<(), crate::ConfigError> {
        if self.logging.level.trim().is_empty() {
            return Err(crate::ConfigError::invalid_value(
                "logging.level",
                "must not be empty",
            ));
        }

        if let Err(e) = laminar_telemetry::create_env_filter(&self.logging.level) {
            return Err(crate::ConfigError::invalid_value(
                "logging.level",
                e.to_string(),
            ));
        }

        Ok(())
    }

    /// Create a development configuration preset.
    ///
    /// This preset is optimized for local development with:
    /// - Pretty log formatting with ANSI colors
    /// - Debug log level
    /// - Execution traces enabled
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_config::EngineConfig;
    ///
    /// let config = EngineConfig::development();
    /// assert_eq!(config.logging.level, "debug");
    /// assert!(config.engine.enable_trace);
    /// ```
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();

        config.logging.level = "debug".to_string();
        config.logging.format = crate::LogFormat::Pretty;
        config.logging.ansi_enabled = true;
        config.logging.include_location = true;

        config.engine.enable_trace = true;

        config
    }

    /// Create a production configuration preset.
    ///
    /// This preset is optimized for production with:
    /// - JSON log formatting
    /// - Info log level
    /// - Traces disabled, failures abort the chain
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_config::EngineConfig;
    ///
    /// let config = EngineConfig::production();
    /// assert_eq!(config.logging.format, laminar_config::LogFormat::Json);
    /// ```
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self::default();

        config.logging.level = "info".to_string();
        config.logging.format = crate::LogFormat::Json;
        config.logging.ansi_enabled = false;

        config.engine.enable_trace = false;
        config.engine.continue_on_error = false;

        config
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    engine: Option<EngineSection>,
    logging: Option<LoggingSection>,
}

impl EngineConfigBuilder {
    /// Create a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the engine section.
    #[must_use]
    pub fn engine(mut self, engine: EngineSection) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Set the logging section.
    #[must_use]
    pub fn logging(mut self, logging: LoggingSection) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Build the configuration.
    ///
    /// Any unset sections will use their default values.
    #[must_use]
    pub fn build(self) -> EngineConfig {
        EngineConfig {
            engine: self.engine.unwrap_or_default(),
            logging: self.logging.unwrap_or_default(),
        }
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if validation fails.
    pub fn build_validated(self) -> Result<EngineConfig, crate::ConfigError> {
        let config = self.build();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert!(!config.engine.enable_trace);
        assert!(!config.engine.continue_on_error);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_builder_engine() {
        let config = EngineConfig::builder()
            .engine(EngineSection {
                continue_on_error: true,
                ..Default::default()
            })
            .build();

        assert!(config.engine.continue_on_error);
        // Other sections use defaults
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_level() {
        let config = EngineConfig::builder()
            .logging(LoggingSection {
                level: "  ".to_string(),
                ..Default::default()
            })
            .build();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("logging.level"));
    }

    #[test]
    fn test_validate_bad_directive() {
        let result = EngineConfig::builder()
            .logging(LoggingSection {
                level: "laminar=loud".to_string(),
                ..Default::default()
            })
            .build_validated();

        assert!(result.is_err());
    }

    #[test]
    fn test_development_preset() {
        let config = EngineConfig::development();
        assert_eq!(config.logging.format, crate::LogFormat::Pretty);
        assert!(config.logging.ansi_enabled);
        assert!(config.engine.enable_trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_production_preset() {
        let config = EngineConfig::production();
        assert_eq!(config.logging.format, crate::LogFormat::Json);
        assert!(!config.engine.enable_trace);
        assert!(!config.engine.continue_on_error);
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = toml::to_string_pretty(&EngineConfig::default()).unwrap();
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("[logging]"));
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_str = r#"
            [engine]
            enable_trace = true
            continue_on_error = true

            [logging]
            level = "warn"
        "#;

        let config: EngineConfig = toml::from_str(toml_str).unwrap();
        assert!(config.engine.enable_trace);
        assert!(config.engine.continue_on_error);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml_str = r#"
            [engine]
            enable_trace = true
            global = ["auth"]
        "#;

        let result: Result<EngineConfig, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
