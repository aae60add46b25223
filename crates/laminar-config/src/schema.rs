//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use laminar_telemetry::LogConfig;
use serde::{Deserialize, Serialize};

/// Engine behaviour section.
///
/// Controls the standing options of the middleware engine. Middleware
/// entries themselves are registered in code and never appear here.
///
/// # Example
///
/// ```
/// use laminar_config::EngineSection;
///
/// let engine = EngineSection {
///     enable_trace: true,
///     continue_on_error: false,
/// };
/// assert!(engine.enable_trace);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Populate the per-middleware trace in every execution envelope.
    #[serde(default)]
    pub enable_trace: bool,

    /// Swallow middleware failures and resume wherever dispatch had reached.
    ///
    /// This is lossy: the failed middleware's post-processing never runs.
    #[serde(default)]
    pub continue_on_error: bool,
}

/// Log format.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON formatted logs (production).
    #[default]
    Json,
    /// Human-readable pretty format (development).
    Pretty,
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// Enable logging.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Log filter directive (trace, debug, info, warn, error or a full `EnvFilter` string).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Include ANSI color codes in output.
    #[serde(default)]
    pub ansi_enabled: bool,

    /// Include source file and line in logs.
    #[serde(default)]
    pub include_location: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::default(),
            ansi_enabled: false,
            include_location: false,
        }
    }
}

impl LoggingSection {
    /// Converts this section into the telemetry crate's [`LogConfig`].
    ///
    /// # Example
    ///
    /// ```
    /// use laminar_config::{LogFormat, LoggingSection};
    ///
    /// let section = LoggingSection {
    ///     format: LogFormat::Pretty,
    ///     ..Default::default()
    /// };
    /// assert!(!section.to_log_config().json_format);
    /// ```
    #[must_use]
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            enabled: self.enabled,
            level: self.level.clone(),
            json_format: self.format == LogFormat::Json,
            ansi: self.ansi_enabled,
            span_events: false,
            file_line_info: self.include_location,
            include_target: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_section_defaults() {
        let engine = EngineSection::default();
        assert!(!engine.enable_trace);
        assert!(!engine.continue_on_error);
    }

    #[test]
    fn test_logging_section_defaults() {
        let logging = LoggingSection::default();
        assert!(logging.enabled);
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, LogFormat::Json);
    }

    #[test]
    fn test_log_format_serialization() {
        assert_eq!(serde_json::to_string(&LogFormat::Json).unwrap(), "\"json\"");
        assert_eq!(
            serde_json::from_str::<LogFormat>("\"pretty\"").unwrap(),
            LogFormat::Pretty
        );
    }

    #[test]
    fn test_to_log_config() {
        let section = LoggingSection {
            level: "laminar_middleware=debug".to_string(),
            format: LogFormat::Pretty,
            ansi_enabled: true,
            include_location: true,
            ..Default::default()
        };

        let config = section.to_log_config();
        assert_eq!(config.level, "laminar_middleware=debug");
        assert!(!config.json_format);
        assert!(config.ansi);
        assert!(config.file_line_info);
    }

    #[test]
    fn test_engine_section_rejects_unknown_fields() {
        let result: Result<EngineSection, _> =
            serde_json::from_str(r#"{"enable_trace": true, "retries": 3}"#);
        assert!(result.is_err());
    }
}
