//! TOML Configuration File Support
//!
//! Centralized configuration loading for replydesk, supporting a TOML
//! configuration file at `~/.config/replydesk/replydesk.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied with [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/replydesk/replydesk.toml` (typically `~/.config/replydesk/replydesk.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! base_url = "http://127.0.0.1:8000"
//! timeout_secs = 120
//!
//! [intake]
//! max_file_bytes = 5242880
//!
//! [feedback]
//! duration_ms = 2000
//!
//! [export]
//! download_dir = "."
//! clipboard_command = "xclip -selection clipboard"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendConfig;
use crate::feedback::FEEDBACK_DURATION;
use crate::intake::MAX_UPLOAD_BYTES;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// Service base URL
    pub base_url: Option<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Intake section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeToml {
    /// Upload size limit in bytes
    pub max_file_bytes: Option<usize>,
}

/// Feedback section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackToml {
    /// How long feedback stays visible, in milliseconds
    pub duration_ms: Option<u64>,
}

/// Export section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportToml {
    /// Directory downloads are written to
    pub download_dir: Option<String>,

    /// Command that receives clipboard text on stdin
    pub clipboard_command: Option<String>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplydeskToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Intake configuration section
    pub intake: IntakeToml,

    /// Feedback configuration section
    pub feedback: FeedbackToml,

    /// Export configuration section
    pub export: ExportToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Upload validation settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IntakeSettings {
    /// Largest accepted upload in bytes
    pub max_file_bytes: usize,
}

/// Feedback timer settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeedbackSettings {
    /// Feedback lifetime in milliseconds
    pub duration_ms: u64,
}

/// Where copied and downloaded replies go
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExportSettings {
    /// Download directory
    pub download_dir: PathBuf,
    /// Clipboard command (text is printed when unset)
    pub clipboard_command: Option<String>,
}

/// Centralized configuration for replydesk
///
/// Use [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct ReplydeskConfigFile {
    /// Backend connection
    pub backend: BackendConfig,

    /// Upload validation
    pub intake: IntakeSettings,

    /// Feedback timer
    pub feedback: FeedbackSettings,

    /// Copy and download targets
    pub export: ExportSettings,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for ReplydeskConfigFile {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            intake: IntakeSettings {
                max_file_bytes: MAX_UPLOAD_BYTES,
            },
            feedback: FeedbackSettings {
                duration_ms: u64::try_from(FEEDBACK_DURATION.as_millis()).unwrap_or(2000),
            },
            export: ExportSettings {
                download_dir: PathBuf::from("."),
                clipboard_command: None,
            },
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl ReplydeskConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Set the configuration source
    pub fn set_source(&mut self, source: ConfigSource) {
        self.source = source;
    }

    /// Check values that would make the session unusable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] naming the offending value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.base_url must not be empty".to_string(),
            ));
        }
        if self.backend.timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "backend.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.intake.max_file_bytes == 0 {
            return Err(ConfigError::ValidationError(
                "intake.max_file_bytes must be greater than zero".to_string(),
            ));
        }
        if self.feedback.duration_ms == 0 {
            return Err(ConfigError::ValidationError(
                "feedback.duration_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/replydesk/replydesk.toml` or
/// `~/.config/replydesk/replydesk.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("replydesk").join("replydesk.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// merged values fail validation. A missing config file is not an error.
pub fn load_config() -> Result<ReplydeskConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the merged values fail validation.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<ReplydeskConfigFile, ConfigError> {
    let mut config = ReplydeskConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ReplydeskToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config);

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut ReplydeskConfigFile, toml: &ReplydeskToml) {
    if let Some(ref url) = toml.backend.base_url {
        config.backend.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.backend.timeout = Duration::from_secs(secs);
    }

    if let Some(bytes) = toml.intake.max_file_bytes {
        config.intake.max_file_bytes = bytes;
    }

    if let Some(ms) = toml.feedback.duration_ms {
        config.feedback.duration_ms = ms;
    }

    if let Some(ref dir) = toml.export.download_dir {
        config.export.download_dir = PathBuf::from(dir);
    }
    if toml.export.clipboard_command.is_some() {
        config.export.clipboard_command = toml.export.clipboard_command.clone();
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config(config: &mut ReplydeskConfigFile) {
    if let Ok(url) = std::env::var("REPLYDESK_BACKEND_URL") {
        config.backend.base_url = url.trim_end_matches('/').to_string();
        config.source = ConfigSource::Env;
    }
    if let Ok(timeout) = std::env::var("REPLYDESK_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.backend.timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(max) = std::env::var("REPLYDESK_MAX_FILE_BYTES") {
        if let Ok(bytes) = max.parse::<usize>() {
            config.intake.max_file_bytes = bytes;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(duration) = std::env::var("REPLYDESK_FEEDBACK_MS") {
        if let Ok(ms) = duration.parse::<u64>() {
            config.feedback.duration_ms = ms;
            config.source = ConfigSource::Env;
        }
    }
    if let Ok(dir) = std::env::var("REPLYDESK_DOWNLOAD_DIR") {
        config.export.download_dir = PathBuf::from(dir);
        config.source = ConfigSource::Env;
    }
    if let Ok(cmd) = std::env::var("REPLYDESK_CLIPBOARD_CMD") {
        config.export.clipboard_command = Some(cmd).filter(|c| !c.trim().is_empty());
        config.source = ConfigSource::Env;
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Backend URL override
    pub backend_url: Option<String>,

    /// Download directory override
    pub download_dir: Option<PathBuf>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set backend URL override
    #[must_use]
    pub fn with_backend_url(mut self, url: String) -> Self {
        self.backend_url = Some(url);
        self
    }

    /// Set download directory override
    #[must_use]
    pub fn with_download_dir(mut self, dir: PathBuf) -> Self {
        self.download_dir = Some(dir);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut ReplydeskConfigFile) {
        if self.backend_url.is_some() || self.download_dir.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref url) = self.backend_url {
            config.backend.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(ref dir) = self.download_dir {
            config.export.download_dir = dir.clone();
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Clean up all environment variables used by config loading.
    fn clear_config_env_vars() {
        std::env::remove_var("REPLYDESK_BACKEND_URL");
        std::env::remove_var("REPLYDESK_TIMEOUT_SECS");
        std::env::remove_var("REPLYDESK_MAX_FILE_BYTES");
        std::env::remove_var("REPLYDESK_FEEDBACK_MS");
        std::env::remove_var("REPLYDESK_DOWNLOAD_DIR");
        std::env::remove_var("REPLYDESK_CLIPBOARD_CMD");
    }

    // =========================================================================
    // Default Configuration Tests
    // =========================================================================

    #[test]
    fn test_default_config() {
        let config = ReplydeskConfigFile::default();

        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.backend.timeout, Duration::from_secs(120));
        assert_eq!(config.intake.max_file_bytes, 5 * 1024 * 1024);
        assert_eq!(config.feedback.duration_ms, 2000);
        assert_eq!(config.export.download_dir, PathBuf::from("."));
        assert!(config.export.clipboard_command.is_none());
        assert_eq!(config.source(), ConfigSource::Default);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_path() {
        if let Some(p) = default_config_path() {
            assert!(p.to_string_lossy().contains("replydesk"));
            assert!(p.to_string_lossy().ends_with("replydesk.toml"));
        }
    }

    // =========================================================================
    // TOML Parsing Tests
    // =========================================================================

    #[test]
    fn test_parse_valid_toml() {
        let toml_content = r#"
[backend]
base_url = "http://assist.internal:9000/"
timeout_secs = 30

[intake]
max_file_bytes = 1048576

[feedback]
duration_ms = 3500

[export]
download_dir = "/tmp/replies"
clipboard_command = "wl-copy"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        // Env vars from parallel tests may win; file values are the expected case
        assert!(config.backend.base_url.starts_with("http://"));
        assert!(!config.backend.base_url.ends_with('/'));
        assert_eq!(config.config_file_path, Some(file.path().to_path_buf()));
        assert!(
            config.source() == ConfigSource::File || config.source() == ConfigSource::Env,
            "Expected File or Env source, got: {:?}",
            config.source()
        );
    }

    #[test]
    fn test_toml_sections_apply() {
        let toml: ReplydeskToml = toml::from_str(
            r#"
[backend]
timeout_secs = 30

[intake]
max_file_bytes = 1048576

[export]
clipboard_command = "wl-copy"
"#,
        )
        .unwrap();

        let mut config = ReplydeskConfigFile::default();
        apply_toml_config(&mut config, &toml);

        assert_eq!(config.backend.timeout, Duration::from_secs(30));
        assert_eq!(config.intake.max_file_bytes, 1_048_576);
        assert_eq!(config.export.clipboard_command.as_deref(), Some("wl-copy"));
        // Untouched sections keep defaults
        assert_eq!(config.backend.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.feedback.duration_ms, 2000);
    }

    // =========================================================================
    // Missing File Handling Tests
    // =========================================================================

    #[test]
    fn test_missing_file_graceful() {
        clear_config_env_vars();

        let path = PathBuf::from("/nonexistent/path/replydesk.toml");
        let config = load_config_from_path(Some(path)).unwrap();

        assert!(config.config_file_path.is_none());
        assert!(
            config.source() == ConfigSource::Default || config.source() == ConfigSource::Env,
            "Expected Default or Env source, got: {:?}",
            config.source()
        );
    }

    // =========================================================================
    // Malformed / Invalid TOML Tests
    // =========================================================================

    #[test]
    fn test_malformed_toml_error() {
        let toml_content = r#"
[backend
timeout_secs = "soon"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let result = load_config_from_path(Some(file.path().to_path_buf()));
        assert!(matches!(result.unwrap_err(), ConfigError::ParseError(_)));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = ReplydeskConfigFile::default();
        config.feedback.duration_ms = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(msg)) if msg.contains("duration_ms")
        ));

        let mut config = ReplydeskConfigFile::default();
        config.intake.max_file_bytes = 0;
        assert!(config.validate().is_err());

        let mut config = ReplydeskConfigFile::default();
        config.backend.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // Priority Ordering Tests
    // =========================================================================

    #[test]
    fn test_env_overrides_file() {
        clear_config_env_vars();

        let toml_content = r#"
[backend]
base_url = "http://file-host:8000"
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        std::env::set_var("REPLYDESK_BACKEND_URL", "http://env-host:8000");

        let config = load_config_from_path(Some(file.path().to_path_buf())).unwrap();

        clear_config_env_vars();

        // Parallel tests may clear the variable before the load; never the default
        assert!(
            config.backend.base_url == "http://env-host:8000"
                || config.backend.base_url == "http://file-host:8000",
            "Expected env or file URL, got: {}",
            config.backend.base_url
        );
    }

    #[test]
    fn test_cli_overrides_env() {
        let mut config = ReplydeskConfigFile::default();
        config.backend.base_url = "http://env-host:8000".to_string();
        config.set_source(ConfigSource::Env);

        let overrides = ConfigOverrides::new()
            .with_backend_url("http://cli-host:8000/".to_string())
            .with_download_dir(PathBuf::from("/tmp/out"));
        overrides.apply(&mut config);

        assert_eq!(config.backend.base_url, "http://cli-host:8000");
        assert_eq!(config.export.download_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.source(), ConfigSource::Cli);
    }

    #[test]
    fn test_config_overrides_empty_no_change() {
        let mut config = ReplydeskConfigFile::default();
        let original_source = config.source();

        ConfigOverrides::new().apply(&mut config);

        assert_eq!(config.source(), original_source);
    }

    // =========================================================================
    // ConfigSource / Error Tests
    // =========================================================================

    #[test]
    fn test_config_source_display() {
        assert_eq!(format!("{}", ConfigSource::Cli), "CLI");
        assert_eq!(format!("{}", ConfigSource::Env), "environment");
        assert_eq!(format!("{}", ConfigSource::File), "config file");
        assert_eq!(format!("{}", ConfigSource::Default), "default");
    }

    #[test]
    fn test_config_error_display() {
        let read_err = ConfigError::ReadError {
            path: PathBuf::from("/test/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        let msg = format!("{}", read_err);
        assert!(msg.contains("/test/path"));
        assert!(msg.contains("Failed to read"));
    }
}
