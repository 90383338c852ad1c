//! Configuration management

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::scan::Severity;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub scanner: ScannerConfig,
    pub azure: AzureConfig,
    pub reports: ReportsConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            scanner: ScannerConfig::default(),
            azure: AzureConfig::default(),
            reports: ReportsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Serve the Swagger UI at `/docs`
    pub enable_docs: bool,
    /// Per-request timeout applied by the timeout middleware
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            enable_docs: true,
            request_timeout_seconds: 60,
        }
    }
}

/// Scan orchestration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Upper bound on simultaneously in-flight checker invocations
    pub max_concurrent_checks: usize,
    /// Threshold applied when a scan request does not specify one
    pub default_severity_threshold: Severity,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_checks: 10,
            default_severity_threshold: Severity::Low,
        }
    }
}

/// Azure Resource Manager access configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    pub management_endpoint: String,
    /// Bearer token used for ARM calls. Credential acquisition is handled
    /// outside this service; typically injected via
    /// `CLOUDPOSTURE__AZURE__ACCESS_TOKEN`.
    pub access_token: String,
    /// Per-call timeout for resource fetches
    pub fetch_timeout_seconds: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            management_endpoint: "https://management.azure.com".to_string(),
            access_token: String::new(),
            fetch_timeout_seconds: 30,
        }
    }
}

/// Report persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    pub output_dir: PathBuf,
    /// Default retention window for `DELETE /reports/cleanup`
    pub retention_days: u32,
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./reports"),
            retention_days: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        // Local config and environment variables last (highest priority)
        builder = builder
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("CLOUDPOSTURE").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    /// Validate the loaded configuration
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.server.port == 0 {
            return Err(ConfigValidationError::new("server.port must be non-zero"));
        }
        if self.scanner.max_concurrent_checks == 0 {
            return Err(ConfigValidationError::new(
                "scanner.max_concurrent_checks must be at least 1",
            ));
        }
        if self.azure.fetch_timeout_seconds == 0 {
            return Err(ConfigValidationError::new(
                "azure.fetch_timeout_seconds must be at least 1",
            ));
        }
        if self.reports.output_dir.as_os_str().is_empty() {
            return Err(ConfigValidationError::new(
                "reports.output_dir must not be empty",
            ));
        }
        Ok(())
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ConfigValidationError),
}

/// A rejected configuration value
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConfigValidationError {
    message: String,
}

impl ConfigValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
