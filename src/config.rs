// Configuration management with environment variables, TOML files, and validation

use std::env;
use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use crate::endpoint::{ServerKind, DEFAULT_SCHEME};
use crate::errors::{BindpointError, ErrorCode, Result};
use crate::ssl::{SslPortRange, SSL_PORT_RANGE_END, SSL_PORT_RANGE_START};
use crate::validation;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Endpoint resolution defaults
    #[serde(default)]
    pub resolver: ResolverConfig,

    /// SSL port range
    #[serde(default)]
    pub ssl: SslConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub default_scheme: String,
    pub server_kind: ServerKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SslConfig {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_scheme: DEFAULT_SCHEME.to_string(),
            server_kind: ServerKind::StatusReporting,
        }
    }
}

impl Default for SslConfig {
    fn default() -> Self {
        Self {
            start: SSL_PORT_RANGE_START,
            end: SSL_PORT_RANGE_END,
        }
    }
}

impl SslConfig {
    pub fn range(&self) -> Result<SslPortRange> {
        SslPortRange::new(self.start, self.end)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .map_err(|e| BindpointError::Config {
                message: format!("Failed to read config file: {}", e),
                code: ErrorCode::ConfigFileNotFound,
                source: Some(Box::new(e)),
            })?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| BindpointError::Config {
                message: format!("Failed to parse config file: {}", e),
                code: ErrorCode::ConfigParseFailed,
                source: Some(Box::new(e)),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment variables to the configuration
    pub fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(scheme) = env::var("BINDPOINT_SCHEME") {
            self.resolver.default_scheme = scheme;
        }
        if let Ok(kind) = env::var("BINDPOINT_SERVER_KIND") {
            self.resolver.server_kind = kind.parse()?;
        }

        if let Ok(start) = env::var("BINDPOINT_SSL_PORT_START") {
            self.ssl.start = parse_port_var("BINDPOINT_SSL_PORT_START", &start)?;
        }
        if let Ok(end) = env::var("BINDPOINT_SSL_PORT_END") {
            self.ssl.end = parse_port_var("BINDPOINT_SSL_PORT_END", &end)?;
        }

        if let Ok(level) = env::var("BINDPOINT_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("BINDPOINT_LOG_FORMAT") {
            self.logging.format = match format.as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }

        Ok(())
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<()> {
        validation::validate_scheme(&self.resolver.default_scheme)?;
        validation::validate_port_range(self.ssl.start, self.ssl.end)?;
        validation::validate_log_level(&self.logging.level)?;
        Ok(())
    }

    /// Generate an example TOML configuration file
    pub fn example_toml() -> String {
        r#"# Bindpoint Configuration File

[resolver]
default_scheme = "http"
server_kind = "status-reporting"  # status-reporting or pre-assigned

[ssl]
# Ports pre-registered with SSL certificate bindings (inclusive)
start = 44300
end = 44399

[logging]
level = "info"       # trace, debug, info, warn, error
format = "text"      # text or json
"#.to_string()
    }
}

fn parse_port_var(name: &str, value: &str) -> Result<u16> {
    value.parse().map_err(|e| BindpointError::Config {
        message: format!("{} is not a port number: {}", name, value),
        code: ErrorCode::InvalidConfig,
        source: Some(Box::new(e)),
    })
}
