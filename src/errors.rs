// Custom error types for Bindpoint with error codes for programmatic handling

use std::fmt;
use std::io;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// URI errors (1000-1999)
    MalformedUri = 1000,
    InvalidScheme = 1001,

    /// Port allocation errors (2000-2999)
    PortRangeExhausted = 2000,
    PortSupplyFailed = 2001,
    ProbeFailed = 2002,

    /// Configuration errors (3000-3999)
    InvalidConfig = 3000,
    InvalidPortRange = 3001,
    InvalidLogLevel = 3002,
    InvalidServerKind = 3003,
    ConfigFileNotFound = 3004,
    ConfigParseFailed = 3005,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u32())
    }
}

/// Main error type for Bindpoint operations
#[derive(Error, Debug)]
pub enum BindpointError {
    #[error("Malformed URI: {message} (code: {code})")]
    MalformedUri {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<url::ParseError>,
    },

    #[error("Port range exhausted: {message} (code: {code})")]
    PortRangeExhausted {
        message: String,
        code: ErrorCode,
        attempts: u32,
        #[source]
        source: io::Error,
    },

    #[error("Port probe failed: {message} (code: {code})")]
    Probe {
        message: String,
        code: ErrorCode,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("Port allocation failed: {message} (code: {code})")]
    PortSupply {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Invalid configuration: {message} (code: {code})")]
    Config {
        message: String,
        code: ErrorCode,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl BindpointError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            BindpointError::MalformedUri { code, .. } => *code,
            BindpointError::PortRangeExhausted { code, .. } => *code,
            BindpointError::Probe { code, .. } => *code,
            BindpointError::PortSupply { code, .. } => *code,
            BindpointError::Config { code, .. } => *code,
        }
    }

    pub fn suggestion(&self) -> Option<&str> {
        match self {
            BindpointError::MalformedUri { code: ErrorCode::MalformedUri, .. } => {
                Some("Hints must be absolute URIs such as 'http://localhost:0/' or 'https://[::1]:5001/app'")
            }
            BindpointError::MalformedUri { code: ErrorCode::InvalidScheme, .. } => {
                Some("Schemes start with a letter and contain only letters, digits, '+', '-' or '.' (common: http, https)")
            }
            BindpointError::PortRangeExhausted { .. } => {
                Some("Every port in the SSL range is bound. Stop stale test servers or run SSL tests serially.")
            }
            BindpointError::Probe { .. } => {
                Some("No probe socket could be opened. Check the open file limit (ulimit -n).")
            }
            BindpointError::Config { code: ErrorCode::InvalidPortRange, .. } => {
                Some("The port range must satisfy 1 <= start <= end <= 65535")
            }
            BindpointError::Config { code: ErrorCode::InvalidServerKind, .. } => {
                Some("Server kind must be 'status-reporting' or 'pre-assigned'")
            }
            _ => None,
        }
    }

    pub fn is_malformed_uri(&self) -> bool {
        matches!(self, BindpointError::MalformedUri { .. })
    }

    pub fn is_port_range_exhausted(&self) -> bool {
        matches!(self, BindpointError::PortRangeExhausted { .. })
    }

    pub fn is_probe_failed(&self) -> bool {
        matches!(self, BindpointError::Probe { .. })
    }
}

// Helper functions for creating errors
impl BindpointError {
    pub fn malformed_uri(uri: &str, source: url::ParseError) -> Self {
        BindpointError::MalformedUri {
            message: format!("'{}' is not a valid URI: {}", uri, source),
            code: ErrorCode::MalformedUri,
            source: Some(source),
        }
    }

    pub fn invalid_scheme(scheme: &str) -> Self {
        BindpointError::MalformedUri {
            message: format!("Invalid URI scheme: '{}'", scheme),
            code: ErrorCode::InvalidScheme,
            source: None,
        }
    }

    pub fn port_not_settable(uri: &str) -> Self {
        BindpointError::MalformedUri {
            message: format!("Cannot assign a port to '{}'", uri),
            code: ErrorCode::MalformedUri,
            source: None,
        }
    }

    pub fn port_range_exhausted(start: u16, end: u16, attempts: u32, source: io::Error) -> Self {
        BindpointError::PortRangeExhausted {
            message: format!(
                "No free port in {}-{} after {} attempts",
                start, end, attempts
            ),
            code: ErrorCode::PortRangeExhausted,
            attempts,
            source,
        }
    }

    pub fn probe_failed(port: u16, source: io::Error) -> Self {
        BindpointError::Probe {
            message: format!("Could not open a socket to probe port {}", port),
            code: ErrorCode::ProbeFailed,
            port,
            source,
        }
    }

    pub fn port_supply_failed(message: impl Into<String>, source: Option<io::Error>) -> Self {
        BindpointError::PortSupply {
            message: message.into(),
            code: ErrorCode::PortSupplyFailed,
            source,
        }
    }

    pub fn invalid_port_range(start: u16, end: u16) -> Self {
        BindpointError::Config {
            message: format!("Invalid port range: {}-{}", start, end),
            code: ErrorCode::InvalidPortRange,
            source: None,
        }
    }

    pub fn invalid_log_level(level: &str) -> Self {
        BindpointError::Config {
            message: format!("Invalid log level: {}", level),
            code: ErrorCode::InvalidLogLevel,
            source: None,
        }
    }

    pub fn invalid_server_kind(kind: &str) -> Self {
        BindpointError::Config {
            message: format!("Unknown server kind: {}", kind),
            code: ErrorCode::InvalidServerKind,
            source: None,
        }
    }
}

/// Result type alias for Bindpoint operations
pub type Result<T> = std::result::Result<T, BindpointError>;
