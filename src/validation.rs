// Input validation for schemes, port ranges and log levels

use crate::errors::{BindpointError, Result};

/// Validate a URI scheme (RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ))
pub fn validate_scheme(scheme: &str) -> Result<()> {
    let mut chars = scheme.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return Err(BindpointError::invalid_scheme(scheme)),
    }

    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return Err(BindpointError::invalid_scheme(scheme));
    }

    Ok(())
}

/// Validate an inclusive port range
pub fn validate_port_range(start: u16, end: u16) -> Result<()> {
    if start == 0 || start > end {
        return Err(BindpointError::invalid_port_range(start, end));
    }
    Ok(())
}

/// Validate a log level string
pub fn validate_log_level(level: &str) -> Result<()> {
    match level {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(BindpointError::invalid_log_level(level)),
    }
}
