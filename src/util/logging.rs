// src/util/logging.rs
//
// Logging configuration utilities

use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

/// Set up logging at the given level. `RUST_LOG` takes precedence when set.
pub fn setup(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bindpoint={}", log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed when embedded in a test harness
    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
}
