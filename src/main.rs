// src/main.rs
//
// Endpoints for servers under test

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use bindpoint::config::Config;
use bindpoint::util::logging;
use bindpoint::{EndpointRequest, EndpointResolver, ServerKind, SslPortFinder, SslPortRange};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Pick URIs and ports for integration test servers")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Logging level
    #[arg(long, global = true, value_name = "LEVEL", help = "Logging level (trace, debug, info, warn, error)")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve the URI a test server should bind to
    Resolve {
        /// How the server reports its port
        #[arg(long, value_enum)]
        kind: Option<ServerKind>,

        /// URI scheme
        #[arg(long)]
        scheme: Option<String>,

        /// Hint URI; port 0 is replaced with a fresh port
        #[arg(long, value_name = "URI")]
        hint: Option<String>,

        /// Whether the server prints a status message with its bound port
        #[arg(long, value_name = "BOOL")]
        status_messages: Option<bool>,

        /// Print JSON instead of the bare URI
        #[arg(long)]
        json: bool,
    },

    /// Find a free port in the SSL port range
    SslPort {
        #[arg(long, requires = "end")]
        start: Option<u16>,

        #[arg(long, requires = "start")]
        end: Option<u16>,
    },

    /// Print an example configuration file
    ExampleConfig,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_env_vars()?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    logging::setup(&config.logging.level, config.logging.format);

    match args.command {
        Command::Resolve { kind, scheme, hint, status_messages, json } => {
            let kind = kind.unwrap_or(config.resolver.server_kind);
            let mut request = EndpointRequest::new(kind)
                .with_scheme(scheme.unwrap_or(config.resolver.default_scheme))
                .with_optional_hint(hint);
            if let Some(enabled) = status_messages {
                request = request.with_status_messages(enabled);
            }

            let endpoint = EndpointResolver::process_wide().resolve(&request)?;
            info!(%endpoint, kind = %kind, "Resolved endpoint");

            if json {
                println!("{}", serde_json::json!({
                    "uri": endpoint,
                    "scheme": endpoint.scheme(),
                    "host": endpoint.host(),
                    "port": endpoint.port(),
                }));
            } else {
                println!("{}", endpoint);
            }
        }
        Command::SslPort { start, end } => {
            let range = match (start, end) {
                (Some(start), Some(end)) => SslPortRange::new(start, end)?,
                _ => config.ssl.range()?,
            };
            let port = SslPortFinder::new(range)?.find_next_available()?;
            info!(port, "Found SSL port");
            println!("{}", port);
        }
        Command::ExampleConfig => {
            print!("{}", Config::example_toml());
        }
    }

    Ok(())
}
