//! AskRelay CLI — the main entry point.
//!
//! Commands:
//! - `serve`   — Start the HTTP server
//! - `check`   — Smoke-test a running server
//! - `status`  — Show resolved configuration
//! - `doctor`  — Diagnose configuration and upstream reachability

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use askrelay_config::{AppConfig, LoggingConfig};

mod commands;

#[derive(Parser)]
#[command(
    name = "askrelay",
    about = "AskRelay — minimal LLM chat backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $ASKRELAY_CONFIG, then ./askrelay.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run smoke checks against a running server
    Check {
        /// Server base URL (defaults to http://localhost:<gateway.port>)
        #[arg(short, long)]
        base_url: Option<String>,
    },

    /// Show resolved configuration
    Status,

    /// Diagnose configuration and upstream reachability
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config_path = AppConfig::resolve_path(cli.config.as_deref());
    let config = AppConfig::load(Some(&config_path));

    let logging = config
        .as_ref()
        .map(|c| c.logging.clone())
        .unwrap_or_default();
    init_tracing(&logging, cli.verbose);

    match cli.command {
        Commands::Serve { port } => commands::serve::run(config?, port).await?,
        Commands::Check { base_url } => commands::check::run(&config?, base_url).await?,
        Commands::Status => commands::status::run(&config?, &config_path)?,
        Commands::Doctor => commands::doctor::run(config, &config_path).await?,
    }

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig, verbose: bool) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if logging.format == "text" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}
