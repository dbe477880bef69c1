//! Command Gate
//!
//! A gated remote-command endpoint built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────┐
//!                      │                 COMMAND GATE                  │
//!                      │                                               │
//!     POST /zcf/exec   │  ┌────────┐   ┌──────────────────────────┐    │
//!     ─────────────────┼─▶│  http  │──▶│         pipeline         │    │
//!                      │  │ server │   │ rate → origin → ip →     │    │
//!                      │  └────────┘   │ body → fields → secret → │    │
//!                      │      ▲        │ timestamp → hmac →       │    │
//!                      │      │        │ command → whitelist      │    │
//!     JSON status      │      │        └────────────┬─────────────┘    │
//!     ◀────────────────┼──────┘                     ▼                  │
//!                      │                     ┌────────────┐            │
//!                      │                     │  executor  │────────────┼──▶ Host
//!                      │                     └────────────┘            │
//!                      │                                               │
//!                      │  config · security · observability · lifecycle│
//!                      └───────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::path::PathBuf;

use command_gate::config::{self, GateConfig};
use command_gate::lifecycle::{signals, startup, Shutdown};
use command_gate::observability::logging;

#[derive(Parser)]
#[command(name = "command-gate")]
#[command(about = "Authenticated, rate-limited remote command endpoint", long_about = None)]
struct Cli {
    /// Path to the configuration file (.toml, or legacy .json)
    #[arg(short, long, default_value = "command-gate.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Tracing depends on the config, so report load problems after init.
    let loaded = config::load_or_default(&cli.config);
    let observability = match &loaded {
        Ok((config, _)) => config.observability.clone(),
        Err(_) => GateConfig::default().observability,
    };

    logging::init_tracing(&observability);

    tracing::info!("command-gate v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match loaded {
        Ok((config, None)) => {
            tracing::info!(path = %cli.config.display(), "Configuration loaded");
            config
        }
        Ok((config, Some(reason))) => {
            config::report_fallback(&cli.config, &reason);
            config
        }
        Err(e) => {
            tracing::error!(path = %cli.config.display(), error = %e, "Config rejected");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    // Subscribe before any signal can fire.
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    startup::start(config, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
