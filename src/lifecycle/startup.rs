//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the listener and begin accepting traffic
//! - Hand the shutdown channel to the server
//!
//! # Design Decisions
//! - Configuration is loaded before tracing is up, so it arrives here parsed
//! - Bind failures are fatal and surface to `main`

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::GateConfig;
use crate::http::HttpServer;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Bring the gate up and serve until `shutdown` fires.
///
/// A signal already queued on `shutdown` stops the server right after bind.
pub async fn start(
    config: GateConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                address = %config.observability.metrics_address,
                error = %e,
                "Invalid metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    tracing::info!(
        address = %address,
        rate_limit = config.policy.max_requests_per_minute,
        token_required = !config.policy.shared_secret.is_empty(),
        "Command gate listening"
    );

    let server = HttpServer::new(config);
    server.run(listener, shutdown).await?;
    Ok(())
}
