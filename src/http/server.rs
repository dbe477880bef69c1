//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, request ID, panic catching)
//! - Bind server to listener
//! - Dispatch `/zcf/exec` to the request pipeline
//! - Run background maintenance (rate counter eviction)
//! - Observability (metrics, correlation IDs)

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::clock::{Clock, SystemClock};
use crate::config::GateConfig;
use crate::executor::{self, CommandExecutor};
use crate::http::request::{
    content_length, origin_header, propagate_request_id_layer, set_request_id_layer,
};
use crate::http::response::{error_response, ok_response, panic_response, ping_response};
use crate::observability::audit::{AuditSink, TracingAuditSink};
use crate::observability::metrics;
use crate::pipeline::{ErrorKind, RequestPipeline};
use crate::security::RateLimitSweeper;

/// Route answering liveness probes.
pub const PING_PATH: &str = "/zcf/ping";

/// Route accepting signed commands.
pub const EXEC_PATH: &str = "/zcf/exec";

/// How often expired rate counters are swept.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RequestPipeline>,
    pub clock: Arc<dyn Clock>,
}

/// HTTP server for the command gate.
pub struct HttpServer {
    router: Router,
    config: GateConfig,
    pipeline: Arc<RequestPipeline>,
}

impl HttpServer {
    /// Create a server with the system clock, the configured executor and
    /// the tracing audit sink.
    pub fn new(config: GateConfig) -> Self {
        let executor = executor::from_config(&config.executor);
        Self::with_components(config, Arc::new(SystemClock), executor, Arc::new(TracingAuditSink))
    }

    /// Create a server with explicit collaborators.
    pub fn with_components(
        config: GateConfig,
        clock: Arc<dyn Clock>,
        executor: Arc<dyn CommandExecutor>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        let pipeline = Arc::new(
            RequestPipeline::new(
                Arc::new(config.policy.clone()),
                clock.clone(),
                executor,
                audit,
            )
            .with_exec_timeout(Duration::from_secs(config.executor.timeout_secs)),
        );

        let state = AppState {
            pipeline: pipeline.clone(),
            clock,
        };

        Self {
            router: Self::build_router(state),
            config,
            pipeline,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        Router::new()
            .route(PING_PATH, any(ping_handler))
            .route(EXEC_PATH, post(exec_handler).fallback(method_not_allowed))
            .fallback(not_found)
            .with_state(state)
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server until the shutdown channel fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        let sweeper = RateLimitSweeper::new(self.pipeline.rate_limiter().clone(), SWEEP_INTERVAL);
        let sweeper = tokio::spawn(sweeper.run(shutdown.resubscribe()));

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        // A signal queued before `resubscribe` never reaches the sweeper.
        sweeper.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn pipeline(&self) -> &Arc<RequestPipeline> {
        &self.pipeline
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

async fn ping_handler(State(state): State<AppState>) -> Response {
    ping_response(state.clock.now_secs())
}

/// Runs the pipeline for one command request.
async fn exec_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let (parts, body) = request.into_parts();

    let client_address = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();
    let origin = origin_header(&parts.headers);
    let declared_len = content_length(&parts.headers);

    match state
        .pipeline
        .process(&client_address, origin, declared_len, body)
        .await
    {
        Ok(()) => {
            metrics::record_request("admitted", 200, start_time);
            ok_response()
        }
        Err(err) => {
            let outcome = if err.kind() == ErrorKind::ExecutionFailed {
                "failed"
            } else {
                "denied"
            };
            metrics::record_request(outcome, err.status().as_u16(), start_time);
            err.into_response()
        }
    }
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not Found")
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}
