//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests by outcome and status
//! - `gate_request_duration_seconds` (histogram): handling latency by outcome
//! - `gate_denials_total` (counter): denials by reason
//! - `gate_exec_duration_seconds` (histogram): executor latency by result
//! - `gate_rate_limit_tracked_clients` (gauge): keys held by the rate limiter
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are static strings; client addresses never become labels

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(outcome: &'static str, status: u16, start_time: Instant) {
    counter!(
        "gate_requests_total",
        "outcome" => outcome,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("gate_request_duration_seconds", "outcome" => outcome)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_denial(reason: &'static str) {
    counter!("gate_denials_total", "reason" => reason).increment(1);
}

pub fn record_execution(success: bool, elapsed: Duration) {
    let result = if success { "ok" } else { "error" };
    histogram!("gate_exec_duration_seconds", "result" => result).record(elapsed.as_secs_f64());
}

pub fn set_tracked_clients(count: usize) {
    gauge!("gate_rate_limit_tracked_clients").set(count as f64);
}
