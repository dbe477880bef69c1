//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Normalize legacy values before validation
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GateConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{
    GateConfig, PolicyConfig, DEFAULT_MAX_REQUESTS_PER_MINUTE, DEFAULT_TIME_SKEW_SECS,
};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),

    #[error("executor.timeout_secs must be greater than zero")]
    ExecutorTimeout,

    #[error("executor.program must not be empty when set")]
    EmptyProgram,

    #[error("policy.{list} contains an empty entry")]
    EmptyListEntry { list: &'static str },
}

/// Fill in values the legacy loader treated as "unset".
///
/// A zero rate limit falls back to the default budget.
pub fn normalize_config(config: &mut GateConfig) {
    if config.policy.max_requests_per_minute == 0 {
        config.policy.max_requests_per_minute = DEFAULT_MAX_REQUESTS_PER_MINUTE;
    }
}

/// Extra defaults for the legacy flat JSON policy, where a zero skew
/// tolerance also meant "unset".
///
/// TOML configs keep a zero tolerance as an exact-match window.
pub fn normalize_legacy_policy(policy: &mut PolicyConfig) {
    if policy.time_skew_tolerance_secs == 0 {
        policy.time_skew_tolerance_secs = DEFAULT_TIME_SKEW_SECS;
    }
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.executor.timeout_secs == 0 {
        errors.push(ValidationError::ExecutorTimeout);
    }

    if matches!(config.executor.program.as_deref(), Some(p) if p.trim().is_empty()) {
        errors.push(ValidationError::EmptyProgram);
    }

    let lists: [(&'static str, &Vec<String>); 3] = [
        ("allowed_origins", &config.policy.allowed_origins),
        ("ip_allowlist", &config.policy.ip_allowlist),
        ("command_whitelist", &config.policy.command_whitelist),
    ];
    for (list, entries) in lists {
        if entries.iter().any(|e| e.trim().is_empty()) {
            errors.push(ValidationError::EmptyListEntry { list });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
