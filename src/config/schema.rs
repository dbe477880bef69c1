//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Replay window applied when the config does not name one.
pub const DEFAULT_TIME_SKEW_SECS: u64 = 120;

/// Per-client budget applied when the config does not name one (or names 0).
pub const DEFAULT_MAX_REQUESTS_PER_MINUTE: u32 = 60;

/// Root configuration for the command gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Admission policy consulted by the request pipeline.
    pub policy: PolicyConfig,

    /// How admitted commands are executed.
    pub executor: ExecutorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:30120").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:30120".to_string(),
        }
    }
}

/// Admission policy snapshot.
///
/// Loaded once and shared read-only behind an `Arc` for the life of the
/// process. The camelCase aliases accept the legacy flat `config.json`
/// document as-is.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Shared secret every request token must equal. Empty disables the check.
    #[serde(alias = "apiKey")]
    pub shared_secret: String,

    /// Origin/Referer prefixes allowed to call. Empty allows all.
    #[serde(alias = "allowedOrigins")]
    pub allowed_origins: Vec<String>,

    /// Client IPs allowed to call. Empty allows all.
    #[serde(alias = "ipWhitelist")]
    pub ip_allowlist: Vec<String>,

    /// Maximum distance between request timestamp and now, in seconds.
    #[serde(alias = "timeSkewSec")]
    pub time_skew_tolerance_secs: u64,

    /// Allowed command verbs. Empty allows all.
    #[serde(alias = "whitelist")]
    pub command_whitelist: Vec<String>,

    /// Emit an audit line for every admitted command.
    #[serde(alias = "logCommands")]
    pub log_enabled: bool,

    /// Fixed-window budget per client per minute.
    #[serde(alias = "maxPerMinute")]
    pub max_requests_per_minute: u32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            shared_secret: String::new(),
            allowed_origins: Vec::new(),
            ip_allowlist: Vec::new(),
            time_skew_tolerance_secs: DEFAULT_TIME_SKEW_SECS,
            command_whitelist: Vec::new(),
            log_enabled: true,
            max_requests_per_minute: DEFAULT_MAX_REQUESTS_PER_MINUTE,
        }
    }
}

// Hand-written so the secret never reaches a log line.
impl std::fmt::Debug for PolicyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyConfig")
            .field(
                "shared_secret",
                &if self.shared_secret.is_empty() { "<unset>" } else { "<redacted>" },
            )
            .field("allowed_origins", &self.allowed_origins)
            .field("ip_allowlist", &self.ip_allowlist)
            .field("time_skew_tolerance_secs", &self.time_skew_tolerance_secs)
            .field("command_whitelist", &self.command_whitelist)
            .field("log_enabled", &self.log_enabled)
            .field("max_requests_per_minute", &self.max_requests_per_minute)
            .finish()
    }
}

/// Executor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Program that receives admitted commands. `None` runs in dry-run mode.
    pub program: Option<String>,

    /// Arguments placed before the command string.
    pub args: Vec<String>,

    /// Deadline for a single execution in seconds.
    pub timeout_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: None,
            args: Vec::new(),
            timeout_secs: 10,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of the pretty format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_permissive() {
        let policy = PolicyConfig::default();
        assert!(policy.shared_secret.is_empty());
        assert!(policy.allowed_origins.is_empty());
        assert!(policy.ip_allowlist.is_empty());
        assert!(policy.command_whitelist.is_empty());
        assert_eq!(policy.time_skew_tolerance_secs, 120);
        assert_eq!(policy.max_requests_per_minute, 60);
        assert!(policy.log_enabled);
    }

    #[test]
    fn test_legacy_json_keys() {
        let raw = r#"{
            "apiKey": "s3cret",
            "allowedOrigins": ["https://panel.example"],
            "ipWhitelist": ["10.0.0.1"],
            "timeSkewSec": 30,
            "whitelist": ["say", "kick"],
            "logCommands": false,
            "maxPerMinute": 5
        }"#;
        let policy: PolicyConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(policy.shared_secret, "s3cret");
        assert_eq!(policy.allowed_origins, vec!["https://panel.example"]);
        assert_eq!(policy.ip_allowlist, vec!["10.0.0.1"]);
        assert_eq!(policy.time_skew_tolerance_secs, 30);
        assert_eq!(policy.command_whitelist, vec!["say", "kick"]);
        assert!(!policy.log_enabled);
        assert_eq!(policy.max_requests_per_minute, 5);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let raw = r#"
            [policy]
            shared_secret = "abc"

            [executor]
            program = "/usr/local/bin/rcon"
        "#;
        let config: GateConfig = toml::from_str(raw).unwrap();
        assert_eq!(config.policy.shared_secret, "abc");
        assert_eq!(config.policy.time_skew_tolerance_secs, 120);
        assert_eq!(config.executor.program.as_deref(), Some("/usr/local/bin/rcon"));
        assert_eq!(config.executor.timeout_secs, 10);
        assert_eq!(config.listener.bind_address, "0.0.0.0:30120");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let policy = PolicyConfig {
            shared_secret: "hunter2".into(),
            ..PolicyConfig::default()
        };
        let rendered = format!("{:?}", policy);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("<redacted>"));
    }
}
