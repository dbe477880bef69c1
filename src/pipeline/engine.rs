//! Ordered admission pipeline.
//!
//! # Stages
//! ```text
//! Received → RateChecked → OriginChecked → IpChecked → BodyParsed
//!     → FieldsValidated → Authenticated → TimestampValidated
//!     → SignatureValidated → WhitelistValidated → Admitted
//!
//! Any failing guard → Denied(reason); later guards never run.
//! ```
//!
//! Guards run cheapest first: nothing past the IP check touches the body,
//! and nothing past body parsing does more than string work until the
//! HMAC step.

use axum::body::Body;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::PolicyConfig;
use crate::executor::{CommandExecutor, ExecutionError};
use crate::observability::audit::{format_audit_line, AuditSink};
use crate::observability::metrics;
use crate::security::limits::{read_bounded, BodyError, MAX_BODY_BYTES};
use crate::security::signature::{self, constant_time_eq};
use crate::security::{
    normalize_command, strip_port, CommandWhitelist, IpGate, OriginGate, RateLimiter, ReplayGuard,
};

use super::decision::Decision;
use super::error::GateError;
use super::request::IncomingCommandRequest;

/// Default executor deadline.
pub const DEFAULT_EXEC_TIMEOUT: Duration = Duration::from_secs(10);

/// Last stage a request passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    RateChecked,
    OriginChecked,
    IpChecked,
    BodyParsed,
    FieldsValidated,
    Authenticated,
    TimestampValidated,
    SignatureValidated,
    WhitelistValidated,
    Admitted,
}

/// Runs every guard, in order, for one request.
pub struct RequestPipeline {
    policy: Arc<PolicyConfig>,
    rate_limiter: Arc<RateLimiter>,
    origin_gate: OriginGate,
    ip_gate: IpGate,
    replay_guard: ReplayGuard,
    whitelist: CommandWhitelist,
    executor: Arc<dyn CommandExecutor>,
    audit: Arc<dyn AuditSink>,
    exec_timeout: Duration,
}

impl RequestPipeline {
    pub fn new(
        policy: Arc<PolicyConfig>,
        clock: Arc<dyn Clock>,
        executor: Arc<dyn CommandExecutor>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            rate_limiter: Arc::new(RateLimiter::new(policy.max_requests_per_minute, clock.clone())),
            origin_gate: OriginGate::from_policy(&policy),
            ip_gate: IpGate::from_policy(&policy),
            replay_guard: ReplayGuard::new(policy.time_skew_tolerance_secs, clock),
            whitelist: CommandWhitelist::from_policy(&policy),
            policy,
            executor,
            audit,
            exec_timeout: DEFAULT_EXEC_TIMEOUT,
        }
    }

    pub fn with_exec_timeout(mut self, timeout: Duration) -> Self {
        self.exec_timeout = timeout;
        self
    }

    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Run guards 1–10 and report the decision without executing anything.
    pub async fn decide(
        &self,
        client_address: &str,
        origin: Option<&str>,
        declared_len: Option<u64>,
        body: Body,
    ) -> Decision {
        self.evaluate(client_address, origin, declared_len, body)
            .await
            .into()
    }

    /// Run every guard and, on admission, audit and execute the command.
    pub async fn process(
        &self,
        client_address: &str,
        origin: Option<&str>,
        declared_len: Option<u64>,
        body: Body,
    ) -> Result<(), GateError> {
        let command = self
            .evaluate(client_address, origin, declared_len, body)
            .await?;
        self.execute(client_address, command).await
    }

    async fn evaluate(
        &self,
        client_address: &str,
        origin: Option<&str>,
        declared_len: Option<u64>,
        body: Body,
    ) -> Result<String, GateError> {
        let mut stage = Stage::Received;
        let result = self
            .run_guards(client_address, origin, declared_len, body, &mut stage)
            .await;

        match &result {
            Ok(command) => tracing::info!(
                client = %client_address,
                command = %command,
                "Command admitted"
            ),
            Err(err) => self.log_denial(client_address, stage, *err),
        }
        result
    }

    async fn run_guards(
        &self,
        client_address: &str,
        origin: Option<&str>,
        declared_len: Option<u64>,
        body: Body,
        stage: &mut Stage,
    ) -> Result<String, GateError> {
        self.connection_guards(client_address, origin, stage)?;

        let bytes = read_bounded(body, declared_len, MAX_BODY_BYTES)
            .await
            .map_err(|e| match e {
                BodyError::TooLarge { .. } => GateError::PayloadTooLarge,
                BodyError::Read(detail) => {
                    tracing::debug!(client = %client_address, error = %detail, "Body read failed");
                    GateError::BodyRead
                }
            })?;

        let request = IncomingCommandRequest::parse(client_address, origin, &bytes)
            .inspect_err(|err| {
                if *err == GateError::MissingFields {
                    *stage = Stage::BodyParsed;
                }
            })?;
        *stage = Stage::FieldsValidated;

        self.request_guards(&request, stage)
    }

    fn connection_guards(
        &self,
        client_address: &str,
        origin: Option<&str>,
        stage: &mut Stage,
    ) -> Result<(), GateError> {
        if self.rate_limiter.check(&strip_port(client_address)) {
            return Err(GateError::RateLimited);
        }
        *stage = Stage::RateChecked;

        if !self.origin_gate.allowed(origin) {
            return Err(GateError::OriginNotAllowed);
        }
        *stage = Stage::OriginChecked;

        if !self.ip_gate.allowed(client_address) {
            return Err(GateError::IpNotAllowed);
        }
        *stage = Stage::IpChecked;

        Ok(())
    }

    fn request_guards(
        &self,
        request: &IncomingCommandRequest,
        stage: &mut Stage,
    ) -> Result<String, GateError> {
        let secret = &self.policy.shared_secret;
        if !secret.is_empty() && !constant_time_eq(secret.as_bytes(), request.token.as_bytes()) {
            return Err(GateError::Unauthorized);
        }
        *stage = Stage::Authenticated;

        if !self.replay_guard.fresh(request.timestamp_secs) {
            return Err(GateError::StaleTimestamp);
        }
        *stage = Stage::TimestampValidated;

        // An empty hmac field means the caller chose not to sign.
        if !request.supplied_hmac.is_empty()
            && !signature::verify(
                &request.token,
                request.timestamp_secs,
                &request.command_text,
                &request.supplied_hmac,
            )
        {
            return Err(GateError::BadSignature);
        }
        *stage = Stage::SignatureValidated;

        if !self.whitelist.permitted(&request.command_text) {
            return Err(GateError::CommandNotWhitelisted);
        }
        *stage = Stage::WhitelistValidated;

        let command = normalize_command(&request.command_text);
        if command.is_empty() {
            return Err(GateError::EmptyCommand);
        }
        *stage = Stage::Admitted;

        Ok(command.to_string())
    }

    /// Audit (when enabled) and run an admitted command under the deadline.
    pub async fn execute(&self, client_address: &str, command: String) -> Result<(), GateError> {
        if self.policy.log_enabled {
            self.audit.record(&format_audit_line(client_address, &command));
        }

        let executor = self.executor.clone();
        let start = Instant::now();
        let task = tokio::task::spawn_blocking(move || executor.execute(&command));

        let result = match tokio::time::timeout(self.exec_timeout, task).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(join_err)) => Err(ExecutionError::Aborted(join_err.to_string())),
            Err(_) => Err(ExecutionError::Timeout(self.exec_timeout.as_secs())),
        };
        metrics::record_execution(result.is_ok(), start.elapsed());

        result.map_err(|e| {
            tracing::error!(client = %client_address, error = %e, "Command execution failed");
            GateError::ExecutionFailed
        })
    }

    fn log_denial(&self, client_address: &str, stage: Stage, err: GateError) {
        metrics::record_denial(err.label());
        tracing::warn!(
            client = %client_address,
            passed = ?stage,
            reason = err.label(),
            status = err.status().as_u16(),
            "Request denied"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::observability::audit::TracingAuditSink;
    use serde_json::json;
    use std::sync::Mutex;

    const NOW: i64 = 1_700_000_000;
    const CLIENT: &str = "10.1.2.3:40000";

    #[derive(Default)]
    struct Recording {
        commands: Mutex<Vec<String>>,
    }

    impl CommandExecutor for Recording {
        fn execute(&self, command: &str) -> Result<(), ExecutionError> {
            self.commands.lock().unwrap().push(command.to_string());
            Ok(())
        }
    }

    impl AuditSink for Recording {
        fn record(&self, line: &str) {
            self.commands.lock().unwrap().push(line.to_string());
        }
    }

    struct Failing;

    impl CommandExecutor for Failing {
        fn execute(&self, _command: &str) -> Result<(), ExecutionError> {
            Err(ExecutionError::Other("console rejected command".into()))
        }
    }

    struct Panicking;

    impl CommandExecutor for Panicking {
        fn execute(&self, _command: &str) -> Result<(), ExecutionError> {
            panic!("executor bug");
        }
    }

    struct Slow;

    impl CommandExecutor for Slow {
        fn execute(&self, _command: &str) -> Result<(), ExecutionError> {
            std::thread::sleep(Duration::from_millis(500));
            Ok(())
        }
    }

    struct Harness {
        pipeline: RequestPipeline,
        executed: Arc<Recording>,
        audit: Arc<Recording>,
        clock: Arc<ManualClock>,
    }

    fn harness(policy: PolicyConfig) -> Harness {
        harness_with(policy, None)
    }

    fn harness_with(policy: PolicyConfig, executor: Option<Arc<dyn CommandExecutor>>) -> Harness {
        let clock = Arc::new(ManualClock::new(NOW as u64 * 1000));
        let executed = Arc::new(Recording::default());
        let audit = Arc::new(Recording::default());
        let pipeline = RequestPipeline::new(
            Arc::new(policy),
            clock.clone(),
            executor.unwrap_or_else(|| executed.clone() as Arc<dyn CommandExecutor>),
            audit.clone(),
        );
        Harness {
            pipeline,
            executed,
            audit,
            clock,
        }
    }

    fn body(value: serde_json::Value) -> Body {
        Body::from(serde_json::to_vec(&value).unwrap())
    }

    fn exec_body(token: &str, timestamp: i64, command: &str, hmac: &str) -> Body {
        body(json!({"token": token, "timestamp": timestamp, "command": command, "hmac": hmac}))
    }

    async fn decide(h: &Harness, origin: Option<&str>, body: Body) -> Decision {
        h.pipeline.decide(CLIENT, origin, None, body).await
    }

    fn deny(status: u16, reason: &str) -> Decision {
        Decision::Deny {
            http_status: status,
            reason: reason.into(),
        }
    }

    fn admit(command: &str) -> Decision {
        Decision::Admit {
            normalized_command: command.into(),
        }
    }

    #[tokio::test]
    async fn test_permissive_defaults_admit() {
        let h = harness(PolicyConfig::default());
        let decision = decide(&h, None, exec_body("abc", NOW, "/say hi", "")).await;
        assert_eq!(decision, admit("say hi"));
    }

    #[tokio::test]
    async fn test_process_executes_and_audits() {
        let h = harness(PolicyConfig::default());
        h.pipeline
            .process(CLIENT, None, None, exec_body("abc", NOW, "/say hi", ""))
            .await
            .unwrap();

        assert_eq!(*h.executed.commands.lock().unwrap(), vec!["say hi"]);
        assert_eq!(*h.audit.commands.lock().unwrap(), vec![format!("{} -> say hi", CLIENT)]);
    }

    #[tokio::test]
    async fn test_audit_disabled() {
        let h = harness(PolicyConfig {
            log_enabled: false,
            ..PolicyConfig::default()
        });
        h.pipeline
            .process(CLIENT, None, None, exec_body("abc", NOW, "say hi", ""))
            .await
            .unwrap();

        assert_eq!(h.executed.commands.lock().unwrap().len(), 1);
        assert!(h.audit.commands.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rate_limit_is_first_guard() {
        let h = harness(PolicyConfig {
            max_requests_per_minute: 2,
            allowed_origins: vec!["https://panel.example".into()],
            ..PolicyConfig::default()
        });

        for _ in 0..2 {
            let d = decide(&h, Some("https://evil.example"), Body::empty()).await;
            assert_eq!(d, deny(403, "Origin not allowed"));
        }
        let d = decide(&h, Some("https://evil.example"), Body::empty()).await;
        assert_eq!(d, deny(429, "Too Many Requests"));

        // Same host, different port, same budget.
        let d = h
            .pipeline
            .decide("10.1.2.3:1", Some("https://panel.example"), None, Body::empty())
            .await;
        assert_eq!(d, deny(429, "Too Many Requests"));

        h.clock.advance_millis(60_001);
        let d = decide(&h, Some("https://panel.example"), exec_body("t", NOW, "x", "")).await;
        assert!(d.is_admit());
    }

    #[tokio::test]
    async fn test_ip_gate_runs_before_body() {
        let h = harness(PolicyConfig {
            ip_allowlist: vec!["192.168.0.1".into()],
            ..PolicyConfig::default()
        });
        let oversized = Body::from(vec![b'x'; 5000]);
        assert_eq!(decide(&h, None, oversized).await, deny(403, "IP not allowed"));

        let d = h
            .pipeline
            .decide("192.168.0.1:1234", None, None, exec_body("t", NOW, "x", ""))
            .await;
        assert!(d.is_admit());
    }

    #[tokio::test]
    async fn test_oversized_before_json() {
        let h = harness(PolicyConfig::default());
        let garbage = Body::from(vec![b'{'; MAX_BODY_BYTES + 1]);
        assert_eq!(decide(&h, None, garbage).await, deny(413, "Payload too large"));

        let d = h.pipeline.decide(CLIENT, None, Some(10_000), Body::empty()).await;
        assert_eq!(d, deny(413, "Payload too large"));
    }

    #[tokio::test]
    async fn test_malformed_bodies() {
        let h = harness(PolicyConfig::default());
        assert_eq!(decide(&h, None, Body::from("not json")).await, deny(400, "Invalid JSON"));
        assert_eq!(decide(&h, None, Body::empty()).await, deny(400, "Missing fields"));
        assert_eq!(
            decide(&h, None, body(json!({"token": "t"}))).await,
            deny(400, "Missing fields")
        );
    }

    #[tokio::test]
    async fn test_shared_secret() {
        let h = harness(PolicyConfig {
            shared_secret: "S".into(),
            ..PolicyConfig::default()
        });
        // Wrong token loses even with an otherwise perfect request.
        let sig = signature::sign("T", NOW, "say hi");
        assert_eq!(
            decide(&h, None, exec_body("T", NOW, "say hi", &sig)).await,
            deny(401, "Unauthorized")
        );
        assert_eq!(
            decide(&h, None, exec_body("S", NOW, "say hi", "")).await,
            admit("say hi")
        );
    }

    #[tokio::test]
    async fn test_timestamp_boundary() {
        let h = harness(PolicyConfig {
            time_skew_tolerance_secs: 30,
            ..PolicyConfig::default()
        });
        assert!(decide(&h, None, exec_body("t", NOW - 30, "x", "")).await.is_admit());
        assert!(decide(&h, None, exec_body("t", NOW + 30, "x", "")).await.is_admit());
        assert_eq!(
            decide(&h, None, exec_body("t", NOW - 31, "x", "")).await,
            deny(401, "Stale timestamp")
        );
        // Zero means unsigned by time.
        assert!(decide(&h, None, exec_body("t", 0, "x", "")).await.is_admit());
    }

    #[tokio::test]
    async fn test_signature() {
        let h = harness(PolicyConfig::default());
        let sig = signature::sign("tok", NOW, "/kick 5");
        assert_eq!(
            decide(&h, None, exec_body("tok", NOW, "/kick 5", &sig)).await,
            admit("kick 5")
        );

        let mut tampered = sig.clone().into_bytes();
        tampered[10] = if tampered[10] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert_eq!(
            decide(&h, None, exec_body("tok", NOW, "/kick 5", &tampered)).await,
            deny(401, "Bad signature")
        );

        // Signed over a different command.
        assert_eq!(
            decide(&h, None, exec_body("tok", NOW, "/kick 6", &sig)).await,
            deny(401, "Bad signature")
        );
    }

    #[tokio::test]
    async fn test_stale_checked_before_signature() {
        let h = harness(PolicyConfig::default());
        let old = NOW - 10_000;
        let sig = signature::sign("tok", old, "x");
        assert_eq!(
            decide(&h, None, exec_body("tok", old, "x", &sig)).await,
            deny(401, "Stale timestamp")
        );
    }

    #[tokio::test]
    async fn test_whitelist() {
        let kick_only = harness(PolicyConfig {
            command_whitelist: vec!["kick".into()],
            ..PolicyConfig::default()
        });
        assert_eq!(
            decide(&kick_only, None, exec_body("t", NOW, "/kick 5", "")).await,
            admit("kick 5")
        );

        let ban_only = harness(PolicyConfig {
            command_whitelist: vec!["ban".into()],
            ..PolicyConfig::default()
        });
        assert_eq!(
            decide(&ban_only, None, exec_body("t", NOW, "/kick 5", "")).await,
            deny(403, "Command not whitelisted")
        );
    }

    #[tokio::test]
    async fn test_empty_command() {
        let h = harness(PolicyConfig::default());
        assert_eq!(decide(&h, None, exec_body("t", NOW, "/", "")).await, deny(400, "Empty command"));
        assert_eq!(decide(&h, None, exec_body("t", NOW, "  ", "")).await, deny(400, "Empty command"));
    }

    #[tokio::test]
    async fn test_executor_failure_is_500() {
        let h = harness_with(PolicyConfig::default(), Some(Arc::new(Failing)));
        let err = h
            .pipeline
            .process(CLIENT, None, None, exec_body("t", NOW, "say hi", ""))
            .await
            .unwrap_err();
        assert_eq!(err, GateError::ExecutionFailed);
        assert_eq!(err.status().as_u16(), 500);
    }

    #[tokio::test]
    async fn test_executor_panic_is_500() {
        let h = harness_with(PolicyConfig::default(), Some(Arc::new(Panicking)));
        let err = h.pipeline.execute(CLIENT, "say hi".into()).await.unwrap_err();
        assert_eq!(err, GateError::ExecutionFailed);
    }

    #[tokio::test]
    async fn test_executor_timeout_is_500() {
        let clock = Arc::new(ManualClock::new(NOW as u64 * 1000));
        let pipeline = RequestPipeline::new(
            Arc::new(PolicyConfig::default()),
            clock,
            Arc::new(Slow),
            Arc::new(TracingAuditSink),
        )
        .with_exec_timeout(Duration::from_millis(50));

        let started = Instant::now();
        let err = pipeline.execute(CLIENT, "say hi".into()).await.unwrap_err();
        assert_eq!(err, GateError::ExecutionFailed);
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
