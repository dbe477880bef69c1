//! Audit trail for admitted commands.

/// Receives one line per admitted command.
pub trait AuditSink: Send + Sync {
    fn record(&self, line: &str);
}

/// `"<client> -> <command>"`
pub fn format_audit_line(client_address: &str, command: &str) -> String {
    format!("{} -> {}", client_address, command)
}

/// Writes audit lines to the `command_gate::audit` tracing target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, line: &str) {
        tracing::info!(target: "command_gate::audit", "{}", line);
    }
}
