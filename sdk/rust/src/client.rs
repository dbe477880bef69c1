use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

type HmacSha256 = Hmac<Sha256>;

/// Body of `POST /zcf/exec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecRequest {
    pub token: String,
    pub timestamp: i64,
    pub command: String,
    pub hmac: String,
}

/// Status and JSON body returned by the gate.
#[derive(Debug, Clone)]
pub struct GateResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl GateResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// The `message` field of an error body.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message").and_then(|m| m.as_str())
    }
}

/// Lowercase hex HMAC-SHA256 of `token|timestamp|command`, keyed by `token`.
pub fn sign_command(token: &str, timestamp: i64, command: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(token.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(format!("{}|{}|{}", token, timestamp, command).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub struct GateClient {
    client: Client,
    gate_url: String,
}

impl GateClient {
    pub fn new(gate_url: &str) -> Self {
        Self {
            client: Client::new(),
            gate_url: gate_url.trim_end_matches('/').to_string(),
        }
    }

    /// Liveness probe.
    pub async fn ping(&self) -> Result<GateResponse, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .get(format!("{}/zcf/ping", self.gate_url))
            .send()
            .await?;
        Self::read(resp).await
    }

    /// Submit a request exactly as given. Denials are returned, not raised.
    pub async fn exec(&self, req: &ExecRequest) -> Result<GateResponse, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/zcf/exec", self.gate_url))
            .json(req)
            .send()
            .await?;
        Self::read(resp).await
    }

    /// Sign `command` with the current time and submit it.
    pub async fn exec_signed(
        &self,
        token: &str,
        command: &str,
    ) -> Result<GateResponse, Box<dyn std::error::Error>> {
        let timestamp = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64;
        let req = ExecRequest {
            token: token.to_string(),
            timestamp,
            command: command.to_string(),
            hmac: sign_command(token, timestamp, command),
        };
        self.exec(&req).await
    }

    async fn read(resp: reqwest::Response) -> Result<GateResponse, Box<dyn std::error::Error>> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text)?;
        Ok(GateResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_command_is_stable_hex() {
        let a = sign_command("S", 1_700_000_000, "say hi");
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(a, sign_command("S", 1_700_000_000, "say hi"));
        assert_ne!(a, sign_command("S", 1_700_000_001, "say hi"));
    }
}
