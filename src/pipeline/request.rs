//! Parsing of `/zcf/exec` bodies.
//!
//! Clients send `{token, timestamp, command, hmac}`. Field types are coerced
//! leniently so loosely typed callers keep working: scalars become strings,
//! timestamps may be numbers or numeric strings, and anything unusable reads
//! as empty (or `0` for the timestamp).

use serde_json::{Map, Value};

use super::error::GateError;

/// One inbound command request, after body parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommandRequest {
    pub client_address: String,
    pub origin_header: Option<String>,
    pub token: String,
    pub timestamp_secs: i64,
    pub command_text: String,
    pub supplied_hmac: String,
}

impl IncomingCommandRequest {
    /// Parse a raw body. An empty body reads as `{}`.
    ///
    /// Fails with `InvalidJson` when the body is not JSON and with
    /// `MissingFields` when `token` or `command` ends up empty.
    pub fn parse(
        client_address: &str,
        origin_header: Option<&str>,
        body: &[u8],
    ) -> Result<Self, GateError> {
        let payload: Value = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            serde_json::from_slice(body).map_err(|_| GateError::InvalidJson)?
        };

        let field = |name: &str| payload.as_object().and_then(|o| o.get(name));

        let request = Self {
            client_address: client_address.to_string(),
            origin_header: origin_header.map(str::to_string),
            token: coerce_string(field("token")),
            timestamp_secs: coerce_timestamp(field("timestamp")),
            command_text: coerce_string(field("command")),
            supplied_hmac: coerce_string(field("hmac")),
        };

        if request.token.is_empty() || request.command_text.is_empty() {
            return Err(GateError::MissingFields);
        }

        Ok(request)
    }
}

/// Strings pass through; non-zero numbers and `true` are stringified.
fn coerce_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        Some(Value::Bool(true)) => "true".to_string(),
        _ => String::new(),
    }
}

/// Integers as-is, floats truncated, strings by their leading integer.
fn coerce_timestamp(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => leading_integer(s),
        _ => 0,
    }
}

fn leading_integer(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
