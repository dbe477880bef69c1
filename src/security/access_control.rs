//! Origin and client-address allowlists.

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};

use crate::config::PolicyConfig;

/// Strip a port suffix from a client address.
///
/// Handles `ip:port`, `[v6]:port`, bare IPv4 and bare IPv6. Anything else is
/// cut at the first `:`.
pub fn strip_port(address: &str) -> String {
    let address = address.trim();
    if let Ok(sock) = address.parse::<SocketAddr>() {
        return sock.ip().to_string();
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        return ip.to_string();
    }
    if let Some(inner) = address.strip_prefix('[').and_then(|a| a.split(']').next()) {
        return inner.to_string();
    }
    address.split(':').next().unwrap_or_default().to_string()
}

/// Case-insensitive prefix match on the Origin (or Referer) header.
#[derive(Debug, Clone)]
pub struct OriginGate {
    prefixes: Vec<String>,
}

impl OriginGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: allowed
                .into_iter()
                .map(|o| o.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(&policy.allowed_origins)
    }

    /// Empty allowlist admits everything; otherwise a missing header is denied.
    pub fn allowed(&self, origin_or_referer: Option<&str>) -> bool {
        if self.prefixes.is_empty() {
            return true;
        }
        let header = origin_or_referer.unwrap_or_default().to_lowercase();
        self.prefixes.iter().any(|p| header.starts_with(p.as_str()))
    }
}

/// Exact-match allowlist of client IPs.
#[derive(Debug, Clone)]
pub struct IpGate {
    allowlist: HashSet<String>,
}

impl IpGate {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowlist: allowed.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_policy(policy: &PolicyConfig) -> Self {
        Self::new(policy.ip_allowlist.iter().cloned())
    }

    pub fn allowed(&self, client_address: &str) -> bool {
        if self.allowlist.is_empty() {
            return true;
        }
        self.allowlist.contains(&strip_port(client_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_port() {
        assert_eq!(strip_port("127.0.0.1:30120"), "127.0.0.1");
        assert_eq!(strip_port("127.0.0.1"), "127.0.0.1");
        assert_eq!(strip_port("[::1]:8080"), "::1");
        assert_eq!(strip_port("::1"), "::1");
        assert_eq!(strip_port("[fe80::1]"), "fe80::1");
        assert_eq!(strip_port("localhost:80"), "localhost");
        assert_eq!(strip_port(""), "");
    }

    #[test]
    fn test_origin_empty_allowlist_is_permissive() {
        let gate = OriginGate::new(Vec::<String>::new());
        assert!(gate.allowed(None));
        assert!(gate.allowed(Some("https://evil.example")));
    }

    #[test]
    fn test_origin_prefix_case_insensitive() {
        let gate = OriginGate::new(["https://Panel.Example"]);
        assert!(gate.allowed(Some("https://panel.example")));
        assert!(gate.allowed(Some("HTTPS://PANEL.EXAMPLE/dashboard")));
        assert!(!gate.allowed(Some("https://other.example")));
        assert!(!gate.allowed(Some("")));
        assert!(!gate.allowed(None));
    }

    #[test]
    fn test_ip_gate() {
        let open = IpGate::new(Vec::<String>::new());
        assert!(open.allowed("203.0.113.9:5555"));

        let gate = IpGate::new(["10.0.0.1", "::1"]);
        assert!(gate.allowed("10.0.0.1:41000"));
        assert!(gate.allowed("10.0.0.1"));
        assert!(gate.allowed("[::1]:9000"));
        assert!(!gate.allowed("10.0.0.10:41000"));
        assert!(!gate.allowed(""));
    }
}
