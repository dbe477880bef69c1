//! HMAC-SHA256 request signatures.
//!
//! The signed message is `token|timestamp|command`, keyed by the token
//! itself. Fields are joined with a literal `|` and nothing is escaped, so a
//! `|` inside a field shifts the boundaries without changing the message
//! bytes. Existing clients depend on this exact layout.
//!
//! # Security Properties
//!
//! - Digest comparison is constant-time, including on length mismatch
//! - Supplied digests are hex-decoded, so upper and lower case both verify
//! - Nothing about the expected digest is ever logged

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Build the exact byte string that gets signed.
pub fn canonical_message(token: &str, timestamp_secs: i64, command_text: &str) -> String {
    format!("{}|{}|{}", token, timestamp_secs, command_text)
}

fn compute_digest(token: &str, timestamp_secs: i64, command_text: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(token.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(canonical_message(token, timestamp_secs, command_text).as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Lower-case hex HMAC for a request, as a client would send it.
pub fn sign(token: &str, timestamp_secs: i64, command_text: &str) -> String {
    hex::encode(compute_digest(token, timestamp_secs, command_text))
}

/// Check a supplied hex digest against the expected signature.
///
/// Fails closed on an empty token, an empty digest or invalid hex.
pub fn verify(token: &str, timestamp_secs: i64, command_text: &str, supplied_hmac_hex: &str) -> bool {
    if token.is_empty() || supplied_hmac_hex.is_empty() {
        return false;
    }

    let Ok(supplied) = hex::decode(supplied_hmac_hex) else {
        return false;
    };

    let expected = compute_digest(token, timestamp_secs, command_text);
    constant_time_eq(&expected, &supplied)
}

/// Constant-time equality that does not short-circuit on length.
///
/// Both inputs are zero-padded to a common length and compared in full; the
/// length check is folded in with a constant-time AND.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut a_padded = vec![0u8; len];
    let mut b_padded = vec![0u8; len];
    a_padded[..a.len()].copy_from_slice(a);
    b_padded[..b.len()].copy_from_slice(b);

    let lengths_equal = a.len().ct_eq(&b.len());
    let contents_equal = a_padded.ct_eq(&b_padded);

    (lengths_equal & contents_equal).into()
}
