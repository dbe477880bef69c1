//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (in pipeline order):
//!     → rate_limit.rs (fixed window per client IP)
//!     → access_control.rs (origin prefix, IP allowlist)
//!     → limits.rs (bounded body read)
//!     → replay.rs (timestamp window)
//!     → signature.rs (HMAC-SHA256, constant-time compare)
//!     → whitelist.rs (leading command verb)
//!     → Pass to executor
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - Empty allowlists are permissive; that is the documented default policy
//! - Only the rate limiter holds state

pub mod access_control;
pub mod limits;
pub mod rate_limit;
pub mod replay;
pub mod signature;
pub mod whitelist;

pub use access_control::{strip_port, IpGate, OriginGate};
pub use limits::{read_bounded, BodyError, MAX_BODY_BYTES};
pub use rate_limit::{RateCounter, RateLimitSweeper, RateLimiter};
pub use replay::ReplayGuard;
pub use whitelist::{normalize_command, CommandWhitelist};
