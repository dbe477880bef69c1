//! Request admission pipeline.
//!
//! # Data Flow
//! ```text
//! POST /zcf/exec
//!     → engine.rs (connection guards: rate, origin, IP)
//!     → security::limits (bounded body read)
//!     → request.rs (lenient JSON parse, required fields)
//!     → engine.rs (secret, timestamp, signature, whitelist, empty command)
//!     → decision.rs (Admit / Deny)
//!     → executor (admitted commands only)
//! ```
//!
//! # Design Decisions
//! - Strict ordering; the first failing guard decides the response
//! - Every denial maps to exactly one status and public message (error.rs)
//! - The pipeline owns the only shared mutable state: the rate limiter

pub mod decision;
pub mod engine;
pub mod error;
pub mod request;

pub use decision::Decision;
pub use engine::{RequestPipeline, Stage};
pub use error::{ErrorKind, GateError};
pub use request::IncomingCommandRequest;
