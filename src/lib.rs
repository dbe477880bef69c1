//! Command Gate Library

pub mod clock;
pub mod config;
pub mod executor;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod security;

pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use pipeline::{Decision, GateError, RequestPipeline};
