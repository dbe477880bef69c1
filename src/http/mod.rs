//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, routing, middleware)
//!     → request.rs (request ID, origin and length headers)
//!     → [pipeline decides admit/deny and executes]
//!     → response.rs (JSON status bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, EXEC_PATH, PING_PATH};
