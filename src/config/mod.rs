//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, or legacy flat JSON policy)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (normalize & semantic checks)
//!     → GateConfig (validated, immutable)
//!     → policy shared via Arc with the request pipeline
//!
//! Missing or rejected file:
//!     → loader.rs logs the problem
//!     → GateConfig::default() (permissive policy, skew 120s, 60 req/min)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, report_fallback, ConfigError};
pub use schema::{ExecutorConfig, GateConfig, ListenerConfig, ObservabilityConfig, PolicyConfig};
