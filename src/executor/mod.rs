//! Command execution subsystem.
//!
//! # Data Flow
//! ```text
//! Admitted request
//!     → pipeline (normalized command string)
//!     → CommandExecutor::execute on the blocking pool, under a deadline
//!     → Ok → 200 / Err, panic or timeout → 500 "Execution error"
//! ```
//!
//! # Design Decisions
//! - Executors are synchronous; the pipeline moves them off the async runtime
//! - No shell is involved: the command is passed as a single argument
//! - Error detail is logged, never returned to the caller

pub mod process;

use std::sync::Arc;
use thiserror::Error;

use crate::config::ExecutorConfig;

pub use process::{DryRunExecutor, ProcessExecutor};

/// Errors raised by an executor.
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The program could not be started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The program ran and reported failure.
    #[error("exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    /// The executor did not finish within its deadline.
    #[error("timed out after {0} seconds")]
    Timeout(u64),

    /// The executor panicked.
    #[error("executor task aborted: {0}")]
    Aborted(String),

    /// Executor-specific failure.
    #[error("{0}")]
    Other(String),
}

/// Runs an admitted, normalized command.
pub trait CommandExecutor: Send + Sync {
    fn execute(&self, command: &str) -> Result<(), ExecutionError>;
}

/// Build the executor described by the configuration.
pub fn from_config(config: &ExecutorConfig) -> Arc<dyn CommandExecutor> {
    match &config.program {
        Some(program) => {
            tracing::info!(program = %program, args = ?config.args, "Using process executor");
            Arc::new(ProcessExecutor::new(program.clone(), config.args.clone()))
        }
        None => {
            tracing::warn!("No executor program configured, admitted commands will only be logged");
            Arc::new(DryRunExecutor)
        }
    }
}
