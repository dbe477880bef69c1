//! Built-in executors.

use std::process::Command;

use super::{CommandExecutor, ExecutionError};

/// Runs `program [args...] <command>` and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    program: String,
    args: Vec<String>,
}

impl ProcessExecutor {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl CommandExecutor for ProcessExecutor {
    fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(command)
            .output()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            tracing::debug!(
                program = %self.program,
                stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
                "Command executed"
            );
            Ok(())
        } else {
            Err(ExecutionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim_end().to_string(),
            })
        }
    }
}

/// Accepts every command and only logs it.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl CommandExecutor for DryRunExecutor {
    fn execute(&self, command: &str) -> Result<(), ExecutionError> {
        tracing::info!(command = %command, "Dry run, command not executed");
        Ok(())
    }
}
