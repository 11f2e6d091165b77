//! Shell execution for advised commands

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Error, Result};

/// Captured result of one shell command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecutionOutput {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// `Err(Error::Execution)` carrying stderr when the command failed
    pub fn into_result(self) -> Result<ExecutionOutput> {
        if self.success {
            Ok(self)
        } else {
            Err(Error::Execution {
                code: self.exit_code,
                stderr: self.stderr_lossy(),
            })
        }
    }
}

/// Runs a shell command line
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run `command` to completion. A non-zero exit is reported through
    /// [`ExecutionOutput::success`], not as an error.
    async fn execute(&self, command: &str) -> Result<ExecutionOutput>;
}

/// Runs commands with `sh -c` in a working directory
pub struct SystemShell {
    working_dir: PathBuf,
    timeout: Duration,
}

impl SystemShell {
    /// Default time a command may run (2 minutes)
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ShellExecutor for SystemShell {
    async fn execute(&self, command: &str) -> Result<ExecutionOutput> {
        debug!(command, dir = %self.working_dir.display(), "Running shell command");

        let output = tokio::time::timeout(
            self.timeout,
            Command::new("sh")
                .arg("-c")
                .arg(command)
                .current_dir(&self.working_dir)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| Error::Timeout(self.timeout.as_secs()))??;

        Ok(ExecutionOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failed_output_becomes_execution_error() {
        let output = ExecutionOutput {
            success: false,
            exit_code: Some(2),
            stdout: Vec::new(),
            stderr: b"ls: cannot access 'nope'".to_vec(),
        };
        match output.into_result() {
            Err(Error::Execution { code, stderr }) => {
                assert_eq!(code, Some(2));
                assert!(stderr.contains("cannot access"));
            }
            other => panic!("expected execution error, got {:?}", other),
        }
    }
}
