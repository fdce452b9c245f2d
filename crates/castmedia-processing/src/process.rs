//! Bounded execution of external tools (ffprobe, ffmpeg).
//!
//! Every invocation carries a timeout. When it expires, or when the caller
//! drops the future (request aborted), the child process is killed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Errors raised while running an external tool.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),

    #[error("Failed to spawn {}: {}", .program.display(), .source)]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} timed out after {} seconds", .program.display(), .timeout.as_secs())]
    Timeout { program: PathBuf, timeout: Duration },

    #[error("{} exited with status {:?}: {}", .program.display(), .code, .stderr)]
    Failed {
        program: PathBuf,
        code: Option<i32>,
        stderr: String,
    },

    #[error("Could not parse {} output: {}", .program.display(), .reason)]
    InvalidOutput { program: PathBuf, reason: String },
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default)]
pub struct ProcessOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }

    /// Turn a non-zero exit into [`ToolError::Failed`].
    pub fn into_success(self, program: &Path) -> Result<ProcessOutput, ToolError> {
        if self.success {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                program: program.to_path_buf(),
                code: self.code,
                stderr: self.stderr_lossy(),
            })
        }
    }
}

/// Runs an external program to completion within a time bound.
///
/// Implementations must not leave the child running once `run` returns or
/// its future is dropped.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, ToolError>;
}

/// Production runner on top of `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        timeout: Duration,
    ) -> Result<ProcessOutput, ToolError> {
        let start = Instant::now();
        tracing::debug!(program = %program.display(), args = ?args, "Spawning external tool");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        // On expiry the `output` future is dropped, which kills the child.
        let output = match tokio::time::timeout(timeout, child).await {
            Ok(result) => result.map_err(|source| ToolError::Spawn {
                program: program.to_path_buf(),
                source,
            })?,
            Err(_) => {
                tracing::warn!(
                    program = %program.display(),
                    timeout_secs = timeout.as_secs(),
                    "External tool timed out, process killed"
                );
                return Err(ToolError::Timeout {
                    program: program.to_path_buf(),
                    timeout,
                });
            }
        };

        tracing::debug!(
            program = %program.display(),
            duration_ms = start.elapsed().as_millis() as u64,
            code = ?output.status.code(),
            "External tool finished"
        );

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
