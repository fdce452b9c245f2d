//! Shared plumbing for the castmedia binary: tracing setup, JSON output and
//! exit codes.

use anyhow::Context;
use castmedia_core::{AppError, LogLevel, MediaKind, MediaMetadata};
use castmedia_processing::{ValidationResult, Verdict};
use serde::Serialize;

/// Exit code for uploads the pipeline refuses.
pub const EXIT_REJECTED: i32 = 2;
pub const EXIT_FAILURE: i32 = 1;

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays
/// machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("castmedia=info")),
        )
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// JSON view of a validation run.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub is_valid: bool,
    pub verdict: Verdict,
    pub kind: MediaKind,
    pub errors: Vec<String>,
    pub metadata: Option<MediaMetadata>,
}

impl From<&ValidationResult> for ValidationReport {
    fn from(result: &ValidationResult) -> Self {
        Self {
            is_valid: result.is_valid,
            verdict: result.verdict(),
            kind: result.kind(),
            errors: result.error_messages(),
            metadata: result.metadata.clone(),
        }
    }
}

pub fn exit_code_for_verdict(verdict: Verdict) -> i32 {
    match verdict {
        Verdict::Reject => EXIT_REJECTED,
        Verdict::AcceptAsIs | Verdict::AcceptAndNormalize => 0,
    }
}

/// Log an application error at its level and pick the exit code.
pub fn report_error(err: &AppError) -> i32 {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, "Request rejected"),
        LogLevel::Warn => tracing::warn!(error = %err, "Request failed"),
        LogLevel::Error => tracing::error!(error = ?err, "Request failed"),
    }
    if err.is_client_error() {
        EXIT_REJECTED
    } else {
        EXIT_FAILURE
    }
}
