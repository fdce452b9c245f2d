//! Normalization dispatch: letterbox images in-process, videos via ffmpeg.
//!
//! `normalize` never returns an error. Every failure, including a missing
//! transcoder, a subprocess timeout or an encode fault, is folded into
//! [`NormalizationOutcome`]. Output is staged beside the destination and
//! renamed into place, so a failed or dropped attempt leaves whatever was at
//! the destination before it untouched.

use castmedia_core::{MediaKind, MediaPipelineConfig, TargetGeometry};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::classifier::media_kind_of_path;
use crate::image::ImageNormalizer;
use crate::process::{ProcessRunner, ToolError};
use crate::tools::{MediaTools, FFMPEG};
use crate::video::VideoTranscoder;

/// Either a conforming derivative exists at `output_path`, or nothing does.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizationOutcome {
    pub success: bool,
    pub output_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl NormalizationOutcome {
    pub fn succeeded(output_path: impl Into<PathBuf>) -> Self {
        Self {
            success: true,
            output_path: Some(output_path.into()),
            failure_reason: None,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            failure_reason: Some(reason.into()),
        }
    }
}

#[derive(Clone)]
pub struct Normalizer {
    image: ImageNormalizer,
    video: VideoTranscoder,
}

impl Normalizer {
    pub fn new(image: ImageNormalizer, video: VideoTranscoder) -> Self {
        Self { image, video }
    }

    /// Wire a normalizer for the portrait target from discovered tools.
    pub fn from_tools(
        tools: &MediaTools,
        runner: Arc<dyn ProcessRunner>,
        config: &MediaPipelineConfig,
    ) -> Self {
        let geometry = TargetGeometry::PORTRAIT;
        Self {
            image: ImageNormalizer::new(geometry),
            video: VideoTranscoder::new(
                tools.ffmpeg.clone(),
                runner,
                config.transcode_timeout(),
                geometry,
            ),
        }
    }

    /// Normalize a stored file, classifying it by content first.
    pub async fn normalize_path(&self, source: &Path, dest: &Path) -> NormalizationOutcome {
        let path = source.to_path_buf();
        let sniffed = tokio::task::spawn_blocking(move || media_kind_of_path(&path))
            .await
            .map_err(std::io::Error::other)
            .and_then(std::convert::identity);
        match sniffed {
            Ok(kind) => self.normalize(source, dest, kind).await,
            Err(e) => NormalizationOutcome::failed(format!("Could not read source: {}", e)),
        }
    }

    /// Produce a letterboxed derivative of `source` at `dest`.
    ///
    /// The source is never modified. A file already at `dest` (such as a
    /// reserved placeholder) is only replaced on success. If `dest` did not
    /// exist beforehand and this future is dropped after the rename, the
    /// new file is removed again.
    #[tracing::instrument(skip(self), fields(media.kind = %kind))]
    pub async fn normalize(&self, source: &Path, dest: &Path, kind: MediaKind) -> NormalizationOutcome {
        if same_file(source, dest).await {
            tracing::warn!("Refusing to normalize a file onto itself");
            return NormalizationOutcome::failed("Destination must differ from source");
        }

        let start = Instant::now();
        let existed = tokio::fs::try_exists(dest).await.unwrap_or(true);
        let mut guard = PartialOutput::new(dest, !existed);

        let result: Result<(), String> = match kind {
            MediaKind::Image => self
                .image
                .normalize(source, dest)
                .await
                .map(|_| ())
                .map_err(|e| e.to_string()),
            MediaKind::Video => self.letterbox_video(source, dest).await,
            MediaKind::Unsupported => Err("Unsupported media type".to_string()),
        };

        let outcome = match result {
            Ok(()) if is_file(dest).await => {
                guard.disarm();
                NormalizationOutcome::succeeded(dest)
            }
            Ok(()) => NormalizationOutcome::failed("Normalized output was not written"),
            Err(reason) => NormalizationOutcome::failed(reason),
        };

        if outcome.success {
            tracing::info!(
                output = %dest.display(),
                duration_ms = start.elapsed().as_millis() as u64,
                "Normalization succeeded"
            );
        } else {
            tracing::warn!(
                reason = ?outcome.failure_reason,
                duration_ms = start.elapsed().as_millis() as u64,
                "Normalization failed"
            );
        }
        outcome
    }

    /// ffmpeg writes into a hidden sibling that keeps `dest`'s extension, so
    /// the container is still chosen by name. The sibling is deleted on drop.
    async fn letterbox_video(&self, source: &Path, dest: &Path) -> Result<(), String> {
        if !self.video.is_available() {
            return Err(ToolError::Unavailable(FFMPEG).to_string());
        }
        let staged = staging_path_for(dest).map_err(|e| e.to_string())?;
        self.video
            .letterbox(source, &staged)
            .await
            .map_err(|e| e.to_string())?;
        staged.persist(dest).map_err(|e| e.error.to_string())
    }
}

fn staging_path_for(dest: &Path) -> std::io::Result<tempfile::TempPath> {
    let dir = match dest.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let suffix = dest
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    Ok(tempfile::Builder::new()
        .prefix(".castmedia-")
        .suffix(&suffix)
        .tempfile_in(dir)?
        .into_temp_path())
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Removes the destination on drop while armed.
struct PartialOutput<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> PartialOutput<'a> {
    fn new(path: &'a Path, armed: bool) -> Self {
        Self { path, armed }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PartialOutput<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Removed partial output"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove partial output"
            ),
        }
    }
}
