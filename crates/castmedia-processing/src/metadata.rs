//! Metadata extraction for uploaded media.
//!
//! Images are decoded in-process on the blocking pool. Videos are probed
//! with ffprobe when it is available; a missing or failing probe degrades
//! to metadata without dimensions instead of an error.

use castmedia_core::{MediaKind, MediaMetadata};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{classify, detect_mime};
use crate::image::ImageProcessor;
use crate::process::ProcessRunner;
use crate::tools::MediaTools;
use crate::video::probe_video;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not read upload: {0}")]
    Io(#[from] std::io::Error),

    /// The bytes do not decode as the sniffed image type. `partial` carries
    /// what is still known (type and size).
    #[error("Invalid or corrupted image file: {reason}")]
    CorruptImage {
        partial: MediaMetadata,
        reason: String,
    },
}

#[derive(Clone)]
pub struct MetadataExtractor {
    ffprobe: Option<PathBuf>,
    runner: Arc<dyn ProcessRunner>,
    probe_timeout: Duration,
}

impl MetadataExtractor {
    pub fn new(tools: &MediaTools, runner: Arc<dyn ProcessRunner>, probe_timeout: Duration) -> Self {
        Self {
            ffprobe: tools.ffprobe.clone(),
            runner,
            probe_timeout,
        }
    }

    /// Extract type, size and (where determinable) dimensions of `path`.
    ///
    /// The MIME type is sniffed from content and the size is the on-disk
    /// size, not the declared one.
    pub async fn extract(&self, path: &Path) -> Result<MediaMetadata, ExtractError> {
        let byte_size = tokio::fs::metadata(path).await?.len();
        let sniff_path = path.to_path_buf();
        let mime_type = tokio::task::spawn_blocking(move || detect_mime(&sniff_path))
            .await
            .map_err(std::io::Error::other)??;

        match classify(&mime_type) {
            MediaKind::Image => self.extract_image(path, mime_type, byte_size).await,
            MediaKind::Video => Ok(self.extract_video(path, mime_type, byte_size).await),
            MediaKind::Unsupported => Ok(MediaMetadata::without_dimensions(mime_type, byte_size)),
        }
    }

    async fn extract_image(
        &self,
        path: &Path,
        mime_type: String,
        byte_size: u64,
    ) -> Result<MediaMetadata, ExtractError> {
        let owned_path = path.to_path_buf();
        let decode_mime = mime_type.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            ImageProcessor::dimensions(&owned_path, &decode_mime)
        })
        .await
        .map_err(std::io::Error::other)?;

        match decoded {
            Ok((width, height)) => Ok(MediaMetadata {
                width: Some(width),
                height: Some(height),
                ..MediaMetadata::without_dimensions(mime_type, byte_size)
            }),
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    mime_type = %mime_type,
                    error = %e,
                    "Image failed to decode"
                );
                Err(ExtractError::CorruptImage {
                    partial: MediaMetadata::without_dimensions(mime_type, byte_size),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn extract_video(&self, path: &Path, mime_type: String, byte_size: u64) -> MediaMetadata {
        let mut metadata = MediaMetadata::without_dimensions(mime_type, byte_size);

        let Some(ffprobe) = self.ffprobe.as_deref() else {
            tracing::warn!(
                path = %path.display(),
                "ffprobe unavailable, video dimensions unknown"
            );
            return metadata;
        };

        match probe_video(self.runner.as_ref(), ffprobe, path, self.probe_timeout).await {
            Ok(report) => {
                metadata.width = report.width;
                metadata.height = report.height;
                metadata.duration_seconds = report.duration_seconds;
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Video probe failed, dimensions unknown"
                );
            }
        }
        metadata
    }
}
