//! ffmpeg letterbox transcode.

use castmedia_core::TargetGeometry;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::process::{ProcessRunner, ToolError};
use crate::tools::FFMPEG;

/// Scales a video to fit the target frame and pads it with black bars.
/// Audio is copied untouched.
#[derive(Clone)]
pub struct VideoTranscoder {
    ffmpeg: Option<PathBuf>,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
    geometry: TargetGeometry,
}

impl VideoTranscoder {
    pub fn new(
        ffmpeg: Option<PathBuf>,
        runner: Arc<dyn ProcessRunner>,
        timeout: Duration,
        geometry: TargetGeometry,
    ) -> Self {
        Self {
            ffmpeg,
            runner,
            timeout,
            geometry,
        }
    }

    pub fn is_available(&self) -> bool {
        self.ffmpeg.is_some()
    }

    /// `scale=W:H:force_original_aspect_ratio=decrease,pad=W:H:(ow-iw)/2:(oh-ih)/2:black`
    pub fn letterbox_filter(geometry: &TargetGeometry) -> String {
        format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black",
            w = geometry.width,
            h = geometry.height
        )
    }

    pub fn letterbox_args(input: &Path, output: &Path, geometry: &TargetGeometry) -> Vec<String> {
        vec![
            "-y".to_string(),
            "-v".to_string(),
            "error".to_string(),
            "-i".to_string(),
            input.to_string_lossy().to_string(),
            "-vf".to_string(),
            Self::letterbox_filter(geometry),
            "-c:a".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ]
    }

    /// Transcode `input` into a letterboxed `output`.
    ///
    /// Succeeds only when ffmpeg exits zero and `output` is a non-empty
    /// file. Does not clean up `output` on failure; callers own the
    /// destination.
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        ffmpeg.operation = "letterbox"
    ))]
    pub async fn letterbox(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let ffmpeg = self.ffmpeg.as_deref().ok_or(ToolError::Unavailable(FFMPEG))?;
        let start = Instant::now();

        let args = Self::letterbox_args(input, output, &self.geometry);
        self.runner
            .run(ffmpeg, &args, self.timeout)
            .await?
            .into_success(ffmpeg)?;

        let written = tokio::fs::metadata(output)
            .await
            .map(|m| m.is_file() && m.len() > 0)
            .unwrap_or(false);
        if !written {
            return Err(ToolError::InvalidOutput {
                program: ffmpeg.to_path_buf(),
                reason: format!("no output written to {}", output.display()),
            });
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis() as u64,
            width = self.geometry.width,
            height = self.geometry.height,
            "Video letterbox completed"
        );
        Ok(())
    }
}
