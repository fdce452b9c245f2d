//! ffprobe invocation and output parsing.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::process::{ProcessRunner, ToolError};

/// Stream-level facts reported by ffprobe for the first video stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProbeReport {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
    pub codec: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

pub fn probe_args(input: &Path) -> Vec<String> {
    vec![
        "-v".to_string(),
        "quiet".to_string(),
        "-print_format".to_string(),
        "json".to_string(),
        "-show_format".to_string(),
        "-show_streams".to_string(),
        input.to_string_lossy().to_string(),
    ]
}

/// Parse ffprobe's JSON. A file without a video stream yields an empty report.
pub fn parse_probe_output(stdout: &[u8]) -> Result<ProbeReport, serde_json::Error> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let Some(stream) = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
    else {
        return Ok(ProbeReport::default());
    };

    // Matroska/WebM streams usually carry no duration; the container does.
    let duration_seconds = stream
        .duration
        .as_deref()
        .and_then(parse_seconds)
        .or_else(|| {
            probe
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(parse_seconds)
        });

    Ok(ProbeReport {
        width: stream.width.filter(|w| *w > 0),
        height: stream.height.filter(|h| *h > 0),
        duration_seconds,
        codec: stream.codec_name.clone(),
    })
}

fn parse_seconds(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d >= 0.0)
}

/// Run ffprobe on `input` and parse the first video stream.
#[tracing::instrument(skip(runner), fields(
    process.executable.name = "ffprobe",
    process.executable.path = %ffprobe.display(),
))]
pub async fn probe_video(
    runner: &dyn ProcessRunner,
    ffprobe: &Path,
    input: &Path,
    timeout: Duration,
) -> Result<ProbeReport, ToolError> {
    let start = Instant::now();

    let output = runner
        .run(ffprobe, &probe_args(input), timeout)
        .await?
        .into_success(ffprobe)?;

    let report = parse_probe_output(&output.stdout).map_err(|e| ToolError::InvalidOutput {
        program: ffprobe.to_path_buf(),
        reason: e.to_string(),
    })?;

    tracing::info!(
        duration_ms = start.elapsed().as_millis() as u64,
        width = ?report.width,
        height = ?report.height,
        video_duration = ?report.duration_seconds,
        codec = ?report.codec,
        "Video probe completed"
    );

    Ok(report)
}
