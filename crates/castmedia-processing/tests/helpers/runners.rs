//! Fake external tools.

use async_trait::async_trait;
use castmedia_processing::{ProcessOutput, ProcessRunner, ToolError};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Answers ffprobe with a fixed stream report and "transcodes" by writing
/// the output path. Counts every invocation.
pub struct FakeFfmpeg {
    pub probe_json: String,
    pub calls: AtomicUsize,
    /// When false, ffmpeg leaves a partial output and exits 1.
    pub transcode_succeeds: bool,
}

impl FakeFfmpeg {
    pub fn reporting(width: u32, height: u32) -> Self {
        Self {
            probe_json: format!(
                r#"{{"streams":[{{"codec_type":"video","codec_name":"h264","width":{},"height":{},"duration":"8.0"}}],"format":{{"duration":"8.0"}}}}"#,
                width, height
            ),
            calls: AtomicUsize::new(0),
            transcode_succeeds: true,
        }
    }

    pub fn failing_transcode(width: u32, height: u32) -> Self {
        Self {
            transcode_succeeds: false,
            ..Self::reporting(width, height)
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProcessRunner for FakeFfmpeg {
    async fn run(
        &self,
        program: &Path,
        args: &[String],
        _timeout: Duration,
    ) -> Result<ProcessOutput, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if program.ends_with("ffprobe") {
            return Ok(ProcessOutput {
                success: true,
                code: Some(0),
                stdout: self.probe_json.clone().into_bytes(),
                stderr: Vec::new(),
            });
        }

        if let Some(out) = args.last() {
            let body: &[u8] = if self.transcode_succeeds {
                b"letterboxed video"
            } else {
                b"truncated"
            };
            std::fs::write(out, body).unwrap();
        }
        Ok(ProcessOutput {
            success: self.transcode_succeeds,
            code: Some(if self.transcode_succeeds { 0 } else { 1 }),
            stdout: Vec::new(),
            stderr: if self.transcode_succeeds {
                Vec::new()
            } else {
                b"Conversion failed!".to_vec()
            },
        })
    }
}

/// Panics if anything is spawned.
pub struct NoSpawn;

#[async_trait]
impl ProcessRunner for NoSpawn {
    async fn run(
        &self,
        program: &Path,
        _args: &[String],
        _timeout: Duration,
    ) -> Result<ProcessOutput, ToolError> {
        panic!("unexpected spawn of {}", program.display());
    }
}
