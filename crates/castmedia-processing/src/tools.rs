//! Discovery of the external probe and transcode executables.
//!
//! Discovery runs once at startup. The resulting [`MediaTools`] value is
//! immutable and is handed to the extractor and normalizer, so a host
//! without ffmpeg is just a `None` rather than an error.

use castmedia_core::MediaPipelineConfig;
use serde::Serialize;
use std::path::{Path, PathBuf};

pub const FFPROBE: &str = "ffprobe";
pub const FFMPEG: &str = "ffmpeg";

const WELL_KNOWN_DIRS: [&str; 2] = ["/usr/bin", "/usr/local/bin"];

/// Resolved locations of the external media tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MediaTools {
    pub ffprobe: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

impl MediaTools {
    /// Probe the host for both tools.
    pub fn discover() -> Self {
        let tools = Self {
            ffprobe: locate_executable(FFPROBE),
            ffmpeg: locate_executable(FFMPEG),
        };
        tools.log_summary();
        tools
    }

    /// Use configured paths when they point at executables, otherwise fall
    /// back to discovery.
    pub fn from_config(config: &MediaPipelineConfig) -> Self {
        let resolve = |configured: Option<&PathBuf>, name: &str| -> Option<PathBuf> {
            match configured {
                Some(path) if is_executable(path) => Some(path.clone()),
                Some(path) => {
                    tracing::warn!(
                        tool = name,
                        path = %path.display(),
                        "Configured tool path is not executable, falling back to discovery"
                    );
                    locate_executable(name)
                }
                None => locate_executable(name),
            }
        };

        let tools = Self {
            ffprobe: resolve(config.ffprobe_path.as_ref(), FFPROBE),
            ffmpeg: resolve(config.ffmpeg_path.as_ref(), FFMPEG),
        };
        tools.log_summary();
        tools
    }

    /// No tools at all; video metadata degrades and video normalization fails.
    pub fn unavailable() -> Self {
        Self::default()
    }

    pub fn with_paths(ffprobe: Option<PathBuf>, ffmpeg: Option<PathBuf>) -> Self {
        Self { ffprobe, ffmpeg }
    }

    fn log_summary(&self) {
        tracing::info!(
            ffprobe = ?self.ffprobe,
            ffmpeg = ?self.ffmpeg,
            "Media tool discovery completed"
        );
    }
}

/// Look for `name` in the well-known install directories, then on `PATH`.
pub fn locate_executable(name: &str) -> Option<PathBuf> {
    locate_in(name, WELL_KNOWN_DIRS.iter().map(Path::new))
        .or_else(|| which::which(name).ok().filter(|p| is_executable(p)))
}

fn locate_in<'a, I>(name: &str, dirs: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = &'a Path>,
{
    dirs.into_iter()
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
