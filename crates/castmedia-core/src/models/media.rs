use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Semantic kind of an upload, always derived from its sniffed MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Unsupported,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uploaded file as handed over by the ingestion boundary.
#[derive(Debug, Clone)]
pub struct FileDescriptor {
    /// Temporary location of the received bytes
    pub path: PathBuf,
    /// Client-supplied filename, untrusted
    pub original_filename: String,
    /// Client-supplied size in bytes, untrusted
    pub declared_size: u64,
}

impl FileDescriptor {
    pub fn new(
        path: impl Into<PathBuf>,
        original_filename: impl Into<String>,
        declared_size: u64,
    ) -> Self {
        Self {
            path: path.into(),
            original_filename: original_filename.into(),
            declared_size,
        }
    }
}

/// Metadata extracted from an upload. Absent dimensions mean "unknown".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub mime_type: String,
    pub byte_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<f64>,
}

impl MediaMetadata {
    /// Metadata for which nothing beyond type and size is known.
    pub fn without_dimensions(mime_type: impl Into<String>, byte_size: u64) -> Self {
        Self {
            mime_type: mime_type.into(),
            byte_size,
            width: None,
            height: None,
            duration_seconds: None,
        }
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        match (self.width, self.height) {
            (Some(w), Some(h)) => Some((w, h)),
            _ => None,
        }
    }

    /// Width over height rounded to three decimals, when both are known and non-zero.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let (w, h) = self.dimensions()?;
        if w == 0 || h == 0 {
            return None;
        }
        Some((w as f64 / h as f64 * 1000.0).round() / 1000.0)
    }
}
