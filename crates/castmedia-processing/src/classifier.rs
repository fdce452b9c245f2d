//! Media classification from content signatures.
//!
//! The MIME type is always sniffed from the file's magic bytes. Declared
//! filenames and client-supplied content types are never trusted here.

use castmedia_core::MediaKind;
use std::io;
use std::path::Path;

pub const IMAGE_MIME_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/webp"];
pub const VIDEO_MIME_TYPES: [&str; 3] = ["video/mp4", "video/webm", "video/quicktime"];

/// Reported when the signature matches nothing known.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Map a MIME type to the kind of media it represents.
pub fn classify(mime_type: &str) -> MediaKind {
    let normalized = normalize_mime(mime_type);

    if IMAGE_MIME_TYPES.contains(&normalized.as_str()) {
        MediaKind::Image
    } else if VIDEO_MIME_TYPES.contains(&normalized.as_str()) {
        MediaKind::Video
    } else {
        MediaKind::Unsupported
    }
}

/// Sniff the MIME type of a file from its leading bytes.
pub fn detect_mime(path: &Path) -> io::Result<String> {
    let detected = infer::get_from_path(path)?;
    Ok(detected
        .map(|kind| kind.mime_type().to_string())
        .unwrap_or_else(|| UNKNOWN_MIME_TYPE.to_string()))
}

/// Classify a stored file by sniffing its content.
pub fn media_kind_of_path(path: &Path) -> io::Result<MediaKind> {
    Ok(classify(&detect_mime(path)?))
}

/// Lowercase and drop parameters (`image/jpeg; q=1` -> `image/jpeg`).
fn normalize_mime(mime_type: &str) -> String {
    mime_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_lowercase()
}
