//! Upload validation policy.
//!
//! Checks run in order: transfer, absolute size, type, per-kind size and
//! decodability, then aspect ratio. A failed transfer or an oversized
//! declaration ends validation immediately; everything after the type check
//! accumulates so the submitter sees every applicable problem at once.

use castmedia_core::constants::BYTES_PER_MB;
use castmedia_core::{FileDescriptor, MediaKind, MediaMetadata, MediaPipelineConfig, TargetGeometry};
use serde::Serialize;
use std::fmt;

use crate::aspect::conforms_to;
use crate::classifier::classify;
use crate::metadata::{ExtractError, MetadataExtractor};

/// Size ceilings in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeLimits {
    pub max_file_bytes: u64,
    pub max_image_bytes: u64,
    pub max_video_bytes: u64,
}

impl SizeLimits {
    pub fn from_config(config: &MediaPipelineConfig) -> Self {
        Self {
            max_file_bytes: config.max_file_size_bytes,
            max_image_bytes: config.max_image_size_bytes,
            max_video_bytes: config.max_video_size_bytes,
        }
    }
}

impl Default for SizeLimits {
    fn default() -> Self {
        Self::from_config(&MediaPipelineConfig::default())
    }
}

/// A single reason an upload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationIssue {
    #[error("No file uploaded or upload failed")]
    TransferFailed,

    #[error("File size exceeds maximum allowed size")]
    FileTooLarge { limit_bytes: u64 },

    #[error("File type not allowed. Supported: JPEG, PNG, WebP, MP4, WebM, MOV")]
    TypeNotAllowed { mime_type: String },

    #[error("Image size exceeds maximum allowed size ({}MB)", .limit_bytes / BYTES_PER_MB)]
    ImageTooLarge { limit_bytes: u64 },

    #[error("Invalid or corrupted image file")]
    CorruptImage,

    #[error("Video size exceeds maximum allowed size ({}MB)", .limit_bytes / BYTES_PER_MB)]
    VideoTooLarge { limit_bytes: u64 },

    #[error("Could not determine video dimensions")]
    UnknownVideoDimensions,

    #[error("Media must have {expected} aspect ratio (portrait orientation)")]
    AspectRatioMismatch {
        expected: String,
        width: u32,
        height: u32,
    },
}

impl ValidationIssue {
    /// Soft issues can be fixed by normalization; everything else blocks the
    /// upload.
    pub fn is_soft(&self) -> bool {
        matches!(self, ValidationIssue::AspectRatioMismatch { .. })
    }
}

/// What the ingestion boundary should do with a validated upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Reject,
    AcceptAsIs,
    AcceptAndNormalize,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Reject => "reject",
            Verdict::AcceptAsIs => "accept_as_is",
            Verdict::AcceptAndNormalize => "accept_and_normalize",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// True exactly when `errors` is empty, soft issues included.
    pub is_valid: bool,
    pub errors: Vec<ValidationIssue>,
    pub metadata: Option<MediaMetadata>,
}

impl ValidationResult {
    fn from_issues(errors: Vec<ValidationIssue>, metadata: Option<MediaMetadata>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            metadata,
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.errors.is_empty() {
            Verdict::AcceptAsIs
        } else if self.errors.iter().all(ValidationIssue::is_soft) {
            Verdict::AcceptAndNormalize
        } else {
            Verdict::Reject
        }
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }

    pub fn kind(&self) -> MediaKind {
        self.metadata
            .as_ref()
            .map(|m| classify(&m.mime_type))
            .unwrap_or(MediaKind::Unsupported)
    }
}

/// Validates uploads against size, type, decodability and aspect policy.
#[derive(Clone)]
pub struct MediaValidator {
    extractor: MetadataExtractor,
    limits: SizeLimits,
    geometry: TargetGeometry,
}

impl MediaValidator {
    pub fn new(extractor: MetadataExtractor, limits: SizeLimits, geometry: TargetGeometry) -> Self {
        Self {
            extractor,
            limits,
            geometry,
        }
    }

    /// Validate an upload. `received` is the ingestion boundary's word that
    /// the transfer completed. Never fails; every fault becomes an issue.
    #[tracing::instrument(skip(self, file), fields(
        upload.name = %file.original_filename,
        upload.declared_size = file.declared_size,
    ))]
    pub async fn validate(&self, file: &FileDescriptor, received: bool) -> ValidationResult {
        let result = self.run_checks(file, received).await;

        tracing::info!(
            verdict = %result.verdict(),
            errors = ?result.error_messages(),
            mime_type = ?result.metadata.as_ref().map(|m| m.mime_type.as_str()),
            width = ?result.metadata.as_ref().and_then(|m| m.width),
            height = ?result.metadata.as_ref().and_then(|m| m.height),
            "Upload validated"
        );
        result
    }

    async fn run_checks(&self, file: &FileDescriptor, received: bool) -> ValidationResult {
        if !received || !file.path.is_file() {
            return ValidationResult::from_issues(vec![ValidationIssue::TransferFailed], None);
        }

        if file.declared_size > self.limits.max_file_bytes {
            return ValidationResult::from_issues(
                vec![ValidationIssue::FileTooLarge {
                    limit_bytes: self.limits.max_file_bytes,
                }],
                None,
            );
        }

        let (metadata, decoded) = match self.extractor.extract(&file.path).await {
            Ok(metadata) => (metadata, true),
            Err(ExtractError::CorruptImage { partial, .. }) => (partial, false),
            Err(ExtractError::Io(e)) => {
                tracing::warn!(path = %file.path.display(), error = %e, "Upload unreadable");
                return ValidationResult::from_issues(vec![ValidationIssue::TransferFailed], None);
            }
        };

        let mut errors = Vec::new();
        // Neither the declaration nor the bytes on disk may exceed a ceiling.
        let size = file.declared_size.max(metadata.byte_size);

        match classify(&metadata.mime_type) {
            MediaKind::Unsupported => {
                errors.push(ValidationIssue::TypeNotAllowed {
                    mime_type: metadata.mime_type.clone(),
                });
                return ValidationResult::from_issues(errors, Some(metadata));
            }
            MediaKind::Image => {
                if size > self.limits.max_image_bytes {
                    errors.push(ValidationIssue::ImageTooLarge {
                        limit_bytes: self.limits.max_image_bytes,
                    });
                }
                if !decoded {
                    errors.push(ValidationIssue::CorruptImage);
                }
            }
            MediaKind::Video => {
                if size > self.limits.max_video_bytes {
                    errors.push(ValidationIssue::VideoTooLarge {
                        limit_bytes: self.limits.max_video_bytes,
                    });
                }
                if metadata.dimensions().is_none() {
                    errors.push(ValidationIssue::UnknownVideoDimensions);
                }
            }
        }

        if let Some((width, height)) = metadata.dimensions() {
            if !conforms_to(width, height, &self.geometry) {
                errors.push(ValidationIssue::AspectRatioMismatch {
                    expected: self.geometry.label(),
                    width,
                    height,
                });
            }
        }

        ValidationResult::from_issues(errors, Some(metadata))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaTools, TokioProcessRunner};
    use image::{ImageFormat, Rgb, RgbImage};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    fn validator() -> MediaValidator {
        let extractor = MetadataExtractor::new(
            &MediaTools::unavailable(),
            Arc::new(TokioProcessRunner),
            Duration::from_secs(1),
        );
        MediaValidator::new(extractor, SizeLimits::default(), TargetGeometry::PORTRAIT)
    }

    fn write_png(dir: &Path, w: u32, h: u32) -> PathBuf {
        let path = dir.join("upload.png");
        RgbImage::from_pixel(w, h, Rgb([9, 9, 9]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    fn descriptor(path: &Path) -> FileDescriptor {
        let size = std::fs::metadata(path).unwrap().len();
        FileDescriptor::new(path, "upload.png", size)
    }

    #[test]
    fn test_issue_messages() {
        assert_eq!(
            ValidationIssue::ImageTooLarge {
                limit_bytes: 10 * BYTES_PER_MB
            }
            .to_string(),
            "Image size exceeds maximum allowed size (10MB)"
        );
        assert_eq!(
            ValidationIssue::AspectRatioMismatch {
                expected: "9:16".to_string(),
                width: 1,
                height: 1
            }
            .to_string(),
            "Media must have 9:16 aspect ratio (portrait orientation)"
        );
    }

    #[test]
    fn test_verdict_classification() {
        let aspect = ValidationIssue::AspectRatioMismatch {
            expected: "9:16".to_string(),
            width: 1920,
            height: 1080,
        };

        let clean = ValidationResult::from_issues(vec![], None);
        let soft = ValidationResult::from_issues(vec![aspect.clone()], None);
        let hard = ValidationResult::from_issues(vec![ValidationIssue::CorruptImage, aspect], None);

        assert_eq!(clean.verdict(), Verdict::AcceptAsIs);
        assert!(clean.is_valid);
        assert_eq!(soft.verdict(), Verdict::AcceptAndNormalize);
        assert!(!soft.is_valid);
        assert_eq!(hard.verdict(), Verdict::Reject);
    }

    #[tokio::test]
    async fn test_conforming_image_is_accepted_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 90, 160);

        let result = validator().validate(&descriptor(&path), true).await;

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.verdict(), Verdict::AcceptAsIs);
        assert_eq!(result.kind(), MediaKind::Image);
    }

    #[tokio::test]
    async fn test_landscape_image_needs_normalization() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 160, 90);

        let result = validator().validate(&descriptor(&path), true).await;

        assert!(!result.is_valid);
        assert_eq!(result.error_messages().len(), 1);
        assert_eq!(result.verdict(), Verdict::AcceptAndNormalize);
    }

    #[tokio::test]
    async fn test_failed_transfer_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 160, 90);

        let result = validator().validate(&descriptor(&path), false).await;

        assert_eq!(result.errors, vec![ValidationIssue::TransferFailed]);
        assert!(result.metadata.is_none());
        assert_eq!(result.verdict(), Verdict::Reject);
    }

    #[tokio::test]
    async fn test_missing_temp_file_is_transfer_failure() {
        let file = FileDescriptor::new("/no/such/tmp/upload", "a.jpg", 10);
        let result = validator().validate(&file, true).await;
        assert_eq!(result.errors, vec![ValidationIssue::TransferFailed]);
    }

    #[tokio::test]
    async fn test_oversized_declaration_reports_single_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 160, 90);
        let file = FileDescriptor::new(&path, "upload.png", 200 * BYTES_PER_MB);

        let result = validator().validate(&file, true).await;

        assert_eq!(
            result.error_messages(),
            vec!["File size exceeds maximum allowed size".to_string()]
        );
    }

    #[tokio::test]
    async fn test_image_issues_accumulate() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 160, 90);
        let file = FileDescriptor::new(&path, "upload.png", 20 * BYTES_PER_MB);

        let result = validator().validate(&file, true).await;

        assert_eq!(result.errors.len(), 2);
        assert!(matches!(result.errors[0], ValidationIssue::ImageTooLarge { .. }));
        assert!(result.errors[1].is_soft());
        assert_eq!(result.verdict(), Verdict::Reject);
    }

    #[tokio::test]
    async fn test_unsupported_type_stops_checks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.jpg");
        std::fs::write(&path, "definitely not a picture").unwrap();

        let result = validator().validate(&descriptor(&path), true).await;

        assert_eq!(result.errors.len(), 1);
        assert!(matches!(result.errors[0], ValidationIssue::TypeNotAllowed { .. }));
        assert_eq!(result.kind(), MediaKind::Unsupported);
    }

    #[tokio::test]
    async fn test_custom_limits_appear_in_messages() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), 90, 160);
        let extractor = MetadataExtractor::new(
            &MediaTools::unavailable(),
            Arc::new(TokioProcessRunner),
            Duration::from_secs(1),
        );
        let limits = SizeLimits {
            max_image_bytes: 0,
            ..SizeLimits::default()
        };
        let validator = MediaValidator::new(extractor, limits, TargetGeometry::PORTRAIT);

        let result = validator.validate(&descriptor(&path), true).await;

        assert_eq!(
            result.error_messages(),
            vec!["Image size exceeds maximum allowed size (0MB)".to_string()]
        );
    }
}
