//! Ingestion service composing validator, allocator and normalizer.

use castmedia_core::{AppError, FileDescriptor, MediaKind, MediaPipelineConfig, TargetGeometry};
use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::store::{MediaRecord, MediaStore, PENDING_APPROVAL};
use crate::classifier::classify;
use crate::filename::{AllocateError, FilenameAllocator};
use crate::metadata::MetadataExtractor;
use crate::normalizer::Normalizer;
use crate::process::ProcessRunner;
use crate::tools::MediaTools;
use crate::validator::{MediaValidator, SizeLimits, Verdict};

const PHOTOS_DIR: &str = "photos";
const VIDEOS_DIR: &str = "videos";
const NORMALIZED_DIR: &str = "norm";
const NORMALIZED_PREFIX: &str = "norm_";
const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Media validation failed: {}", .0.join(", "))]
    Rejected(Vec<String>),

    #[error(transparent)]
    Allocate(#[from] AllocateError),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Failed to record media: {0}")]
    Store(#[source] anyhow::Error),
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Rejected(errors) => AppError::ValidationFailed(errors.join(", ")),
            IngestError::Allocate(e) => AppError::Storage(e.to_string()),
            IngestError::Io { context, source } => AppError::Storage(format!("{}: {}", context, source)),
            IngestError::Store(source) => AppError::internal_with_source("Failed to record media", source),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub file: FileDescriptor,
    /// Whether the transfer completed intact.
    pub received: bool,
    pub title: String,
    pub description: String,
}

impl IngestRequest {
    pub fn new(file: FileDescriptor) -> Self {
        Self {
            file,
            received: true,
            title: String::new(),
            description: String::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into().trim().to_string();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into().trim().to_string();
        self
    }
}

#[derive(Debug, Clone)]
pub struct IngestedMedia {
    pub id: String,
    pub verdict: Verdict,
    pub record: MediaRecord,
    pub stored_path: PathBuf,
    pub normalized_path: Option<PathBuf>,
}

pub struct IngestService {
    validator: MediaValidator,
    normalizer: Normalizer,
    allocator: FilenameAllocator,
    store: Arc<dyn MediaStore>,
    upload_root: PathBuf,
}

impl IngestService {
    pub fn new(
        validator: MediaValidator,
        normalizer: Normalizer,
        store: Arc<dyn MediaStore>,
        upload_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            validator,
            normalizer,
            allocator: FilenameAllocator::default(),
            store,
            upload_root: upload_root.into(),
        }
    }

    /// Wire the whole pipeline from configuration and discovered tools.
    pub fn from_config(
        config: &MediaPipelineConfig,
        tools: &MediaTools,
        runner: Arc<dyn ProcessRunner>,
        store: Arc<dyn MediaStore>,
    ) -> Self {
        let extractor = MetadataExtractor::new(tools, runner.clone(), config.probe_timeout());
        let validator = MediaValidator::new(
            extractor,
            SizeLimits::from_config(config),
            TargetGeometry::PORTRAIT,
        );
        let normalizer = Normalizer::from_tools(tools, runner, config);
        Self::new(validator, normalizer, store, config.upload_dir.clone())
    }

    pub fn upload_root(&self) -> &Path {
        &self.upload_root
    }

    /// Ingest one upload.
    ///
    /// Rejected uploads leave the temporary file untouched. Accepted uploads
    /// are moved under `photos/` or `videos/`; a failed normalization only
    /// drops the normalized URL. If the store fails, every file written
    /// here is removed again.
    #[tracing::instrument(skip(self, request), fields(upload.name = %request.file.original_filename))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestedMedia, IngestError> {
        let validation = self.validator.validate(&request.file, request.received).await;
        let verdict = validation.verdict();
        let metadata = match (verdict, validation.metadata.clone()) {
            (Verdict::Reject, _) | (_, None) => {
                return Err(IngestError::Rejected(validation.error_messages()))
            }
            (_, Some(metadata)) => metadata,
        };

        let kind = classify(&metadata.mime_type);
        let subdir = match kind {
            MediaKind::Video => VIDEOS_DIR,
            _ => PHOTOS_DIR,
        };
        let target_dir = self.upload_root.join(subdir);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .map_err(|source| IngestError::Io {
                context: "Failed to create upload directory",
                source,
            })?;

        let filename = self
            .reserve(&request.file.original_filename, &target_dir)
            .await?;
        let stored_path = target_dir.join(&filename);

        if let Err(source) = move_file(&request.file.path, &stored_path).await {
            remove_quietly(&stored_path).await;
            return Err(IngestError::Io {
                context: "Failed to save uploaded file",
                source,
            });
        }

        let normalized = if verdict == Verdict::AcceptAndNormalize {
            self.normalize_stored(&stored_path, &filename, kind).await
        } else {
            None
        };
        let (normalized_path, normalized_name) = normalized.unzip();

        let record = MediaRecord {
            media_type: kind,
            title: request.title,
            description: request.description,
            mime_type: metadata.mime_type.clone(),
            media_url: format!("{}/{}/{}", PUBLIC_PREFIX, subdir, filename),
            normalized_url: normalized_name
                .map(|name| format!("{}/{}/{}", PUBLIC_PREFIX, NORMALIZED_DIR, name)),
            file_size: metadata.byte_size,
            width: metadata.width,
            height: metadata.height,
            aspect_ratio: metadata.aspect_ratio(),
            duration_seconds: metadata.duration_seconds,
            approval_status: PENDING_APPROVAL.to_string(),
            created_at: Utc::now(),
        };

        let id = match self.store.insert(&record).await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Media store failed, removing stored files");
                remove_quietly(&stored_path).await;
                if let Some(path) = &normalized_path {
                    remove_quietly(path).await;
                }
                return Err(IngestError::Store(e));
            }
        };

        tracing::info!(
            media_id = %id,
            media_type = %kind,
            media_url = %record.media_url,
            normalized = normalized_path.is_some(),
            verdict = %verdict,
            "Media ingested"
        );

        Ok(IngestedMedia {
            id,
            verdict,
            record,
            stored_path,
            normalized_path,
        })
    }

    /// Reserve a unique name in `dir` on the blocking pool.
    async fn reserve(&self, original: &str, dir: &Path) -> Result<String, IngestError> {
        let allocator = self.allocator;
        let original = original.to_string();
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || allocator.allocate(&original, &dir))
            .await
            .map_err(|e| IngestError::Io {
                context: "Filename allocation worker failed",
                source: io::Error::other(e),
            })?
            .map_err(IngestError::from)
    }

    /// Photos and videos share `norm/`, so the derivative name is reserved
    /// there like any stored upload. Returns the path and reserved name.
    async fn normalize_stored(
        &self,
        stored: &Path,
        filename: &str,
        kind: MediaKind,
    ) -> Option<(PathBuf, String)> {
        let norm_dir = self.upload_root.join(NORMALIZED_DIR);
        if let Err(e) = tokio::fs::create_dir_all(&norm_dir).await {
            tracing::warn!(error = %e, "Could not create normalized directory, skipping");
            return None;
        }

        let wanted = format!("{}{}", NORMALIZED_PREFIX, filename);
        let name = match self.reserve(&wanted, &norm_dir).await {
            Ok(name) => name,
            Err(e) => {
                tracing::warn!(error = %e, "Could not reserve normalized filename, skipping");
                return None;
            }
        };
        let dest = norm_dir.join(&name);

        let outcome = self.normalizer.normalize(stored, &dest, kind).await;
        match outcome.output_path {
            Some(path) => Some((path, name)),
            None => {
                tracing::warn!(
                    reason = ?outcome.failure_reason,
                    "Continuing upload without normalized derivative"
                );
                // Our own placeholder; the normalizer leaves pre-existing files alone.
                remove_quietly(&dest).await;
                None
            }
        }
    }
}

/// Rename, falling back to copy+remove across filesystems.
async fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, "Rename failed, copying instead");
            tokio::fs::copy(from, to).await?;
            tokio::fs::remove_file(from).await
        }
    }
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Cleanup failed");
        }
    }
}
