//! Persistence seam for finalized media records.

use async_trait::async_trait;
use castmedia_core::MediaKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Approval status every new upload starts in.
pub const PENDING_APPROVAL: &str = "pending";

/// A stored upload as handed to the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub media_type: MediaKind,
    pub title: String,
    pub description: String,
    pub mime_type: String,
    pub media_url: String,
    pub normalized_url: Option<String>,
    pub file_size: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub aspect_ratio: Option<f64>,
    pub duration_seconds: Option<f64>,
    pub approval_status: String,
    pub created_at: DateTime<Utc>,
}

/// Receives finalized records and returns their identifier.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn insert(&self, record: &MediaRecord) -> Result<String, anyhow::Error>;
}

#[derive(Serialize)]
struct StoredLine<'a> {
    id: &'a str,
    #[serde(flatten)]
    record: &'a MediaRecord,
}

/// Append-only JSON lines file, one record per line, UUID identifiers.
pub struct JsonLinesStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonLinesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl MediaStore for JsonLinesStore {
    async fn insert(&self, record: &MediaRecord) -> Result<String, anyhow::Error> {
        let id = Uuid::new_v4().to_string();
        let mut line = serde_json::to_string(&StoredLine { id: &id, record })?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!(media_id = %id, path = %self.path.display(), "Media record appended");
        Ok(id)
    }
}
