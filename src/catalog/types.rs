use chrono::{DateTime, Utc};
use reelhouse_common::paths::content_type_for_extension;
use reelhouse_common::{AssetId, AssetStatus};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One uploaded video and its derived metadata.
///
/// `id` and `storage_path` are immutable for the asset's lifetime; `status`,
/// `thumbnail_path`, and `failure_reason` are mutated only by the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoAsset {
    pub id: AssetId,
    /// Sanitized display name. Never used for path construction.
    pub original_name: String,
    /// Source file location, relative to the storage root.
    pub storage_path: PathBuf,
    /// Set only once thumbnail generation succeeds.
    pub thumbnail_path: Option<PathBuf>,
    /// Exact byte length read from the filesystem, never estimated.
    pub size_bytes: u64,
    pub status: AssetStatus,
    pub created_at: DateTime<Utc>,
    /// Populated only when `status` is `Failed`.
    pub failure_reason: Option<String>,
}

impl VideoAsset {
    /// Create a freshly ingested asset in the `Uploading` state.
    pub fn new(
        id: AssetId,
        original_name: String,
        storage_path: PathBuf,
        size_bytes: u64,
    ) -> Self {
        Self {
            id,
            original_name,
            storage_path,
            thumbnail_path: None,
            size_bytes,
            status: AssetStatus::Uploading,
            created_at: Utc::now(),
            failure_reason: None,
        }
    }

    /// Container extension of the stored file (lowercase, no dot).
    pub fn container_extension(&self) -> String {
        self.storage_path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }

    /// MIME type derived from the container extension.
    pub fn content_type(&self) -> &'static str {
        content_type_for_extension(&self.container_extension())
    }
}
