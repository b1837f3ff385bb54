//! Upload validation and commit.
//!
//! An upload only becomes a catalog entry after its bytes are fully and
//! durably on disk; any failure along the way removes the partial file and
//! leaves the catalog untouched. The size ceiling is enforced while the body
//! streams in, not after full receipt.

use std::sync::Arc;

use axum::extract::multipart::Multipart;
use reelhouse_common::paths::is_video_extension;
use reelhouse_common::{AssetId, AssetStatus, Error, Result};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::catalog::{Catalog, VideoAsset};
use crate::storage::StorageLayout;
use crate::thumbnail::ThumbnailJob;

const MAX_NAME_LENGTH: usize = 255;

/// The multipart field the upload must arrive in.
const UPLOAD_FIELD: &str = "video";

/// Validates and commits uploads, then hands assets to the worker pool.
pub struct IngestService {
    storage: Arc<StorageLayout>,
    catalog: Arc<Catalog>,
    jobs: mpsc::Sender<ThumbnailJob>,
    max_upload_bytes: u64,
}

impl IngestService {
    pub fn new(
        storage: Arc<StorageLayout>,
        catalog: Arc<Catalog>,
        jobs: mpsc::Sender<ThumbnailJob>,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            storage,
            catalog,
            jobs,
            max_upload_bytes,
        }
    }

    /// Ingest one upload from a multipart body. `declared_size` is the
    /// request's Content-Length when present, used to abort clearly oversized
    /// uploads before any bytes are written.
    ///
    /// Returns the new id and the sanitized name actually stored.
    pub async fn ingest(
        &self,
        mut multipart: Multipart,
        declared_size: Option<u64>,
    ) -> Result<(AssetId, String)> {
        if let Some(declared) = declared_size {
            if declared > self.max_upload_bytes {
                return Err(Error::payload_too_large(format!(
                    "Declared size {declared} exceeds limit of {} bytes",
                    self.max_upload_bytes
                )));
            }
        }

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| Error::storage(format!("Failed to read multipart body: {e}")))?
        {
            if field.name() != Some(UPLOAD_FIELD) {
                continue;
            }

            let declared_name = field.file_name().unwrap_or_default().to_string();
            let original_name = sanitize_name(&declared_name)?;
            let extension = validate_extension(&declared_name)?;

            let (id, path) = self.storage.allocate(&extension);

            // Stream to disk, enforcing the ceiling per chunk. Any failure
            // (including the client vanishing mid-upload) must not leave a
            // partial file behind.
            match write_field_to_disk(field, &path, self.max_upload_bytes).await {
                Ok(()) => {}
                Err(e) => {
                    remove_partial(&path).await;
                    return Err(e);
                }
            }

            let size_bytes = tokio::fs::metadata(&path).await.map(|m| m.len())?;

            let asset = VideoAsset::new(
                id,
                original_name.clone(),
                self.storage.relative_source_path(id, &extension),
                size_bytes,
            );

            // Register only now that the bytes are durable.
            if let Err(e) = self.catalog.register(asset) {
                remove_partial(&path).await;
                return Err(e);
            }
            self.catalog
                .update_status(id, AssetStatus::Processing, None, None)?;

            info!(
                asset_id = %id,
                original_name = %original_name,
                size_bytes,
                "Upload ingested"
            );

            if self.jobs.send(ThumbnailJob { asset_id: id }).await.is_err() {
                // Only happens while shutting down; the startup rebuild will
                // re-enqueue this asset.
                warn!(asset_id = %id, "Worker pool unavailable, thumbnail deferred");
            }

            return Ok((id, original_name));
        }

        Err(Error::invalid_name(format!(
            "Multipart body has no '{UPLOAD_FIELD}' file field"
        )))
    }
}

async fn write_field_to_disk(
    mut field: axum::extract::multipart::Field<'_>,
    path: &std::path::Path,
    max_bytes: u64,
) -> Result<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| Error::storage(format!("Failed to create {}: {e}", path.display())))?;

    let mut written: u64 = 0;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| Error::storage(format!("Upload stream failed: {e}")))?
    {
        written += chunk.len() as u64;
        if written > max_bytes {
            return Err(Error::payload_too_large(format!(
                "Upload exceeds limit of {max_bytes} bytes"
            )));
        }
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::storage(format!("Failed to write upload: {e}")))?;
    }

    file.sync_all()
        .await
        .map_err(|e| Error::storage(format!("Failed to sync upload: {e}")))?;

    Ok(())
}

async fn remove_partial(path: &std::path::Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial upload {}: {}", path.display(), e);
        }
    }
}

/// Validate and sanitize a declared upload name. Path separators, control
/// characters, and traversal sequences are rejected outright; remaining
/// unusual characters are replaced rather than trusted.
pub fn sanitize_name(declared: &str) -> Result<String> {
    let trimmed = declared.trim();
    if trimmed.is_empty() {
        return Err(Error::invalid_name("Name must not be empty"));
    }
    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(Error::invalid_name("Name must not contain path separators"));
    }
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(Error::invalid_name(
            "Name must not contain control characters",
        ));
    }
    if trimmed.contains("..") {
        return Err(Error::invalid_name("Name must not contain '..'"));
    }

    let sanitized: String = trimmed
        .chars()
        .take(MAX_NAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();

    Ok(sanitized)
}

/// Extract and validate the container extension against the allow-list.
pub fn validate_extension(declared: &str) -> Result<String> {
    let extension = declared
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    if !is_video_extension(&extension) {
        return Err(Error::unsupported_type(format!(
            "'{extension}' is not an accepted video container"
        )));
    }

    Ok(extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_accepts_plain_names() {
        assert_eq!(sanitize_name("clip.mp4").unwrap(), "clip.mp4");
        assert_eq!(sanitize_name("My Movie-1.mkv").unwrap(), "My Movie-1.mkv");
    }

    #[test]
    fn sanitize_rejects_empty() {
        assert!(matches!(sanitize_name(""), Err(Error::InvalidName(_))));
        assert!(matches!(sanitize_name("   "), Err(Error::InvalidName(_))));
    }

    #[test]
    fn sanitize_rejects_path_separators() {
        assert!(matches!(
            sanitize_name("../../etc/passwd.mp4"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            sanitize_name("dir\\clip.mp4"),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn sanitize_rejects_control_characters() {
        assert!(matches!(
            sanitize_name("clip\0.mp4"),
            Err(Error::InvalidName(_))
        ));
        assert!(matches!(
            sanitize_name("clip\n.mp4"),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn sanitize_rejects_traversal_without_separator() {
        assert!(matches!(
            sanitize_name("..mp4"),
            Err(Error::InvalidName(_))
        ));
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_name("clip$!.mp4").unwrap(), "clip__.mp4");
    }

    #[test]
    fn sanitize_caps_length() {
        let long = format!("{}.mp4", "a".repeat(400));
        assert_eq!(sanitize_name(&long).unwrap().len(), MAX_NAME_LENGTH);
    }

    #[test]
    fn extension_allow_list() {
        assert_eq!(validate_extension("clip.mp4").unwrap(), "mp4");
        assert_eq!(validate_extension("clip.MKV").unwrap(), "mkv");
        assert!(matches!(
            validate_extension("notes.txt"),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_extension("no_extension"),
            Err(Error::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_extension("archive.tar.gz"),
            Err(Error::UnsupportedType(_))
        ));
    }
}
