//! Authoritative, concurrency-safe index of video assets.
//!
//! The catalog is the single source of truth for what is servable and the
//! only component allowed to mutate asset state. Readers get consistent
//! snapshot clones; writers serialize on one lock. The index is persisted as
//! JSON after every mutation and reconciled against the filesystem at
//! startup, so listings never have to re-scan the disk per request.

mod types;

pub use types::*;

use parking_lot::RwLock;
use reelhouse_common::{AssetId, AssetStatus, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::storage::StorageLayout;

#[derive(Default)]
struct CatalogInner {
    by_id: HashMap<AssetId, VideoAsset>,
    /// Insertion order; listings follow upload order.
    order: Vec<AssetId>,
}

pub struct Catalog {
    inner: RwLock<CatalogInner>,
    index_path: Option<PathBuf>,
}

impl Catalog {
    /// Create an empty catalog persisting its index at `index_path`.
    pub fn new(index_path: Option<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(CatalogInner::default()),
            index_path,
        }
    }

    /// Rebuild the catalog from the persisted index reconciled against the
    /// storage layout. Returns the catalog plus the ids that still need a
    /// thumbnail and must be re-enqueued before the server starts serving.
    pub fn rebuild(storage: &StorageLayout) -> Result<(Self, Vec<AssetId>)> {
        let index_path = storage.index_path();
        let indexed = load_index(&index_path);
        let mut on_disk: HashMap<AssetId, crate::storage::ScannedFile> = storage
            .scan()?
            .into_iter()
            .map(|f| (f.id, f))
            .collect();

        let mut inner = CatalogInner::default();

        // Reconcile indexed entries against what actually survived on disk.
        for mut asset in indexed {
            let Some(file) = on_disk.remove(&asset.id) else {
                tracing::warn!("Dropping {}: source file missing", asset.id);
                continue;
            };
            asset.size_bytes = file.size_bytes;

            match asset.status {
                AssetStatus::Ready => {
                    if !storage.has_thumbnail(asset.id) {
                        tracing::warn!("Thumbnail for {} vanished, reprocessing", asset.id);
                        asset.thumbnail_path = None;
                        asset.status = AssetStatus::Processing;
                    }
                }
                AssetStatus::Uploading => {
                    // The file is fully on disk, so the upload completed but
                    // the index missed the transition. Resume processing.
                    asset.status = AssetStatus::Processing;
                }
                AssetStatus::Processing | AssetStatus::Failed => {}
            }

            inner.order.push(asset.id);
            inner.by_id.insert(asset.id, asset);
        }

        // Adopt well-named files that were never indexed.
        for (id, file) in on_disk {
            tracing::info!("Adopting unindexed file {}", file.path.display());
            let file_name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| id.to_string());
            let mut asset = VideoAsset::new(
                id,
                file_name,
                storage.relative_source_path(id, &file.extension),
                file.size_bytes,
            );
            if storage.has_thumbnail(id) {
                asset.status = AssetStatus::Ready;
                asset.thumbnail_path = Some(storage.thumbnail_path_for(id));
            } else {
                asset.status = AssetStatus::Processing;
            }
            inner.order.push(asset.id);
            inner.by_id.insert(asset.id, asset);
        }

        let pending: Vec<AssetId> = inner
            .order
            .iter()
            .filter(|id| {
                inner
                    .by_id
                    .get(id)
                    .is_some_and(|a| a.status == AssetStatus::Processing)
            })
            .copied()
            .collect();

        let catalog = Self {
            inner: RwLock::new(inner),
            index_path: Some(index_path),
        };
        catalog.persist();

        Ok((catalog, pending))
    }

    /// Insert a new asset. A duplicate id is an internal invariant violation
    /// (ids come from storage allocation): it is logged and surfaced as an
    /// error for this request, and existing entries are left untouched.
    pub fn register(&self, asset: VideoAsset) -> Result<AssetId> {
        let id = asset.id;
        {
            let mut inner = self.inner.write();
            if inner.by_id.contains_key(&id) {
                tracing::error!(
                    asset_id = %id,
                    original_name = %asset.original_name,
                    "Refusing to register duplicate asset id"
                );
                return Err(Error::DuplicateId(id));
            }
            inner.order.push(id);
            inner.by_id.insert(id, asset);
        }
        self.persist();
        Ok(id)
    }

    /// Get a snapshot of one asset.
    pub fn get(&self, id: AssetId) -> Result<VideoAsset> {
        let inner = self.inner.read();
        inner
            .by_id
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Consistent snapshot of all assets in insertion order, every status
    /// included; callers filter if they only want playable entries.
    pub fn list(&self) -> Vec<VideoAsset> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.by_id.get(id))
            .cloned()
            .collect()
    }

    /// Advance an asset along the forward-only state machine. Backward or
    /// skipped transitions are invariant violations: logged, rejected, and
    /// harmless to other entries.
    pub fn update_status(
        &self,
        id: AssetId,
        status: AssetStatus,
        thumbnail_path: Option<PathBuf>,
        failure_reason: Option<String>,
    ) -> Result<VideoAsset> {
        let updated = {
            let mut inner = self.inner.write();
            let asset = inner
                .by_id
                .get_mut(&id)
                .ok_or_else(|| Error::not_found(id.to_string()))?;

            if !asset.status.can_transition_to(status) {
                tracing::error!(
                    asset_id = %id,
                    from = %asset.status,
                    to = %status,
                    "Rejected invalid status transition"
                );
                return Err(Error::InvalidTransition {
                    from: asset.status,
                    to: status,
                });
            }

            asset.status = status;
            if status == AssetStatus::Ready {
                asset.thumbnail_path = thumbnail_path;
            }
            if status == AssetStatus::Failed {
                asset.failure_reason = failure_reason;
            }
            asset.clone()
        };
        self.persist();
        Ok(updated)
    }

    /// Remove an asset from the catalog. The entry disappears (and the index
    /// is persisted) before the caller unlinks any files, so no new stream
    /// can start once this returns; an already-open descriptor may finish.
    pub fn delete(&self, id: AssetId) -> Result<VideoAsset> {
        let removed = {
            let mut inner = self.inner.write();
            let asset = inner
                .by_id
                .remove(&id)
                .ok_or_else(|| Error::not_found(id.to_string()))?;
            inner.order.retain(|entry| *entry != id);
            asset
        };
        self.persist();
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().by_id.is_empty()
    }

    fn persist(&self) {
        if let Some(ref path) = self.index_path {
            if let Err(e) = self.save_to_file(path) {
                tracing::error!("Failed to persist catalog index: {}", e);
            }
        }
    }

    fn save_to_file(&self, path: &Path) -> Result<()> {
        let index = PersistedIndex {
            assets: self.list(),
        };
        let json = serde_json::to_string_pretty(&index)
            .map_err(|e| Error::internal(format!("Index serialization failed: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct PersistedIndex {
    assets: Vec<VideoAsset>,
}

fn load_index(path: &Path) -> Vec<VideoAsset> {
    if !path.exists() {
        return Vec::new();
    }
    match std::fs::read_to_string(path)
        .map_err(Error::from)
        .and_then(|content| {
            serde_json::from_str::<PersistedIndex>(&content)
                .map_err(|e| Error::internal(format!("Corrupt catalog index: {e}")))
        }) {
        Ok(index) => index.assets,
        Err(e) => {
            tracing::warn!("Ignoring unreadable catalog index: {}", e);
            Vec::new()
        }
    }
}
