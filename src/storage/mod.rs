//! Filesystem storage layout for originals and thumbnails.
//!
//! All placement decisions live here: originals at `{root}/videos/{id}.{ext}`,
//! thumbnails at `{root}/thumbnails/{id}.jpg`, the catalog index at
//! `{root}/catalog.json`. Ids are allocated server-side, so no client-supplied
//! string ever participates in path construction.

use std::path::{Path, PathBuf};

use reelhouse_common::paths::is_video_extension;
use reelhouse_common::{AssetId, Error, Result};

use crate::catalog::VideoAsset;

const VIDEOS_DIR: &str = "videos";
const THUMBNAILS_DIR: &str = "thumbnails";
const INDEX_FILE: &str = "catalog.json";

/// A source file discovered on disk during a rebuild scan.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub id: AssetId,
    pub path: PathBuf,
    pub extension: String,
    pub size_bytes: u64,
}

/// Deterministic, collision-free placement of uploaded bytes and derived
/// thumbnails under a single fixed root directory.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    root: PathBuf,
}

impl StorageLayout {
    /// Open (creating if necessary) the storage root and verify it is
    /// writable. An unwritable root is fatal: the service must refuse to
    /// start rather than run in a silently-failing mode.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        for dir in [root.clone(), root.join(VIDEOS_DIR), root.join(THUMBNAILS_DIR)] {
            std::fs::create_dir_all(&dir).map_err(|e| {
                Error::storage(format!("Cannot create {}: {e}", dir.display()))
            })?;
        }

        // Probe writability with a marker file rather than trusting metadata.
        let probe = root.join(".write-probe");
        std::fs::write(&probe, b"probe")
            .and_then(|_| std::fs::remove_file(&probe))
            .map_err(|e| {
                Error::storage(format!("Storage root {} is not writable: {e}", root.display()))
            })?;

        Ok(Self { root })
    }

    /// Allocate a fresh id and the storage path for an upload with the given
    /// (already validated) container extension.
    pub fn allocate(&self, extension: &str) -> (AssetId, PathBuf) {
        let id = AssetId::new();
        let path = self
            .root
            .join(VIDEOS_DIR)
            .join(format!("{id}.{extension}"));
        (id, path)
    }

    /// Resolve the on-disk path for a catalog entry. This is the only
    /// path-construction entry point the streaming layer uses; it never
    /// accepts a client-supplied path component.
    pub fn resolve(&self, asset: &VideoAsset) -> PathBuf {
        self.root.join(&asset.storage_path)
    }

    /// Deterministic thumbnail path, derived from the id alone.
    pub fn thumbnail_path_for(&self, id: AssetId) -> PathBuf {
        self.root.join(THUMBNAILS_DIR).join(format!("{id}.jpg"))
    }

    /// Root-relative storage path for a freshly allocated original, as
    /// recorded in the catalog.
    pub fn relative_source_path(&self, id: AssetId, extension: &str) -> PathBuf {
        PathBuf::from(VIDEOS_DIR).join(format!("{id}.{extension}"))
    }

    /// Path of the persisted catalog index.
    pub fn index_path(&self) -> PathBuf {
        self.root.join(INDEX_FILE)
    }

    /// Remove an asset's source file and thumbnail. Best-effort: a missing
    /// file is not an error, and thumbnail removal failure is logged rather
    /// than propagated so the source unlink still happens.
    pub fn remove_asset_files(&self, asset: &VideoAsset) {
        let source = self.resolve(asset);
        if let Err(e) = std::fs::remove_file(&source) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", source.display(), e);
            }
        }

        let thumb = self.thumbnail_path_for(asset.id);
        if let Err(e) = std::fs::remove_file(&thumb) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", thumb.display(), e);
            }
        }
    }

    /// Enumerate source files for the startup rebuild. Only files named
    /// `{uuid}.{allowed-extension}` are considered; anything else in the
    /// directory is ignored.
    pub fn scan(&self) -> Result<Vec<ScannedFile>> {
        let videos_dir = self.root.join(VIDEOS_DIR);
        let mut found = Vec::new();

        for entry in std::fs::read_dir(&videos_dir)? {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type()?.is_file() {
                continue;
            }

            let Some((id, extension)) = parse_storage_name(&path) else {
                tracing::debug!("Ignoring unrecognized file in storage: {}", path.display());
                continue;
            };

            let size_bytes = entry.metadata()?.len();
            found.push(ScannedFile {
                id,
                path,
                extension,
                size_bytes,
            });
        }

        Ok(found)
    }

    /// Whether a thumbnail file exists for the given id.
    pub fn has_thumbnail(&self, id: AssetId) -> bool {
        self.thumbnail_path_for(id).exists()
    }
}

/// Parse `{uuid}.{ext}` storage file names; rejects anything else.
fn parse_storage_name(path: &Path) -> Option<(AssetId, String)> {
    let stem = path.file_stem()?.to_str()?;
    let ext = path.extension()?.to_str()?.to_lowercase();
    if !is_video_extension(&ext) {
        return None;
    }
    let id: AssetId = stem.parse().ok()?;
    Some((id, ext))
}
