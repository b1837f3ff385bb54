//! Bounded-concurrency thumbnail worker pool.
//!
//! N workers pull jobs from one shared channel; each job runs the external
//! extractor (at most once per attempt) with a bounded retry count, downsizes
//! the grabbed frame, and advances the asset's catalog status to `ready` or
//! `failed`. Jobs never leave an asset stuck in `processing`.

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::ImageFormat;
use reelhouse_common::{AssetId, AssetStatus, Error};
use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::catalog::Catalog;
use crate::config::ThumbnailConfig;
use crate::storage::StorageLayout;
use crate::thumbnail::extractor::{ExtractError, FrameExtractor};

/// A unit of post-processing work: generate the thumbnail for one asset.
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailJob {
    pub asset_id: AssetId,
}

/// Runtime settings for the pool, derived from [`ThumbnailConfig`].
#[derive(Debug, Clone)]
pub struct ThumbnailSettings {
    pub workers: usize,
    pub timestamp_secs: f64,
    pub width: u32,
    pub retry_limit: u32,
    pub retry_backoff: Duration,
}

impl From<&ThumbnailConfig> for ThumbnailSettings {
    fn from(config: &ThumbnailConfig) -> Self {
        Self {
            workers: config.workers.max(1),
            timestamp_secs: config.timestamp_secs,
            width: config.width,
            retry_limit: config.retry_limit,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self::from(&ThumbnailConfig::default())
    }
}

struct WorkerContext {
    settings: ThumbnailSettings,
    catalog: Arc<Catalog>,
    storage: Arc<StorageLayout>,
    extractor: Arc<dyn FrameExtractor>,
}

/// Fixed-size pool of thumbnail workers over a shared job channel.
pub struct ThumbnailWorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl ThumbnailWorkerPool {
    /// Spawn `settings.workers` workers consuming from `rx`. The pool drains
    /// until every job sender is dropped.
    pub fn start(
        settings: ThumbnailSettings,
        catalog: Arc<Catalog>,
        storage: Arc<StorageLayout>,
        extractor: Arc<dyn FrameExtractor>,
        rx: mpsc::Receiver<ThumbnailJob>,
    ) -> Self {
        let ctx = Arc::new(WorkerContext {
            settings,
            catalog,
            storage,
            extractor,
        });
        let rx = Arc::new(Mutex::new(rx));

        let handles = (0..ctx.settings.workers)
            .map(|slot| {
                let ctx = Arc::clone(&ctx);
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    debug!("Thumbnail worker {} started", slot);
                    loop {
                        let job = { rx.lock().await.recv().await };
                        match job {
                            Some(job) => process_job(&ctx, job).await,
                            None => break,
                        }
                    }
                    debug!("Thumbnail worker {} stopped", slot);
                })
            })
            .collect();

        Self { handles }
    }

    /// Wait for all workers to drain and exit.
    pub async fn join(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                warn!("Thumbnail worker panicked: {}", e);
            }
        }
    }
}

async fn process_job(ctx: &WorkerContext, job: ThumbnailJob) {
    let id = job.asset_id;

    // The asset may have been deleted while the job sat in the queue.
    let asset = match ctx.catalog.get(id) {
        Ok(asset) => asset,
        Err(_) => {
            debug!("Skipping thumbnail job for vanished asset {}", id);
            return;
        }
    };
    if asset.status != AssetStatus::Processing {
        debug!(
            "Skipping thumbnail job for {} in state {}",
            id, asset.status
        );
        return;
    }

    let source = ctx.storage.resolve(&asset);
    let thumb_path = ctx.storage.thumbnail_path_for(id);

    let mut attempt = 0;
    let outcome = loop {
        attempt += 1;
        let result = generate_thumbnail(ctx, &source, &thumb_path).await;
        match result {
            Ok(()) => break Ok(()),
            Err(e) => {
                if e.transient && attempt <= ctx.settings.retry_limit {
                    warn!(
                        asset_id = %id,
                        attempt,
                        "Thumbnail attempt failed, retrying: {}",
                        e.message
                    );
                    tokio::time::sleep(ctx.settings.retry_backoff * attempt).await;
                    continue;
                }
                break Err(e);
            }
        }
    };

    match outcome {
        Ok(()) => {
            info!(asset_id = %id, "Thumbnail generated");
            if let Err(e) =
                ctx.catalog
                    .update_status(id, AssetStatus::Ready, Some(thumb_path), None)
            {
                report_update_failure(id, e);
            }
        }
        Err(e) => {
            error!(asset_id = %id, "Thumbnail generation failed: {}", e.message);
            if let Err(update_err) =
                ctx.catalog
                    .update_status(id, AssetStatus::Failed, None, Some(e.message))
            {
                report_update_failure(id, update_err);
            }
        }
    }
}

/// A deleted asset makes the final status update a no-op; anything else is an
/// invariant violation worth shouting about.
fn report_update_failure(id: AssetId, e: Error) {
    match e {
        Error::NotFound(_) => debug!("Asset {} deleted before status update", id),
        other => error!(asset_id = %id, "Failed to update asset status: {}", other),
    }
}

struct AttemptError {
    message: String,
    transient: bool,
}

/// One extraction attempt: grab a frame to a temp file, downscale, encode
/// JPEG at the storage-owned thumbnail path. Blocking work runs off the
/// async path.
async fn generate_thumbnail(
    ctx: &WorkerContext,
    source: &std::path::Path,
    thumb_path: &std::path::Path,
) -> Result<(), AttemptError> {
    let extractor = Arc::clone(&ctx.extractor);
    let source = source.to_path_buf();
    let thumb_path = thumb_path.to_path_buf();
    let timestamp = ctx.settings.timestamp_secs;
    let width = ctx.settings.width;

    tokio::task::spawn_blocking(move || {
        let frame = tempfile::Builder::new()
            .prefix("reelhouse-frame-")
            .suffix(".png")
            .tempfile()
            .map_err(|e| AttemptError {
                message: format!("Failed to create temp frame file: {e}"),
                transient: true,
            })?;

        extractor
            .extract_frame(&source, timestamp, frame.path())
            .map_err(|e| AttemptError {
                transient: e.is_transient(),
                message: e.to_string(),
            })?;

        let img = image::open(frame.path()).map_err(|e| AttemptError {
            message: format!("Failed to decode extracted frame: {e}"),
            transient: false,
        })?;

        // Only downscale; smaller frames keep their size.
        let resized = if img.width() > width {
            img.resize(width, u32::MAX, FilterType::Lanczos3)
        } else {
            img
        };

        let mut buf = Cursor::new(Vec::new());
        resized
            .write_to(&mut buf, ImageFormat::Jpeg)
            .map_err(|e| AttemptError {
                message: format!("Failed to encode thumbnail: {e}"),
                transient: false,
            })?;
        std::fs::write(&thumb_path, buf.into_inner()).map_err(|e| AttemptError {
            message: format!("Failed to write {}: {e}", thumb_path.display()),
            transient: true,
        })?;

        Ok(())
    })
    .await
    .map_err(|e| AttemptError {
        message: format!("Thumbnail task join error: {e}"),
        transient: false,
    })?
}
