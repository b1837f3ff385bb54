//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which assembles the full stack (tempdir-backed
//! storage, catalog, worker pool, ingest service) and starts Axum on a
//! random port for HTTP-level testing. The thumbnail pipeline runs with a
//! stub extractor by default so tests do not depend on ffmpeg.

// Each test binary uses a different subset of these helpers.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reelhouse::catalog::Catalog;
use reelhouse::config::Config;
use reelhouse::ingest::IngestService;
use reelhouse::server::{create_router, AppContext};
use reelhouse::storage::StorageLayout;
use reelhouse::thumbnail::{
    ExtractError, FrameExtractor, ThumbnailJob, ThumbnailSettings, ThumbnailWorkerPool,
};

/// Extractor that produces a decodable frame without invoking ffmpeg.
pub struct StubExtractor;

impl FrameExtractor for StubExtractor {
    fn extract_frame(
        &self,
        _source: &Path,
        _timestamp_secs: f64,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        let mut img = image::RgbImage::new(64, 48);
        for pixel in img.pixels_mut() {
            *pixel = image::Rgb([10, 180, 90]);
        }
        img.save_with_format(dest, image::ImageFormat::Png)
            .expect("stub frame write failed");
        Ok(())
    }
}

/// Extractor that always reports a tool failure.
pub struct FailingExtractor;

impl FrameExtractor for FailingExtractor {
    fn extract_frame(
        &self,
        _source: &Path,
        _timestamp_secs: f64,
        _dest: &Path,
    ) -> Result<(), ExtractError> {
        Err(ExtractError::Failed {
            status: "exit status: 1".into(),
            stderr: "simulated extraction failure".into(),
        })
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by a
/// temporary storage root.
pub struct TestHarness {
    pub ctx: AppContext,
    pub dir: tempfile::TempDir,
}

impl TestHarness {
    fn fast_config() -> Config {
        let mut config = Config::default();
        config.thumbnails.retry_backoff_ms = 1;
        config
    }

    /// Build the full stack with the given config, extractor, and storage
    /// root directory.
    pub fn build(
        mut config: Config,
        extractor: Arc<dyn FrameExtractor>,
        dir: tempfile::TempDir,
    ) -> Self {
        config.storage.root_dir = dir.path().to_path_buf();

        let storage =
            Arc::new(StorageLayout::open(&config.storage.root_dir).expect("storage open failed"));
        let (catalog, pending) = Catalog::rebuild(&storage).expect("catalog rebuild failed");
        let catalog = Arc::new(catalog);

        let (job_tx, job_rx) = tokio::sync::mpsc::channel(64);
        let _pool = ThumbnailWorkerPool::start(
            ThumbnailSettings::from(&config.thumbnails),
            Arc::clone(&catalog),
            Arc::clone(&storage),
            extractor,
            job_rx,
        );

        for asset_id in pending {
            job_tx
                .try_send(ThumbnailJob { asset_id })
                .expect("startup re-enqueue failed");
        }

        let ingest = Arc::new(IngestService::new(
            Arc::clone(&storage),
            Arc::clone(&catalog),
            job_tx,
            config.ingest.max_upload_bytes,
        ));

        let ctx = AppContext {
            config: Arc::new(config),
            catalog,
            storage,
            ingest,
        };

        Self { ctx, dir }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Self::fast_config()).await
    }

    /// Start a server with a custom config (storage root is overridden to a
    /// fresh tempdir).
    pub async fn with_server_config(config: Config) -> (Self, SocketAddr) {
        let dir = tempfile::tempdir().expect("tempdir failed");
        Self::serve(Self::build(config, Arc::new(StubExtractor), dir)).await
    }

    /// Start a server whose worker pool uses the given extractor.
    pub async fn with_server_extractor(
        extractor: Arc<dyn FrameExtractor>,
    ) -> (Self, SocketAddr) {
        let dir = tempfile::tempdir().expect("tempdir failed");
        Self::serve(Self::build(Self::fast_config(), extractor, dir)).await
    }

    /// Start a server over an existing storage root (for rebuild tests).
    pub async fn with_server_in_dir(dir: tempfile::TempDir) -> (Self, SocketAddr) {
        Self::serve(Self::build(Self::fast_config(), Arc::new(StubExtractor), dir)).await
    }

    async fn serve(harness: Self) -> (Self, SocketAddr) {
        let app = create_router(harness.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }
}

/// Upload `data` as a multipart `video` field named `file_name`; returns the
/// raw response.
pub async fn upload(
    addr: SocketAddr,
    file_name: &str,
    data: Vec<u8>,
) -> reqwest::Response {
    let part = reqwest::multipart::Part::bytes(data).file_name(file_name.to_string());
    // Send names verbatim; percent-encoding would mask what the server's own
    // sanitization does.
    let form = reqwest::multipart::Form::new()
        .percent_encode_noop()
        .part("video", part);
    reqwest::Client::new()
        .post(format!("http://{addr}/videos"))
        .multipart(form)
        .send()
        .await
        .expect("upload request failed")
}

/// Upload and expect 201, returning the new asset id.
pub async fn upload_ok(addr: SocketAddr, file_name: &str, data: Vec<u8>) -> String {
    let resp = upload(addr, file_name, data).await;
    assert_eq!(resp.status(), 201, "upload was not accepted");
    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_str().expect("missing id").to_string()
}

/// Poll the listing until the asset reaches `status` (or panic after ~5s).
pub async fn wait_for_status(addr: SocketAddr, id: &str, status: &str) {
    for _ in 0..250 {
        let listing: serde_json::Value = reqwest::get(format!("http://{addr}/videos"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        if listing
            .as_array()
            .unwrap()
            .iter()
            .any(|v| v["id"] == id && v["status"] == status)
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("asset {id} never reached status {status}");
}

/// Patterned test payload so byte-range comparisons catch off-by-one slices.
pub fn patterned_bytes(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}
