//! Integration tests for the asset lifecycle: thumbnail processing, failure
//! surfacing, deletion, and catalog rebuild across restarts.

mod common;

use std::sync::Arc;

use common::{patterned_bytes, upload_ok, wait_for_status, FailingExtractor, TestHarness};

#[tokio::test]
async fn asset_progresses_to_ready_and_serves_thumbnail() {
    let (_h, addr) = TestHarness::with_server().await;
    let id = upload_ok(addr, "clip.mp4", patterned_bytes(1024)).await;

    wait_for_status(addr, &id, "ready").await;

    let listing: serde_json::Value = reqwest::get(format!("http://{addr}/videos"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entry = listing
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["id"] == id.as_str())
        .unwrap()
        .clone();
    assert_eq!(
        entry["thumbnail_url"].as_str().unwrap(),
        format!("/videos/{id}/thumbnail")
    );

    let resp = reqwest::get(format!("http://{addr}/videos/{id}/thumbnail"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers().get("content-type").unwrap().to_str().unwrap(),
        "image/jpeg"
    );
    let bytes = resp.bytes().await.unwrap();
    assert!(image::load_from_memory(&bytes).is_ok());
}

#[tokio::test]
async fn thumbnail_missing_while_processing_or_unknown_is_404() {
    let (_h, addr) = TestHarness::with_server_extractor(Arc::new(FailingExtractor)).await;

    // Unknown asset.
    let resp = reqwest::get(format!(
        "http://{addr}/videos/00000000-0000-0000-0000-000000000001/thumbnail"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 404);

    // Known asset whose thumbnail never gets produced.
    let id = upload_ok(addr, "clip.mp4", patterned_bytes(512)).await;
    wait_for_status(addr, &id, "failed").await;
    let resp = reqwest::get(format!("http://{addr}/videos/{id}/thumbnail"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn exhausted_retries_surface_failed_status_with_reason() {
    let (h, addr) = TestHarness::with_server_extractor(Arc::new(FailingExtractor)).await;
    let id = upload_ok(addr, "clip.mp4", patterned_bytes(512)).await;

    wait_for_status(addr, &id, "failed").await;

    let asset = h.ctx.catalog.get(id.parse().unwrap()).unwrap();
    let reason = asset.failure_reason.expect("failure reason must be set");
    assert!(!reason.is_empty());
}

#[tokio::test]
async fn failed_thumbnail_does_not_block_streaming() {
    let (_h, addr) = TestHarness::with_server_extractor(Arc::new(FailingExtractor)).await;
    let data = patterned_bytes(800);
    let id = upload_ok(addr, "clip.mp4", data.clone()).await;

    wait_for_status(addr, &id, "failed").await;

    // The asset is still listed and its bytes still stream.
    let resp = reqwest::get(format!("http://{addr}/videos/{id}/content"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), data.as_slice());
}

#[tokio::test]
async fn delete_revokes_streaming_and_removes_files() {
    let (h, addr) = TestHarness::with_server().await;
    let id = upload_ok(addr, "clip.mp4", patterned_bytes(1024)).await;
    wait_for_status(addr, &id, "ready").await;

    let client = reqwest::Client::new();
    let resp = client
        .delete(format!("http://{addr}/videos/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    // No new stream may start.
    let resp = reqwest::get(format!("http://{addr}/videos/{id}/content"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Listing no longer shows it and the files are gone.
    let listing: serde_json::Value = reqwest::get(format!("http://{addr}/videos"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.as_array().unwrap().is_empty());
    assert_eq!(
        std::fs::read_dir(h.dir.path().join("videos")).unwrap().count(),
        0
    );
    assert_eq!(
        std::fs::read_dir(h.dir.path().join("thumbnails"))
            .unwrap()
            .count(),
        0
    );
}

#[tokio::test]
async fn delete_unknown_asset_is_404() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();
    let resp = client
        .delete(format!(
            "http://{addr}/videos/00000000-0000-0000-0000-000000000001"
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn ready_only_listing_hides_unfinished_assets() {
    let mut config = reelhouse::config::Config::default();
    config.thumbnails.retry_backoff_ms = 1;
    config.server.list_ready_only = true;
    let (_h, addr) = TestHarness::with_server_config(config).await;

    let id = upload_ok(addr, "clip.mp4", patterned_bytes(256)).await;
    wait_for_status(addr, &id, "ready").await;

    let listing: serde_json::Value = reqwest::get(format!("http://{addr}/videos"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let entries = listing.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["status"], "ready");
}

#[tokio::test]
async fn restart_rebuilds_catalog_from_disk() {
    // Seed a storage root by hand: one file with a thumbnail, one without.
    let dir = tempfile::tempdir().unwrap();
    let storage = reelhouse::storage::StorageLayout::open(dir.path()).unwrap();

    let (ready_id, ready_path) = storage.allocate("mp4");
    std::fs::write(&ready_path, patterned_bytes(600)).unwrap();
    let mut thumb = image::RgbImage::new(8, 8);
    for pixel in thumb.pixels_mut() {
        *pixel = image::Rgb([1, 2, 3]);
    }
    thumb
        .save_with_format(storage.thumbnail_path_for(ready_id), image::ImageFormat::Jpeg)
        .unwrap();

    let (pending_id, pending_path) = storage.allocate("mkv");
    std::fs::write(&pending_path, patterned_bytes(300)).unwrap();

    // Boot the server over the pre-existing root.
    let (_h, addr) = TestHarness::with_server_in_dir(dir).await;

    let ready = ready_id.to_string();
    let pending = pending_id.to_string();
    wait_for_status(addr, &ready, "ready").await;
    // The thumbnail-less file is adopted and processed by the stub pool.
    wait_for_status(addr, &pending, "ready").await;

    // Both stream with their real sizes.
    let resp = reqwest::get(format!("http://{addr}/videos/{ready}/content"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().len(), 600);

    let resp = reqwest::get(format!("http://{addr}/videos/{pending}/content"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().len(), 300);
}

#[tokio::test]
async fn health_endpoint_responds() {
    let (_h, addr) = TestHarness::with_server().await;
    let resp = reqwest::get(format!("http://{addr}/health")).await.unwrap();
    assert_eq!(resp.status(), 200);
}
