//! Catalog-facing route handlers: upload, listing, thumbnails, deletion.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use reelhouse_common::{AssetId, AssetStatus};
use serde::Serialize;

use crate::catalog::VideoAsset;
use crate::server::error::AppError;
use crate::server::{parse_asset_id, AppContext};

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: AssetId,
    pub original_name: String,
}

#[derive(Debug, Serialize)]
pub struct VideoSummary {
    pub id: AssetId,
    pub original_name: String,
    pub size_bytes: u64,
    pub status: AssetStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl From<VideoAsset> for VideoSummary {
    fn from(asset: VideoAsset) -> Self {
        let thumbnail_url = asset
            .thumbnail_path
            .is_some()
            .then(|| format!("/videos/{}/thumbnail", asset.id));
        Self {
            id: asset.id,
            original_name: asset.original_name,
            size_bytes: asset.size_bytes,
            status: asset.status,
            thumbnail_url,
        }
    }
}

/// POST /videos
///
/// Multipart upload with the file in a field named `video`. Responds 201
/// with the new id once the bytes are durably stored and the asset is
/// registered; the thumbnail is generated asynchronously afterwards.
pub async fn upload_video(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let declared_size = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    let (id, original_name) = ctx.ingest.ingest(multipart, declared_size).await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse { id, original_name }),
    )
        .into_response())
}

/// GET /videos
///
/// Ordered listing from the catalog snapshot; never re-scans the filesystem.
/// All statuses are included unless the server is configured ready-only.
pub async fn list_videos(State(ctx): State<AppContext>) -> Json<Vec<VideoSummary>> {
    let ready_only = ctx.config.server.list_ready_only;
    let videos = ctx
        .catalog
        .list()
        .into_iter()
        .filter(|a| !ready_only || a.status == AssetStatus::Ready)
        .map(VideoSummary::from)
        .collect();
    Json(videos)
}

/// GET /videos/{id}/thumbnail
///
/// 200 with JPEG bytes when a thumbnail exists; 404 for unknown assets and
/// for assets whose thumbnail was not (yet or ever) produced.
pub async fn get_thumbnail(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    let id = parse_asset_id(&id)?;
    let asset = ctx.catalog.get(id)?;

    let thumb_path = asset
        .thumbnail_path
        .ok_or_else(|| reelhouse_common::Error::not_found(format!("thumbnail for {id}")))?;

    let bytes = tokio::fs::read(&thumb_path)
        .await
        .map_err(|_| reelhouse_common::Error::not_found(format!("thumbnail for {id}")))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE.as_str(), "image/jpeg")],
        bytes,
    )
        .into_response())
}

/// DELETE /videos/{id}
///
/// Removes the catalog entry first, so no new stream can start, then unlinks
/// the files. A request already streaming the file may finish.
pub async fn delete_video(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = parse_asset_id(&id)?;
    let removed = ctx.catalog.delete(id)?;

    let storage = ctx.storage.clone();
    tokio::task::spawn_blocking(move || storage.remove_asset_files(&removed))
        .await
        .map_err(|e| reelhouse_common::Error::internal(format!("Cleanup join error: {e}")))?;

    tracing::info!(asset_id = %id, "Asset deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn summary_includes_thumbnail_url_only_when_present() {
        let mut asset = VideoAsset::new(
            AssetId::new(),
            "clip.mp4".into(),
            PathBuf::from("videos/x.mp4"),
            10,
        );
        let summary = VideoSummary::from(asset.clone());
        assert!(summary.thumbnail_url.is_none());

        asset.thumbnail_path = Some(PathBuf::from("thumbnails/x.jpg"));
        let summary = VideoSummary::from(asset.clone());
        assert_eq!(
            summary.thumbnail_url,
            Some(format!("/videos/{}/thumbnail", asset.id))
        );
    }

    #[test]
    fn summary_serializes_status_lowercase() {
        let asset = VideoAsset::new(
            AssetId::new(),
            "clip.mp4".into(),
            PathBuf::from("videos/x.mp4"),
            10,
        );
        let json = serde_json::to_value(VideoSummary::from(asset)).unwrap();
        assert_eq!(json["status"], "uploading");
        assert!(json.get("thumbnail_url").is_none());
    }
}
