//! Range-aware streaming of video content.
//!
//! The response is a pure function of `(id, Range header, current file
//! size)`: the same inputs always yield the same status, headers, and bytes.
//! Ranges are validated strictly; an unsatisfiable or malformed range yields
//! 416 with `Content-Range: bytes */<size>` rather than silently falling back
//! to a full response, because that fallback breaks seeking for clients that
//! depend on partial content.

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::server::error::AppError;
use crate::server::{parse_asset_id, AppContext};

const STREAM_CHUNK_SIZE: usize = 64 * 1024;

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let bytes_prefix = value.strip_prefix("bytes=")?;
    let mut parts = bytes_prefix.splitn(2, '-');
    let start_str = parts.next()?.trim();
    let end_str = parts.next()?.trim();

    let start: u64 = start_str.parse().ok()?;
    let end: Option<u64> = if end_str.is_empty() {
        None
    } else {
        Some(end_str.parse().ok()?)
    };

    Some((start, end))
}

/// What a request's Range header means against the current file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOutcome {
    /// No Range header: serve the whole file.
    Full,
    /// Valid inclusive byte interval.
    Partial(u64, u64),
    /// Malformed or out-of-bounds: 416.
    Unsatisfiable,
}

/// Strict range evaluation: `end` defaults to `file_size - 1`, and any range
/// with `start > end` or `end >= file_size` is unsatisfiable. Out-of-bounds
/// ends are never clamped.
pub fn evaluate_range(range_header: Option<&str>, file_size: u64) -> RangeOutcome {
    let Some(raw) = range_header else {
        return RangeOutcome::Full;
    };

    let Some((start, end_opt)) = parse_range_header(raw) else {
        return RangeOutcome::Unsatisfiable;
    };

    if file_size == 0 {
        return RangeOutcome::Unsatisfiable;
    }

    let end = end_opt.unwrap_or(file_size - 1);
    if start > end || end >= file_size {
        return RangeOutcome::Unsatisfiable;
    }

    RangeOutcome::Partial(start, end)
}

/// GET /videos/{id}/content
///
/// Serves the asset's bytes with HTTP range support. The catalog is the only
/// id resolver and the storage layout the only path constructor, so no
/// client-supplied string ever reaches the filesystem.
pub async fn video_content(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let id = parse_asset_id(&id)?;
    let asset = ctx.catalog.get(id)?;
    let file_path = ctx.storage.resolve(&asset);

    let range_header = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    Ok(serve_file_streaming(
        &file_path,
        asset.content_type(),
        range_header.as_deref(),
    )
    .await?)
}

/// Serve a file using chunked streaming via `ReaderStream`.
///
/// Reads happen in 64KB chunks so memory stays bounded regardless of file
/// size, and the file handle is dropped with the body stream when the
/// response completes or the client disconnects.
pub async fn serve_file_streaming(
    file_path: &std::path::Path,
    content_type: &str,
    range_header: Option<&str>,
) -> Result<Response, reelhouse_common::Error> {
    let metadata = tokio::fs::metadata(file_path)
        .await
        .map_err(|_| reelhouse_common::Error::not_found(file_path.display().to_string()))?;
    let file_size = metadata.len();

    match evaluate_range(range_header, file_size) {
        RangeOutcome::Unsatisfiable => Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(
                header::CONTENT_RANGE.as_str(),
                format!("bytes */{file_size}"),
            )],
            Body::empty(),
        )
            .into_response()),
        RangeOutcome::Partial(start, end) => {
            let length = end - start + 1;

            let mut file = tokio::fs::File::open(file_path).await.map_err(|_| {
                reelhouse_common::Error::not_found(file_path.display().to_string())
            })?;
            file.seek(std::io::SeekFrom::Start(start))
                .await
                .map_err(|e| {
                    reelhouse_common::Error::internal(format!("Seek failed: {e}"))
                })?;

            // Wrap in a Take to limit reads to exactly `length` bytes.
            let limited = file.take(length);
            let stream = ReaderStream::with_capacity(limited, STREAM_CHUNK_SIZE);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::PARTIAL_CONTENT,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (
                        header::CONTENT_RANGE.as_str(),
                        format!("bytes {start}-{end}/{file_size}"),
                    ),
                    (header::CONTENT_LENGTH.as_str(), length.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
        RangeOutcome::Full => {
            let file = tokio::fs::File::open(file_path).await.map_err(|_| {
                reelhouse_common::Error::not_found(file_path.display().to_string())
            })?;

            let stream = ReaderStream::with_capacity(file, STREAM_CHUNK_SIZE);
            let body = Body::from_stream(stream);

            Ok((
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE.as_str(), content_type.to_string()),
                    (header::CONTENT_LENGTH.as_str(), file_size.to_string()),
                    (header::ACCEPT_RANGES.as_str(), "bytes".to_string()),
                ],
                body,
            )
                .into_response())
        }
    }
}
