use crate::catalog::Catalog;
use crate::config::Config;
use crate::ingest::IngestService;
use crate::storage::StorageLayout;
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::{
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use reelhouse_common::AssetId;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod routes_stream;
pub mod routes_videos;

/// Shared application context
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub catalog: Arc<Catalog>,
    pub storage: Arc<StorageLayout>,
    pub ingest: Arc<IngestService>,
}

/// Parse a path segment as an asset id. An unparseable id names nothing, so
/// it maps to the same 404 as an unknown one.
pub(crate) fn parse_asset_id(raw: &str) -> reelhouse_common::Result<AssetId> {
    raw.parse()
        .map_err(|_| reelhouse_common::Error::not_found(raw.to_string()))
}

/// Create the Axum router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::RANGE]);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Catalog and ingestion
        .route("/videos", post(routes_videos::upload_video))
        .route("/videos", get(routes_videos::list_videos))
        .route("/videos/{id}", delete(routes_videos::delete_video))
        .route("/videos/{id}/thumbnail", get(routes_videos::get_thumbnail))
        // Range streaming
        .route("/videos/{id}/content", get(routes_stream::video_content))
        // Uploads enforce their own incremental size ceiling, so axum's
        // default 2MB body cap must not get there first.
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

/// Bind the configured address and serve until shutdown is signalled.
pub async fn start_server(config: &Config, ctx: AppContext) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Starting server on {}", addr);

    serve(ctx, listener, shutdown_signal()).await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Serve on an already-bound listener. Split out so tests can run the full
/// stack on an ephemeral port.
pub async fn serve(
    ctx: AppContext,
    listener: TcpListener,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let app = create_router(ctx);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => {}
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
