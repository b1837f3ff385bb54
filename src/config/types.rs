use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub ingest: IngestConfig,

    #[serde(default)]
    pub thumbnails: ThumbnailConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// When set, GET /videos returns only assets whose thumbnail pipeline
    /// finished successfully instead of all known assets.
    #[serde(default)]
    pub list_ready_only: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            list_ready_only: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory holding originals, thumbnails, and the catalog index.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IngestConfig {
    /// Maximum accepted upload size in bytes, enforced incrementally while
    /// the body streams in.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

fn default_max_upload_bytes() -> u64 {
    2 * 1024 * 1024 * 1024 // 2 GiB
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ThumbnailConfig {
    /// Number of concurrent thumbnail workers.
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Timestamp of the frame to extract, in seconds from the start.
    #[serde(default = "default_timestamp_secs")]
    pub timestamp_secs: f64,

    /// Target thumbnail width in pixels (height keeps aspect ratio).
    #[serde(default = "default_width")]
    pub width: u32,

    /// Retries after the first failed extraction attempt.
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// Base delay between attempts, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_workers() -> usize {
    2
}
fn default_timestamp_secs() -> f64 {
    5.0
}
fn default_width() -> u32 {
    320
}
fn default_retry_limit() -> u32 {
    2
}
fn default_retry_backoff_ms() -> u64 {
    500
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            timestamp_secs: default_timestamp_secs(),
            width: default_width(),
            retry_limit: default_retry_limit(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}
