//! Frame extraction via the external ffmpeg tool.
//!
//! The extractor is a trait so the worker pool can be driven by a stub in
//! tests; the production implementation shells out to `ffmpeg` exactly once
//! per attempt.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Failure modes of a single extraction attempt.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The source file disappeared before the attempt. Not retryable.
    #[error("Source file missing: {0}")]
    MissingSource(PathBuf),

    /// The tool could not be spawned (not installed, I/O failure).
    #[error("Failed to execute ffmpeg: {0}")]
    Spawn(std::io::Error),

    /// The tool ran but reported failure.
    #[error("ffmpeg exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

impl ExtractError {
    /// Whether a retry could plausibly succeed. Spawn and tool-reported
    /// failures are treated as transient I/O; a vanished source is not.
    pub fn is_transient(&self) -> bool {
        !matches!(self, ExtractError::MissingSource(_))
    }
}

/// External frame-grab capability: read `source`, decode the frame nearest
/// `timestamp_secs`, write it as an image to `dest`.
pub trait FrameExtractor: Send + Sync {
    fn extract_frame(
        &self,
        source: &Path,
        timestamp_secs: f64,
        dest: &Path,
    ) -> Result<(), ExtractError>;
}

/// Production extractor backed by the `ffmpeg` binary.
#[derive(Debug, Default)]
pub struct FfmpegExtractor;

impl FrameExtractor for FfmpegExtractor {
    fn extract_frame(
        &self,
        source: &Path,
        timestamp_secs: f64,
        dest: &Path,
    ) -> Result<(), ExtractError> {
        if !source.exists() {
            return Err(ExtractError::MissingSource(source.to_path_buf()));
        }

        // Seek before the input for fast keyframe-based seeking; grab one
        // frame and let ffmpeg pick the output format from the extension.
        let output = Command::new("ffmpeg")
            .arg("-ss")
            .arg(format!("{timestamp_secs}"))
            .arg("-i")
            .arg(source)
            .arg("-frames:v")
            .arg("1")
            .arg("-y")
            .arg(dest)
            .output()
            .map_err(ExtractError::Spawn)?;

        if !output.status.success() {
            return Err(ExtractError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .last()
                    .unwrap_or("")
                    .to_string(),
            });
        }

        Ok(())
    }
}

/// Availability of an external tool.
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub available: bool,
    pub path: Option<PathBuf>,
}

/// Check the external tools the thumbnail pipeline depends on.
pub fn check_tools() -> Vec<ToolStatus> {
    let ffmpeg = which::which("ffmpeg").ok();
    vec![ToolStatus {
        name: "ffmpeg",
        available: ffmpeg.is_some(),
        path: ffmpeg,
    }]
}
