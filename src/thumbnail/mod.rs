//! Asynchronous thumbnail generation: the extractor seam over ffmpeg and the
//! bounded worker pool that drives it.

mod extractor;
mod worker;

pub use extractor::{check_tools, ExtractError, FfmpegExtractor, FrameExtractor, ToolStatus};
pub use worker::{ThumbnailJob, ThumbnailSettings, ThumbnailWorkerPool};
