//! Path utilities for detecting file types by extension and mapping video
//! containers to MIME types.
//!
//! The extension allow-list is the single source of truth for what the
//! ingestion service accepts; content sniffing is deliberately not used.

use std::path::Path;

/// List of accepted video container extensions.
const VIDEO_EXTENSIONS: &[&str] = &[
    "mkv", "mp4", "avi", "m4v", "ts", "webm", "mov", "wmv", "flv",
];

/// Check if an extension (without dot) is an accepted video container.
///
/// # Examples
///
/// ```
/// use reelhouse_common::paths::is_video_extension;
///
/// assert!(is_video_extension("mp4"));
/// assert!(is_video_extension("MKV"));
/// assert!(!is_video_extension("txt"));
/// ```
pub fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// Check if a path has a video file extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use reelhouse_common::paths::is_video_file;
///
/// assert!(is_video_file(Path::new("clip.mp4")));
/// assert!(!is_video_file(Path::new("notes.txt")));
/// ```
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(is_video_extension)
        .unwrap_or(false)
}

/// Get the list of accepted video container extensions.
#[must_use]
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Map a video container extension to its MIME type.
///
/// # Examples
///
/// ```
/// use reelhouse_common::paths::content_type_for_extension;
///
/// assert_eq!(content_type_for_extension("mp4"), "video/mp4");
/// assert_eq!(content_type_for_extension("xyz"), "application/octet-stream");
/// ```
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "ts" => "video/mp2t",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_extension() {
        assert!(is_video_extension("mkv"));
        assert!(is_video_extension("mp4"));
        assert!(is_video_extension("webm"));

        // Case insensitive
        assert!(is_video_extension("MP4"));
        assert!(is_video_extension("Mkv"));

        // Not video extensions
        assert!(!is_video_extension("srt"));
        assert!(!is_video_extension("jpg"));
        assert!(!is_video_extension(""));
    }

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("movie.mkv")));
        assert!(is_video_file(Path::new("/path/to/clip.mp4")));
        assert!(is_video_file(Path::new("clip.1080p.webm")));

        assert!(!is_video_file(Path::new("subtitle.srt")));
        assert!(!is_video_file(Path::new("no_extension")));
        assert!(!is_video_file(Path::new("")));
    }

    #[test]
    fn test_video_extensions() {
        let exts = video_extensions();
        assert_eq!(exts.len(), 9);
        assert!(exts.contains(&"mp4"));
        assert!(exts.contains(&"mkv"));
    }

    #[test]
    fn test_content_type_for_extension() {
        assert_eq!(content_type_for_extension("mp4"), "video/mp4");
        assert_eq!(content_type_for_extension("m4v"), "video/mp4");
        assert_eq!(content_type_for_extension("mkv"), "video/x-matroska");
        assert_eq!(content_type_for_extension("avi"), "video/x-msvideo");
        assert_eq!(content_type_for_extension("ts"), "video/mp2t");
        assert_eq!(content_type_for_extension("mov"), "video/quicktime");
        assert_eq!(content_type_for_extension("wmv"), "video/x-ms-wmv");
        assert_eq!(content_type_for_extension("flv"), "video/x-flv");
        assert_eq!(
            content_type_for_extension("unknown"),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_content_type_case_insensitive() {
        assert_eq!(content_type_for_extension("MP4"), "video/mp4");
        assert_eq!(content_type_for_extension("WebM"), "video/webm");
    }
}
