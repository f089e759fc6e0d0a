//! Shared constants.

/// The only content type accepted on the video upload path unless overridden by configuration.
pub const VIDEO_MP4: &str = "video/mp4";

/// Infix inserted before the extension of a remuxed sibling file.
pub const PROCESSING_INFIX: &str = "processing";

/// Number of random bytes behind every storage key (128 bits).
pub const STORAGE_KEY_RANDOM_BYTES: usize = 16;

/// Default upstream bound on an upload body (1 GiB).
pub const DEFAULT_MAX_VIDEO_SIZE_MB: usize = 1024;

/// Default deadline for a single pipeline run.
pub const DEFAULT_PIPELINE_TIMEOUT_SECS: u64 = 600;
