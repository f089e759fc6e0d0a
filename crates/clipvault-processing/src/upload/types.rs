//! Types for the upload pipeline.

use clipvault_core::Config;
use std::path::PathBuf;
use std::pin::Pin;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Request body of unknown, finite length.
pub type UploadBody = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// One video upload, as handed over by the transport layer.
pub struct UploadRequest {
    /// Declared media type, possibly with parameters (`video/mp4; codecs="avc1"`).
    pub media_type: Option<String>,
    pub body: UploadBody,
    pub user_id: Uuid,
    pub video_id: Uuid,
}

/// Pipeline knobs taken from configuration.
#[derive(Clone, Debug, Default)]
pub struct PipelineSettings {
    /// Parent for per-run spool directories; the system temp dir when unset.
    pub spool_dir: Option<PathBuf>,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            spool_dir: config.spool_dir.clone(),
        }
    }
}
