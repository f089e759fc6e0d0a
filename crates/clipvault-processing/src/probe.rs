//! Stream geometry probing via `ffprobe`.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("ffprobe failed: {0}")]
    ProbeFailed(String),

    #[error("ffprobe output could not be interpreted: {0}")]
    ProbeOutputInvalid(String),

    #[error("no video stream found")]
    NoStreamFound,
}

/// Pixel dimensions of the first video stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamGeometry {
    pub width: u32,
    pub height: u32,
}

#[async_trait]
pub trait StreamProbe: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<StreamGeometry, ClassifyError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    // Some ffprobe builds omit the section entirely when nothing matched.
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Interpret ffprobe's JSON report. Only the first stream is consulted.
pub fn parse_probe_output(stdout: &[u8]) -> Result<StreamGeometry, ClassifyError> {
    let output: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ClassifyError::ProbeOutputInvalid(e.to_string()))?;

    let stream = output.streams.first().ok_or(ClassifyError::NoStreamFound)?;

    match (stream.width, stream.height) {
        (Some(width), Some(height)) if width > 0 && height > 0 => {
            Ok(StreamGeometry { width, height })
        }
        _ => Err(ClassifyError::ProbeOutputInvalid(
            "first stream has no usable width/height".to_string(),
        )),
    }
}

/// Runs the `ffprobe` binary.
#[derive(Debug, Clone)]
pub struct FfprobeProbe {
    ffprobe_path: String,
}

impl FfprobeProbe {
    pub fn new(ffprobe_path: impl Into<String>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }
}

impl Default for FfprobeProbe {
    fn default() -> Self {
        Self::new("ffprobe")
    }
}

#[async_trait]
impl StreamProbe for FfprobeProbe {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<StreamGeometry, ClassifyError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ClassifyError::ProbeFailed(format!("failed to execute ffprobe: {}", e)))?;

        if !output.status.success() {
            return Err(ClassifyError::ProbeFailed(format!(
                "{}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let geometry = parse_probe_output(&output.stdout)?;

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = geometry.width,
            height = geometry.height,
            "Video probe completed"
        );

        Ok(geometry)
    }
}
