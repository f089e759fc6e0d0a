//! Fast-start remuxing: move the MP4 index ahead of the media data without re-encoding.

use async_trait::async_trait;
use clipvault_core::constants::PROCESSING_INFIX;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("ffmpeg failed: {0}")]
    TranscodeFailed(String),

    #[error("ffmpeg produced no output at {}", .0.display())]
    TranscodeProducedEmptyOutput(PathBuf),
}

/// Rewrites `input` into `output` with its metadata relocated to the front.
#[async_trait]
pub trait Remuxer: Send + Sync {
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), TranscodeError>;
}

/// Sibling path for the remuxed file: `clip.mp4` becomes `clip.processing.mp4`.
pub fn processing_path(input: &Path) -> PathBuf {
    let mut name: OsString = input
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_default();
    name.push(".");
    name.push(PROCESSING_INFIX);
    if let Some(ext) = input.extension() {
        name.push(".");
        name.push(ext);
    }

    input.with_file_name(name)
}

/// Runs the `ffmpeg` binary with stream copy.
#[derive(Debug, Clone)]
pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: impl Into<String>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, input: &Path, output: &Path) -> Result<(), TranscodeError> {
        let start = std::time::Instant::now();

        let result = Command::new(&self.ffmpeg_path)
            .arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(output)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                TranscodeError::TranscodeFailed(format!("failed to execute ffmpeg: {}", e))
            })?;

        if !result.status.success() {
            return Err(TranscodeError::TranscodeFailed(format!(
                "{}: {}",
                result.status,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            "Fast-start remux completed"
        );

        Ok(())
    }
}

/// Produces a fast-start copy of a video next to the original.
#[derive(Clone)]
pub struct FastStartTranscoder {
    remuxer: Arc<dyn Remuxer>,
}

impl FastStartTranscoder {
    pub fn new(remuxer: Arc<dyn Remuxer>) -> Self {
        Self { remuxer }
    }

    /// Returns the path of the new file; the caller owns its cleanup. The input is untouched.
    ///
    /// A tool that exits cleanly without writing anything is still an error, and any partial
    /// output is removed before an error is returned.
    pub async fn remux(&self, input: &Path) -> Result<PathBuf, TranscodeError> {
        let output = processing_path(input);

        let result = match self.remuxer.remux(input, &output).await {
            Ok(()) => match tokio::fs::metadata(&output).await {
                Ok(meta) if meta.len() > 0 => Ok(meta.len()),
                _ => Err(TranscodeError::TranscodeProducedEmptyOutput(output.clone())),
            },
            Err(e) => Err(e),
        };

        match result {
            Ok(size) => {
                tracing::debug!(output = %output.display(), size_bytes = size, "Remuxed output ready");
                Ok(output)
            }
            Err(e) => {
                if let Err(remove_err) = tokio::fs::remove_file(&output).await {
                    if remove_err.kind() != std::io::ErrorKind::NotFound {
                        tracing::warn!(
                            error = %remove_err,
                            path = %output.display(),
                            "Failed to remove partial remux output"
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn processing_path_inserts_infix() {
        assert_eq!(
            processing_path(Path::new("a/b/upload.mp4")),
            PathBuf::from("a/b/upload.processing.mp4")
        );
        assert_eq!(
            processing_path(Path::new("/tmp/upload")),
            PathBuf::from("/tmp/upload.processing")
        );
    }

    struct WritingRemuxer(&'static [u8]);

    #[async_trait]
    impl Remuxer for WritingRemuxer {
        async fn remux(&self, _input: &Path, output: &Path) -> Result<(), TranscodeError> {
            tokio::fs::write(output, self.0).await.unwrap();
            Ok(())
        }
    }

    struct CrashingRemuxer;

    #[async_trait]
    impl Remuxer for CrashingRemuxer {
        async fn remux(&self, _input: &Path, output: &Path) -> Result<(), TranscodeError> {
            tokio::fs::write(output, b"half a moov").await.unwrap();
            Err(TranscodeError::TranscodeFailed("exit status: 1".to_string()))
        }
    }

    #[tokio::test]
    async fn returns_sibling_output_and_keeps_input() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        std::fs::write(&input, b"mdat moov").unwrap();

        let transcoder = FastStartTranscoder::new(Arc::new(WritingRemuxer(b"moov mdat")));
        let output = transcoder.remux(&input).await.unwrap();

        assert_eq!(output, dir.path().join("upload.processing.mp4"));
        assert_eq!(std::fs::read(&output).unwrap(), b"moov mdat");
        assert_eq!(std::fs::read(&input).unwrap(), b"mdat moov");
    }

    #[tokio::test]
    async fn empty_output_is_an_error_and_removed() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        std::fs::write(&input, b"mdat moov").unwrap();

        let transcoder = FastStartTranscoder::new(Arc::new(WritingRemuxer(b"")));
        let err = transcoder.remux(&input).await.unwrap_err();

        assert!(matches!(err, TranscodeError::TranscodeProducedEmptyOutput(_)));
        assert!(!dir.path().join("upload.processing.mp4").exists());
    }

    #[tokio::test]
    async fn failed_remux_removes_partial_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        std::fs::write(&input, b"mdat moov").unwrap();

        let transcoder = FastStartTranscoder::new(Arc::new(CrashingRemuxer));
        let err = transcoder.remux(&input).await.unwrap_err();

        assert!(matches!(err, TranscodeError::TranscodeFailed(_)));
        assert!(!dir.path().join("upload.processing.mp4").exists());
        assert!(input.exists());
    }

    #[tokio::test]
    async fn missing_binary_is_transcode_failure() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("upload.mp4");
        std::fs::write(&input, b"mdat moov").unwrap();

        let transcoder =
            FastStartTranscoder::new(Arc::new(FfmpegRemuxer::new("/nonexistent/clipvault-ffmpeg")));
        let err = transcoder.remux(&input).await.unwrap_err();
        assert!(matches!(err, TranscodeError::TranscodeFailed(_)));
    }
}
