//! Single-pass video upload.
//!
//! A run spools the request body to a private temporary directory, classifies and remuxes the
//! spooled file, uploads the remuxed copy under a freshly derived key and only then points the
//! owning record at the new object. Every exit path removes the temporary directory. Nothing is
//! retried.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use clipvault_core::constants::VIDEO_MP4;
use clipvault_core::{AspectCategory, Config, Video};
use clipvault_db::MetadataGateway;
use clipvault_storage::{extension_for, AssetKeyGenerator, Storage};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use super::error::{PipelineError, PipelineStage};
use super::types::{PipelineSettings, UploadBody, UploadRequest};
use crate::aspect::AspectClassifier;
use crate::probe::FfprobeProbe;
use crate::remux::{FastStartTranscoder, FfmpegRemuxer};

/// Reduce a declared media type to its lower-cased `type/subtype` essence.
///
/// Returns `None` when nothing but parameters or whitespace was declared.
pub fn media_type_essence(declared: &str) -> Option<String> {
    let essence = declared
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if essence.is_empty() {
        None
    } else {
        Some(essence)
    }
}

/// Run `fut` unless `token` fires first.
async fn guarded<T, F>(
    token: &CancellationToken,
    stage: PipelineStage,
    fut: F,
) -> Result<T, PipelineError>
where
    F: Future<Output = Result<T, PipelineError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(PipelineError::Cancelled(stage)),
        result = fut => result,
    }
}

#[derive(Clone)]
pub struct UploadPipeline {
    classifier: AspectClassifier,
    transcoder: FastStartTranscoder,
    keys: AssetKeyGenerator,
    storage: Arc<dyn Storage>,
    metadata: Arc<dyn MetadataGateway>,
    settings: PipelineSettings,
}

impl UploadPipeline {
    pub fn new(
        classifier: AspectClassifier,
        transcoder: FastStartTranscoder,
        keys: AssetKeyGenerator,
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn MetadataGateway>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier,
            transcoder,
            keys,
            storage,
            metadata,
            settings,
        }
    }

    /// Pipeline backed by the real `ffprobe`/`ffmpeg` binaries and the OS random source.
    pub fn from_config(
        config: &Config,
        storage: Arc<dyn Storage>,
        metadata: Arc<dyn MetadataGateway>,
    ) -> Self {
        Self::new(
            AspectClassifier::new(Arc::new(FfprobeProbe::new(config.ffprobe_path.clone()))),
            FastStartTranscoder::new(Arc::new(FfmpegRemuxer::new(config.ffmpeg_path.clone()))),
            AssetKeyGenerator::default(),
            storage,
            metadata,
            PipelineSettings::from_config(config),
        )
    }

    pub async fn run(&self, request: UploadRequest) -> Result<Video, PipelineError> {
        self.run_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run the pipeline, aborting whichever stage is in flight once `token` is cancelled.
    pub async fn run_with_cancel(
        &self,
        request: UploadRequest,
        token: &CancellationToken,
    ) -> Result<Video, PipelineError> {
        let span = tracing::info_span!(
            "video_upload",
            video_id = %request.video_id,
            user_id = %request.user_id,
        );

        async move {
            let start = Instant::now();
            let result = self.execute(request, token).await;

            match &result {
                Ok(video) => tracing::info!(
                    stage = %PipelineStage::Done,
                    video_url = video.video_url.as_deref().unwrap_or_default(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Video upload completed"
                ),
                Err(e) => tracing::warn!(
                    stage = %PipelineStage::Failed,
                    failed_stage = %e.stage(),
                    kind = ?e.kind(),
                    error = %e,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "Video upload failed"
                ),
            }

            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        request: UploadRequest,
        token: &CancellationToken,
    ) -> Result<Video, PipelineError> {
        let UploadRequest {
            media_type,
            mut body,
            user_id,
            video_id,
        } = request;

        // Validating: nothing is allocated until the media type is acceptable.
        let media_type = media_type
            .as_deref()
            .and_then(media_type_essence)
            .ok_or(PipelineError::MissingMediaType)?;
        if media_type != VIDEO_MP4 {
            return Err(PipelineError::UnsupportedMediaType(media_type));
        }

        if token.is_cancelled() {
            return Err(PipelineError::Cancelled(PipelineStage::Validating));
        }

        // Spooling
        let spool = self.create_spool_dir().map_err(PipelineError::Spool)?;
        let spooled = spool
            .path()
            .join(format!("upload.{}", extension_for(&media_type)));

        let result = self
            .process(&mut body, &spooled, &media_type, video_id, user_id, token)
            .await;

        let spool_path = spool.path().to_path_buf();
        if let Err(e) = spool.close() {
            tracing::warn!(
                error = %e,
                path = %spool_path.display(),
                "Failed to remove spool directory"
            );
        }

        result
    }

    async fn process(
        &self,
        body: &mut UploadBody,
        spooled: &Path,
        media_type: &str,
        video_id: Uuid,
        user_id: Uuid,
        token: &CancellationToken,
    ) -> Result<Video, PipelineError> {
        guarded(token, PipelineStage::Spooling, self.spool(body, spooled)).await?;

        let category = guarded(token, PipelineStage::Classifying, async {
            self.classifier
                .classify(spooled)
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        let remuxed = guarded(token, PipelineStage::Transcoding, async {
            self.transcoder
                .remux(spooled)
                .await
                .map_err(PipelineError::from)
        })
        .await?;

        let key = self.derive_key(media_type, category)?;

        guarded(
            token,
            PipelineStage::Uploading,
            self.upload(&remuxed, &key, media_type),
        )
        .await?;

        guarded(
            token,
            PipelineStage::MetadataCommit,
            self.commit(video_id, user_id, &key),
        )
        .await
    }

    async fn spool(&self, body: &mut UploadBody, path: &Path) -> Result<(), PipelineError> {
        let mut file = tokio::fs::File::create(path)
            .await
            .map_err(PipelineError::Spool)?;
        let size = tokio::io::copy(body, &mut file)
            .await
            .map_err(PipelineError::Spool)?;
        file.flush().await.map_err(PipelineError::Spool)?;

        tracing::debug!(
            stage = %PipelineStage::Spooling,
            size_bytes = size,
            "Upload spooled"
        );
        Ok(())
    }

    fn create_spool_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("clipvault-upload-");
        match &self.settings.spool_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)
            }
            None => builder.tempdir(),
        }
    }

    fn derive_key(
        &self,
        media_type: &str,
        category: AspectCategory,
    ) -> Result<String, PipelineError> {
        let key = self.keys.generate(media_type, Some(category.key_prefix()))?;
        tracing::debug!(
            stage = %PipelineStage::KeyDerivation,
            key = %key,
            category = %category,
            "Storage key derived"
        );
        Ok(key)
    }

    async fn upload(&self, path: &Path, key: &str, media_type: &str) -> Result<(), PipelineError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(PipelineError::UploadSource)?;

        self.storage
            .put(key, media_type, Box::pin(file))
            .await
            .map_err(PipelineError::Upload)?;

        tracing::debug!(
            stage = %PipelineStage::Uploading,
            key = %key,
            backend = %self.storage.backend_type(),
            "Remuxed video stored"
        );
        Ok(())
    }

    async fn commit(
        &self,
        video_id: Uuid,
        user_id: Uuid,
        key: &str,
    ) -> Result<Video, PipelineError> {
        let mut video = self
            .metadata
            .fetch(video_id)
            .await
            .map_err(PipelineError::Metadata)?
            .ok_or(PipelineError::VideoNotFound(video_id))?;

        if !self.metadata.is_owned_by(&video, user_id) {
            // The object is already stored; it stays orphaned.
            tracing::warn!(
                key = %key,
                owner_id = %video.user_id,
                "Ownership check failed after upload, stored object is orphaned"
            );
            return Err(PipelineError::Unauthorized { video_id, user_id });
        }

        video.set_video_url(self.storage.public_url(key));
        self.metadata
            .update(&video)
            .await
            .map_err(PipelineError::Metadata)?;

        Ok(video)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn essence_strips_parameters_and_case() {
        assert_eq!(
            media_type_essence("Video/MP4; codecs=\"avc1.42E01E\"").as_deref(),
            Some("video/mp4")
        );
        assert_eq!(media_type_essence("  video/mp4  ").as_deref(), Some("video/mp4"));
    }

    #[test]
    fn essence_of_blank_type_is_none() {
        assert_eq!(media_type_essence(""), None);
        assert_eq!(media_type_essence("   "), None);
        assert_eq!(media_type_essence("; charset=utf-8"), None);
    }
}
