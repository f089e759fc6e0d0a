use crate::probe::ClassifyError;
use crate::remux::TranscodeError;
use clipvault_core::AppError;
use clipvault_storage::{KeyError, StorageError};
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;
use uuid::Uuid;

/// Where an upload run is, or where it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    Spooling,
    Classifying,
    Transcoding,
    KeyDerivation,
    Uploading,
    MetadataCommit,
    Done,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Validating => "validating",
            PipelineStage::Spooling => "spooling",
            PipelineStage::Classifying => "classifying",
            PipelineStage::Transcoding => "transcoding",
            PipelineStage::KeyDerivation => "key_derivation",
            PipelineStage::Uploading => "uploading",
            PipelineStage::MetadataCommit => "metadata_commit",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        }
    }
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Coarse failure taxonomy, used to pick a response and decide whether a retry makes sense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Resource,
    ExternalTool,
    Transfer,
    Metadata,
    Authorization,
    Cancelled,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("media type is missing")]
    MissingMediaType,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("failed to spool upload: {0}")]
    Spool(#[source] std::io::Error),

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    #[error("failed to derive storage key: {0}")]
    KeyDerivation(#[from] KeyError),

    #[error("failed to open remuxed file: {0}")]
    UploadSource(#[source] std::io::Error),

    #[error("upload to object store failed: {0}")]
    Upload(#[source] StorageError),

    #[error("video {0} not found")]
    VideoNotFound(Uuid),

    #[error("user {user_id} does not own video {video_id}")]
    Unauthorized { video_id: Uuid, user_id: Uuid },

    #[error("metadata update failed: {0}")]
    Metadata(#[source] AppError),

    #[error("upload cancelled during {0}")]
    Cancelled(PipelineStage),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::MissingMediaType | PipelineError::UnsupportedMediaType(_) => {
                ErrorKind::Precondition
            }
            PipelineError::Spool(_)
            | PipelineError::KeyDerivation(_)
            | PipelineError::UploadSource(_) => ErrorKind::Resource,
            PipelineError::Classify(_) | PipelineError::Transcode(_) => ErrorKind::ExternalTool,
            PipelineError::Upload(_) => ErrorKind::Transfer,
            PipelineError::VideoNotFound(_) | PipelineError::Metadata(_) => ErrorKind::Metadata,
            PipelineError::Unauthorized { .. } => ErrorKind::Authorization,
            PipelineError::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// The stage that was running when the error occurred.
    pub fn stage(&self) -> PipelineStage {
        match self {
            PipelineError::MissingMediaType | PipelineError::UnsupportedMediaType(_) => {
                PipelineStage::Validating
            }
            PipelineError::Spool(_) => PipelineStage::Spooling,
            PipelineError::Classify(_) => PipelineStage::Classifying,
            PipelineError::Transcode(_) => PipelineStage::Transcoding,
            PipelineError::KeyDerivation(_) => PipelineStage::KeyDerivation,
            PipelineError::UploadSource(_) | PipelineError::Upload(_) => PipelineStage::Uploading,
            PipelineError::VideoNotFound(_)
            | PipelineError::Unauthorized { .. }
            | PipelineError::Metadata(_) => PipelineStage::MetadataCommit,
            PipelineError::Cancelled(stage) => *stage,
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::MissingMediaType => {
                AppError::InvalidInput("Missing Content-Type for video".to_string())
            }
            PipelineError::UnsupportedMediaType(media_type) => AppError::UnsupportedMediaType(
                format!("Content type {} is not allowed for videos", media_type),
            ),
            PipelineError::Metadata(inner) => inner,
            PipelineError::VideoNotFound(id) => {
                AppError::NotFound(format!("Couldn't find video {}", id))
            }
            PipelineError::Unauthorized { .. } => {
                AppError::Unauthorized("You are not the owner of this video".to_string())
            }
            PipelineError::Cancelled(_) => AppError::Cancelled(err.to_string()),
            PipelineError::Classify(_) | PipelineError::Transcode(_) => {
                AppError::MediaProcessing(err.to_string())
            }
            PipelineError::Upload(_) => AppError::Storage(err.to_string()),
            PipelineError::Spool(_)
            | PipelineError::KeyDerivation(_)
            | PipelineError::UploadSource(_) => AppError::Internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clipvault_core::ErrorMetadata;

    #[test]
    fn kinds_and_stages() {
        let err = PipelineError::UnsupportedMediaType("video/quicktime".to_string());
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(err.stage(), PipelineStage::Validating);

        let err = PipelineError::from(ClassifyError::NoStreamFound);
        assert_eq!(err.kind(), ErrorKind::ExternalTool);
        assert_eq!(err.stage(), PipelineStage::Classifying);

        let err = PipelineError::Upload(StorageError::UploadFailed("reset".to_string()));
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert_eq!(err.stage(), PipelineStage::Uploading);

        let err = PipelineError::Cancelled(PipelineStage::Transcoding);
        assert_eq!(err.kind(), ErrorKind::Cancelled);
        assert_eq!(err.stage(), PipelineStage::Transcoding);
    }

    #[test]
    fn maps_to_app_errors() {
        let app: AppError = PipelineError::MissingMediaType.into();
        assert_eq!(app.http_status_code(), 400);

        let app: AppError = PipelineError::UnsupportedMediaType("image/png".to_string()).into();
        assert_eq!(app.http_status_code(), 415);

        let app: AppError = PipelineError::Unauthorized {
            video_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        }
        .into();
        assert_eq!(app.error_code(), "UNAUTHORIZED");

        let app: AppError = PipelineError::VideoNotFound(Uuid::new_v4()).into();
        assert_eq!(app.http_status_code(), 404);

        let app: AppError =
            PipelineError::Upload(StorageError::UploadFailed("reset".to_string())).into();
        assert_eq!(app.error_code(), "STORAGE_ERROR");

        let app: AppError = PipelineError::Cancelled(PipelineStage::Uploading).into();
        assert_eq!(app.error_code(), "REQUEST_CANCELLED");
    }
}
