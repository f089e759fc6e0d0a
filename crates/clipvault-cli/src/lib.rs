use clipvault_core::{AppError, ErrorMetadata, LogLevel, Video};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Reject bodies above the configured upload limit before any processing starts.
pub fn ensure_within_limit(size_bytes: u64, max_bytes: u64) -> Result<(), AppError> {
    if size_bytes > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "{} bytes exceeds the {} MB limit",
            size_bytes,
            max_bytes / (1024 * 1024)
        )));
    }
    Ok(())
}

/// Gate applied before the pipeline runs: the record must exist and belong to the caller.
pub fn authorize_upload(
    video: Option<&Video>,
    video_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    match video {
        None => Err(AppError::NotFound(format!("Couldn't find video {}", video_id))),
        Some(video) if !video.is_owned_by(user_id) => Err(AppError::Unauthorized(
            "You are not the owner of this video".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

/// Failure report printed when a command fails.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Machine-readable error code
    pub code: String,
    pub recoverable: bool,
}

impl ErrorReport {
    /// Details and the error type are withheld in production and for sensitive errors.
    pub fn new(error: &AppError, is_production: bool) -> Self {
        let (details, error_type) = if is_production || error.is_sensitive() {
            (None, None)
        } else {
            (
                Some(error.detailed_message()),
                Some(error.error_type().to_string()),
            )
        };

        Self {
            error: error.client_message(),
            details,
            error_type,
            code: error.error_code().to_string(),
            recoverable: error.is_recoverable(),
        }
    }
}

pub fn log_error(error: &AppError) {
    let error_type = error.error_type();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Warn => {
            tracing::warn!(error = %error, error_type = error_type, "Command failed");
        }
        LogLevel::Error => {
            tracing::error!(error = %error, error_type = error_type, "Command failed");
        }
    }
}

pub fn is_production_env() -> bool {
    std::env::var("ENVIRONMENT")
        .or_else(|_| std::env::var("APP_ENV"))
        .map(|env| env.to_lowercase() == "production" || env.to_lowercase() == "prod")
        .unwrap_or(false)
}

/// Cancel `token` on Ctrl-C or once `deadline` elapses, whichever comes first.
pub fn spawn_cancel_triggers(token: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = token.cancelled() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, cancelling upload");
                token.cancel();
            }
            _ = tokio::time::sleep(deadline) => {
                tracing::warn!(timeout_secs = deadline.as_secs(), "Upload deadline reached, cancelling");
                token.cancel();
            }
        }
    });
}

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_limit_is_inclusive() {
        let max = 1024 * 1024 * 1024;
        assert!(ensure_within_limit(max, max).is_ok());
        let err = ensure_within_limit(max + 1, max).unwrap_err();
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert_eq!(err.http_status_code(), 413);
        assert!(err.client_message().contains("1024 MB"));
    }

    #[test]
    fn upload_requires_existing_owned_video() {
        let owner = Uuid::new_v4();
        let video = Video::new(owner, "clip");

        assert!(authorize_upload(Some(&video), video.id, owner).is_ok());
        let err = authorize_upload(Some(&video), video.id, Uuid::new_v4()).unwrap_err();
        assert_eq!(err.error_code(), "UNAUTHORIZED");
        let err = authorize_upload(None, video.id, owner).unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn report_hides_details_for_sensitive_errors() {
        let err = AppError::from(anyhow::anyhow!("bucket policy denied").context("upload failed"));
        let report = ErrorReport::new(&err, false);
        assert_eq!(report.code, "INTERNAL_ERROR");
        assert_eq!(report.error, "Internal server error");
        assert!(report.details.is_none());
        assert!(report.error_type.is_none());
    }

    #[test]
    fn report_includes_details_outside_production() {
        let err = AppError::PayloadTooLarge("2048 MB".to_string());

        let report = ErrorReport::new(&err, false);
        assert_eq!(report.error_type.as_deref(), Some("PayloadTooLarge"));
        assert_eq!(report.details.as_deref(), Some("File too large: 2048 MB"));
        assert!(!report.recoverable);

        let report = ErrorReport::new(&err, true);
        assert!(report.details.is_none());
        assert_eq!(report.code, "PAYLOAD_TOO_LARGE");
    }

    #[tokio::test]
    async fn deadline_cancels_token() {
        let token = CancellationToken::new();
        spawn_cancel_triggers(token.clone(), Duration::from_millis(20));

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .unwrap();
        assert!(token.is_cancelled());
    }
}
