//! Configuration module
//!
//! Configuration is read from the process environment (after loading `.env`). Parsing goes
//! through [`Config::from_vars`] so it can be exercised without touching process-wide state.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{DEFAULT_MAX_VIDEO_SIZE_MB, DEFAULT_PIPELINE_TIMEOUT_SECS};
use crate::storage_types::StorageBackend;

/// Upload pipeline configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: Option<String>,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // S3-compatible providers (MinIO, etc.)
    pub s3_public_host: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    // Media processing configuration
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    /// Enforced by the caller before bytes reach the pipeline.
    pub max_video_size_bytes: u64,
    pub spool_dir: Option<PathBuf>,
    pub pipeline_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        let environment = non_empty("ENVIRONMENT")
            .or_else(|| non_empty("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let storage_backend = match non_empty("STORAGE_BACKEND") {
            Some(s) => s.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let max_video_size_mb = match non_empty("MAX_VIDEO_SIZE_MB") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("MAX_VIDEO_SIZE_MB must be a valid number"))?,
            None => DEFAULT_MAX_VIDEO_SIZE_MB as u64,
        };
        let max_video_size_bytes = max_video_size_mb
            .checked_mul(1024 * 1024)
            .ok_or_else(|| anyhow::anyhow!("MAX_VIDEO_SIZE_MB is too large"))?;

        let pipeline_timeout_secs = match non_empty("PIPELINE_TIMEOUT_SECS") {
            Some(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| anyhow::anyhow!("PIPELINE_TIMEOUT_SECS must be a valid number"))?,
            None => DEFAULT_PIPELINE_TIMEOUT_SECS,
        };

        let config = Config {
            environment,
            database_url: non_empty("DATABASE_URL"),
            storage_backend,
            s3_bucket: non_empty("S3_BUCKET"),
            s3_region: non_empty("S3_REGION").or_else(|| non_empty("AWS_REGION")),
            s3_endpoint: non_empty("S3_ENDPOINT"),
            s3_public_host: non_empty("S3_PUBLIC_HOST"),
            local_storage_path: non_empty("LOCAL_STORAGE_PATH"),
            local_storage_base_url: non_empty("LOCAL_STORAGE_BASE_URL"),
            ffmpeg_path: non_empty("FFMPEG_PATH").unwrap_or_else(|| "ffmpeg".to_string()),
            ffprobe_path: non_empty("FFPROBE_PATH").unwrap_or_else(|| "ffprobe".to_string()),
            max_video_size_bytes,
            spool_dir: non_empty("SPOOL_DIR").map(PathBuf::from),
            pipeline_timeout_secs,
        };

        config.validate()?;
        Ok(config)
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn pipeline_timeout(&self) -> Duration {
        Duration::from_secs(self.pipeline_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.pipeline_timeout_secs == 0 {
            return Err(anyhow::anyhow!("PIPELINE_TIMEOUT_SECS must be greater than zero"));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
        }

        if let Some(url) = &self.database_url {
            if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
                return Err(anyhow::anyhow!(
                    "DATABASE_URL must be a valid PostgreSQL connection string"
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, anyhow::Error> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_for_s3() {
        let config = config_from(&[("S3_BUCKET", "clips"), ("AWS_REGION", "us-east-1")]).unwrap();
        assert_eq!(config.storage_backend, StorageBackend::S3);
        assert_eq!(config.s3_region.as_deref(), Some("us-east-1"));
        assert_eq!(config.max_video_size_bytes, 1 << 30);
        assert_eq!(config.ffmpeg_path, "ffmpeg");
        assert_eq!(config.ffprobe_path, "ffprobe");
        assert_eq!(config.pipeline_timeout(), Duration::from_secs(600));
        assert!(!config.is_production());
    }

    #[test]
    fn s3_region_takes_precedence_over_aws_region() {
        let config = config_from(&[
            ("S3_BUCKET", "clips"),
            ("S3_REGION", "eu-west-1"),
            ("AWS_REGION", "us-east-1"),
        ])
        .unwrap();
        assert_eq!(config.s3_region.as_deref(), Some("eu-west-1"));
    }

    #[test]
    fn s3_requires_bucket_and_region() {
        let err = config_from(&[("AWS_REGION", "us-east-1")]).unwrap_err();
        assert!(err.to_string().contains("S3_BUCKET"));

        let err = config_from(&[("S3_BUCKET", "clips")]).unwrap_err();
        assert!(err.to_string().contains("S3_REGION"));
    }

    #[test]
    fn local_backend_requires_path_and_url() {
        let err = config_from(&[("STORAGE_BACKEND", "local")]).unwrap_err();
        assert!(err.to_string().contains("LOCAL_STORAGE_PATH"));

        let config = config_from(&[
            ("STORAGE_BACKEND", "local"),
            ("LOCAL_STORAGE_PATH", "/var/lib/clipvault"),
            ("LOCAL_STORAGE_BASE_URL", "http://localhost:8091/assets"),
        ])
        .unwrap();
        assert_eq!(config.storage_backend, StorageBackend::Local);
    }

    #[test]
    fn rejects_non_postgres_database_url() {
        let err = config_from(&[
            ("S3_BUCKET", "clips"),
            ("S3_REGION", "us-east-1"),
            ("DATABASE_URL", "sqlite://clips.db"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn rejects_unparseable_numbers() {
        let err = config_from(&[
            ("S3_BUCKET", "clips"),
            ("S3_REGION", "us-east-1"),
            ("MAX_VIDEO_SIZE_MB", "lots"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("MAX_VIDEO_SIZE_MB"));
    }

    #[test]
    fn rejects_size_limit_that_overflows() {
        let err = config_from(&[
            ("S3_BUCKET", "clips"),
            ("S3_REGION", "us-east-1"),
            ("MAX_VIDEO_SIZE_MB", "18446744073709551615"),
        ])
        .unwrap_err();
        assert_eq!(err.to_string(), "MAX_VIDEO_SIZE_MB is too large");

        let config = config_from(&[
            ("S3_BUCKET", "clips"),
            ("S3_REGION", "us-east-1"),
            ("MAX_VIDEO_SIZE_MB", "17592186044415"),
        ])
        .unwrap();
        assert_eq!(config.max_video_size_bytes, 17592186044415 * 1024 * 1024);
    }
}
