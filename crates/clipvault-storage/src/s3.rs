use crate::traits::{Storage, StorageError, StorageResult, StorageStream};
use crate::StorageBackend;
use async_trait::async_trait;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::buffered::BufWriter;
use object_store::path::Path;
use object_store::{Attribute, AttributeValue, Attributes};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

/// S3 storage implementation
#[derive(Clone)]
pub struct S3Storage {
    store: Arc<AmazonS3>,
    bucket: String,
    public_host: String,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom API endpoint for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_host` - Host objects are served from; defaults to `s3.{region}.amazonaws.com`
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_host: Option<String>,
    ) -> StorageResult<Self> {
        // Credentials come from the environment, location from explicit settings.
        let mut builder = AmazonS3Builder::from_env()
            .with_region(region.clone())
            .with_bucket_name(bucket.clone());

        if let Some(ref endpoint) = endpoint_url {
            let allow_http = endpoint.starts_with("http://");
            builder = builder
                .with_endpoint(endpoint.clone())
                .with_allow_http(allow_http);
        }

        let store = builder
            .build()
            .map_err(|e| StorageError::ConfigError(e.to_string()))?;

        Ok(S3Storage {
            store: Arc::new(store),
            public_host: public_host.unwrap_or_else(|| default_public_host(&region)),
            bucket,
        })
    }
}

fn default_public_host(region: &str) -> String {
    format!("s3.{}.amazonaws.com", region)
}

/// Virtual-hosted-style object URL.
fn object_url(bucket: &str, public_host: &str, key: &str) -> String {
    format!(
        "https://{}.{}/{}",
        bucket,
        public_host.trim_end_matches('/'),
        key
    )
}

#[async_trait]
impl Storage for S3Storage {
    async fn put(
        &self,
        storage_key: &str,
        content_type: &str,
        mut reader: StorageStream,
    ) -> StorageResult<()> {
        let start = std::time::Instant::now();
        let location = Path::from(storage_key.to_string());

        let mut attributes = Attributes::new();
        attributes.insert(
            Attribute::ContentType,
            AttributeValue::from(content_type.to_string()),
        );

        // Streams through multipart upload once the payload exceeds one part.
        let mut writer = BufWriter::new(self.store.clone(), location).with_attributes(attributes);

        let result = match tokio::io::copy(&mut reader, &mut writer).await {
            Ok(n) => writer.shutdown().await.map(|_| n),
            Err(e) => Err(e),
        };

        let size = match result {
            Ok(n) => n,
            Err(e) => {
                if let Err(abort_err) = writer.abort().await {
                    tracing::warn!(
                        error = %abort_err,
                        bucket = %self.bucket,
                        key = %storage_key,
                        "Failed to abort S3 upload"
                    );
                }
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream upload failed"
                );
                return Err(StorageError::UploadFailed(e.to_string()));
            }
        };

        tracing::info!(
            bucket = %self.bucket,
            key = %storage_key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 stream upload successful"
        );

        Ok(())
    }

    fn public_url(&self, storage_key: &str) -> String {
        object_url(&self.bucket, &self.public_host, storage_key)
    }

    fn backend_type(&self) -> StorageBackend {
        StorageBackend::S3
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_url_uses_regional_aws_host() {
        let host = default_public_host("us-east-1");
        assert_eq!(
            object_url("media-clips", &host, "landscape/abc.mp4"),
            "https://media-clips.s3.us-east-1.amazonaws.com/landscape/abc.mp4"
        );
    }

    #[test]
    fn public_host_override_is_used_verbatim() {
        assert_eq!(
            object_url("clips", "cdn.example.com/", "portrait/abc.mp4"),
            "https://clips.cdn.example.com/portrait/abc.mp4"
        );
    }

    #[tokio::test]
    async fn builds_client_without_contacting_the_service() {
        let storage = S3Storage::new(
            "clips".to_string(),
            "eu-west-1".to_string(),
            Some("http://localhost:9000".to_string()),
            None,
        )
        .await
        .unwrap();

        assert_eq!(storage.backend_type(), StorageBackend::S3);
        assert_eq!(
            storage.public_url("other/abc.mp4"),
            "https://clips.s3.eu-west-1.amazonaws.com/other/abc.mp4"
        );
    }
}
