//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use std::pin::Pin;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Byte stream handed to [`Storage::put`].
pub type StorageStream = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so the upload
/// pipeline can relocate videos without coupling to a specific provider.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write the reader's bytes under `storage_key`, overwriting any existing object.
    ///
    /// The reader is consumed until EOF. A failed write leaves no committed object behind.
    async fn put(
        &self,
        storage_key: &str,
        content_type: &str,
        reader: StorageStream,
    ) -> StorageResult<()>;

    /// Publicly reachable URL for an object key. Pure; does not check existence.
    fn public_url(&self, storage_key: &str) -> String;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
