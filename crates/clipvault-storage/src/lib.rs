//! Clipvault Storage Library
//!
//! This crate provides the object store abstraction the upload pipeline relocates videos into,
//! with implementations for S3 and the local filesystem.
//!
//! # Storage key format
//!
//! Keys are content-addressed and carry the aspect classification as a prefix:
//!
//! - `landscape/{32 hex chars}.mp4`
//! - `{32 hex chars}.{ext}` when no prefix is requested
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use clipvault_core::StorageBackend;
pub use factory::create_storage;
pub use keys::{extension_for, AssetKeyGenerator, KeyError, OsRandom, RandomSource};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StorageStream};
