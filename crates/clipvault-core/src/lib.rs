//! Clipvault Core Library
//!
//! This crate provides core domain models, error types, and configuration
//! that are shared across all Clipvault components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AspectCategory, Video};
pub use storage_types::StorageBackend;
