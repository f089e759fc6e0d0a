//! Storage key derivation.
//!
//! Key format: `[{prefix}/]{hex}.{ext}` where `hex` is 16 random bytes rendered as 32 lowercase
//! hex characters. Uniqueness is probabilistic and never checked against the store.

use clipvault_core::constants::STORAGE_KEY_RANDOM_BYTES;
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::error::Error as StdError;
use std::sync::Arc;
use thiserror::Error;

pub type RandomSourceError = Box<dyn StdError + Send + Sync>;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("random source failed: {0}")]
    RandomSource(#[source] RandomSourceError),

    #[error("media type must not be empty")]
    EmptyMediaType,
}

/// Supplies the random bytes behind a storage key.
pub trait RandomSource: Send + Sync {
    fn fill(&self, dest: &mut [u8]) -> Result<(), RandomSourceError>;
}

/// Operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<(), RandomSourceError> {
        OsRng.try_fill_bytes(dest).map_err(|e| Box::new(e) as RandomSourceError)
    }
}

/// File extension used for a media type. Unknown types map to `bin`.
pub fn extension_for(media_type: &str) -> &'static str {
    match media_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "video/mp4" => "mp4",
        _ => "bin",
    }
}

/// Derives collision-resistant storage keys.
#[derive(Clone)]
pub struct AssetKeyGenerator {
    random: Arc<dyn RandomSource>,
}

impl AssetKeyGenerator {
    pub fn new(random: Arc<dyn RandomSource>) -> Self {
        Self { random }
    }

    /// Generate a key for `media_type`, optionally nested under `prefix`.
    ///
    /// An empty prefix is treated as absent.
    pub fn generate(&self, media_type: &str, prefix: Option<&str>) -> Result<String, KeyError> {
        if media_type.trim().is_empty() {
            return Err(KeyError::EmptyMediaType);
        }

        let mut bytes = [0u8; STORAGE_KEY_RANDOM_BYTES];
        self.random.fill(&mut bytes).map_err(KeyError::RandomSource)?;

        let file_name = format!("{}.{}", hex::encode(bytes), extension_for(media_type));

        Ok(match prefix.filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{}/{}", prefix, file_name),
            None => file_name,
        })
    }
}

impl Default for AssetKeyGenerator {
    fn default() -> Self {
        Self::new(Arc::new(OsRandom))
    }
}
