use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Coarse orientation of a video, derived from its first video stream.
///
/// Only used to pick the storage key prefix; it never affects validation or transcoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectCategory {
    Landscape,
    Portrait,
    /// Square, or anything that is neither 16:9 nor 9:16.
    Other,
}

impl AspectCategory {
    /// Key prefix segment for objects of this category.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            AspectCategory::Landscape => "landscape",
            AspectCategory::Portrait => "portrait",
            AspectCategory::Other => "other",
        }
    }
}

impl Display for AspectCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.key_prefix())
    }
}
