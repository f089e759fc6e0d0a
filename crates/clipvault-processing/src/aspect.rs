//! Orientation classification of probed video streams.

use crate::probe::{ClassifyError, StreamProbe};
use clipvault_core::AspectCategory;
use std::path::Path;
use std::sync::Arc;

const RATIO_TOLERANCE: f64 = 0.01;
const LANDSCAPE_RATIO: f64 = 16.0 / 9.0;
const PORTRAIT_RATIO: f64 = 9.0 / 16.0;

fn within_tolerance(ratio: f64, target: f64) -> bool {
    (ratio - target).abs() <= RATIO_TOLERANCE
}

/// Map pixel dimensions to an orientation category.
///
/// Ratios within 0.01 of 16:9, 9:16 and 1:1 are matched first, in that order. Anything else
/// falls through to an exact integer comparison against the 16:9 shape, which never yields the
/// square case.
pub fn classify_dimensions(width: u32, height: u32) -> AspectCategory {
    if width == 0 || height == 0 {
        return AspectCategory::Other;
    }

    let ratio = width as f64 / height as f64;
    if within_tolerance(ratio, LANDSCAPE_RATIO) {
        return AspectCategory::Landscape;
    }
    if within_tolerance(ratio, PORTRAIT_RATIO) {
        return AspectCategory::Portrait;
    }
    if within_tolerance(ratio, 1.0) {
        return AspectCategory::Other;
    }

    let (w, h) = (width as u64, height as u64);
    if w == 16 * h / 9 {
        AspectCategory::Landscape
    } else if h == 16 * w / 9 {
        AspectCategory::Portrait
    } else {
        AspectCategory::Other
    }
}

/// Classifies a video file by the geometry of its first video stream.
#[derive(Clone)]
pub struct AspectClassifier {
    probe: Arc<dyn StreamProbe>,
}

impl AspectClassifier {
    pub fn new(probe: Arc<dyn StreamProbe>) -> Self {
        Self { probe }
    }

    pub async fn classify(&self, path: &Path) -> Result<AspectCategory, ClassifyError> {
        let geometry = self.probe.probe(path).await?;
        let category = classify_dimensions(geometry.width, geometry.height);

        tracing::debug!(
            width = geometry.width,
            height = geometry.height,
            category = %category,
            "Aspect ratio classified"
        );

        Ok(category)
    }
}
