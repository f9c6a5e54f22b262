//! Replay backend: serves detector output recorded earlier as JSON.
//!
//! The file holds an array of detections:
//!
//! ```json
//! [{"class_id": 16, "confidence": 0.91, "bbox": [120, 80, 340, 300]}]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::DynamicImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

pub struct ReplayBackend {
    source: PathBuf,
    detections: Vec<Detection>,
}

impl ReplayBackend {
    /// Load recorded detections. The file is read once.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read detections from {}", path.display()))?;
        let detections: Vec<Detection> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid detections file {}", path.display()))?;
        log::info!(
            "replay backend loaded {} detections from {}",
            detections.len(),
            path.display()
        );
        Ok(Self {
            source: path.to_path_buf(),
            detections,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl DetectorBackend for ReplayBackend {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn detect(&self, image: &DynamicImage, min_confidence: f32) -> Result<Vec<Detection>> {
        let (w, h) = (image.width() as f32, image.height() as f32);
        let outside = self
            .detections
            .iter()
            .filter(|d| d.bbox.x2() > w || d.bbox.y2() > h)
            .count();
        if outside > 0 {
            log::warn!(
                "{} replayed boxes extend past the {}x{} image",
                outside,
                image.width(),
                image.height()
            );
        }
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= min_confidence)
            .copied()
            .collect())
    }
}
