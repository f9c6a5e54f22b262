use anyhow::Result;
use image::DynamicImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;

/// Stub backend for testing. Returns the same scripted detections for every
/// image, minus those under the requested confidence.
#[derive(Clone, Debug, Default)]
pub struct StubBackend {
    detections: Vec<Detection>,
}

impl StubBackend {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self { detections }
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&self, _image: &DynamicImage, min_confidence: f32) -> Result<Vec<Detection>> {
        Ok(self
            .detections
            .iter()
            .filter(|d| d.confidence >= min_confidence)
            .copied()
            .collect())
    }
}
