use std::sync::Arc;

use image::DynamicImage;

use crate::detect::backend::DetectorBackend;
use crate::detect::image_source::ImageSource;
use crate::detect::result::Detection;
use crate::error::{validate_threshold, DetectError};

/// Confidence threshold used when the caller does not pick one.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.25;

/// Detector adapter: image reference + threshold -> validated detections.
///
/// The backend (and the model weights it holds) lives as long as the
/// adapter. Cloning shares the same loaded backend.
#[derive(Clone)]
pub struct Detector {
    backend: Arc<dyn DetectorBackend>,
}

impl Detector {
    pub fn new<B: DetectorBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn DetectorBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn warm_up(&self) -> Result<(), DetectError> {
        self.backend.warm_up().map_err(DetectError::Model)
    }

    /// Run the backend on one image and keep detections scoring at least
    /// `threshold`, in backend order.
    pub fn detect(
        &self,
        source: &ImageSource,
        threshold: f32,
    ) -> Result<Vec<Detection>, DetectError> {
        self.detect_with_image(source, threshold)
            .map(|(_, detections)| detections)
    }

    /// Like [`Detector::detect`], but also hands back the decoded image.
    pub fn detect_with_image(
        &self,
        source: &ImageSource,
        threshold: f32,
    ) -> Result<(DynamicImage, Vec<Detection>), DetectError> {
        let threshold = validate_threshold("confidence threshold", threshold)?;
        let image = source.load()?;
        let raw = self
            .backend
            .detect(&image, threshold)
            .map_err(DetectError::Model)?;

        let mut kept = Vec::with_capacity(raw.len());
        for det in raw {
            if !det.confidence.is_finite() || !(0.0..=1.0).contains(&det.confidence) {
                return Err(DetectError::invalid(format!(
                    "{} backend returned confidence {} for {}",
                    self.backend.name(),
                    det.confidence,
                    det.class_id
                )));
            }
            if det.confidence >= threshold {
                kept.push(det);
            }
        }

        log::debug!(
            "image={} backend={} threshold={:.2} detections={}",
            source,
            self.backend.name(),
            threshold,
            kept.len()
        );
        Ok((image, kept))
    }
}

impl std::fmt::Debug for Detector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Detector")
            .field("backend", &self.backend.name())
            .finish()
    }
}
