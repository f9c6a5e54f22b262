use anyhow::Result;
use image::DynamicImage;

use crate::detect::result::Detection;

/// Detector backend trait.
///
/// # Model Boundary
///
/// This trait is the only place the crate touches a pretrained model. The
/// model is treated as an opaque function from a decoded image to a list of
/// detections. Implementations:
/// - Load weights once, at construction, and never mutate them afterwards
/// - Report boxes in the pixel coordinates of the image they were given
/// - Drop anything scoring below `min_confidence` before suppression
///
/// Backends are `Send + Sync` so a loaded model can be shared across
/// workers without locking.
pub trait DetectorBackend: Send + Sync {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a decoded image.
    fn detect(&self, image: &DynamicImage, min_confidence: f32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook.
    fn warm_up(&self) -> Result<()> {
        Ok(())
    }
}
