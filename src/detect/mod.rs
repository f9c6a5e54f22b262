mod adapter;
mod backend;
mod backends;
mod image_source;
mod result;
pub mod yolo;

pub use adapter::{Detector, DEFAULT_CONFIDENCE_THRESHOLD};
pub use backend::DetectorBackend;
pub use backends::{ReplayBackend, StubBackend};
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use image_source::ImageSource;
pub use result::{ClassId, Detection, COCO_CLASSES};
pub use yolo::YoloDecode;
