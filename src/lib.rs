//! Couch Nagger
//!
//! Single-image check for "is the dog on the couch?".
//!
//! # Architecture
//!
//! A call runs in two steps and keeps no state between calls:
//!
//! 1. **Detect**: the [`Detector`] adapter resolves an image, hands it to a
//!    [`DetectorBackend`] (the pretrained model, treated as opaque) and keeps
//!    detections at or above the confidence threshold.
//! 2. **Evaluate**: the [`OverlapEvaluator`] takes the top-confidence dog and
//!    couch boxes and applies a strict axis-aligned overlap test. Boxes that
//!    only touch do not count.
//!
//! # Module Structure
//!
//! - `geometry`: `BoundingBox` and the overlap predicate
//! - `detect`: detections, backends (stub, replay, tract), image loading, adapter
//! - `evaluate`: the verdict (`CouchVerdict`) and `check_image`
//! - `config`: layered settings (defaults, JSON file, environment)
//! - `annotate`: debug images with boxes drawn in
//! - `ui`: CLI stage output

pub mod annotate;
pub mod config;
pub mod detect;
pub mod error;
pub mod evaluate;
pub mod geometry;
pub mod ui;

pub use config::Settings;
pub use detect::{
    ClassId, Detection, Detector, DetectorBackend, ImageSource, ReplayBackend, StubBackend,
    YoloDecode, DEFAULT_CONFIDENCE_THRESHOLD,
};
#[cfg(feature = "backend-tract")]
pub use detect::TractBackend;
pub use error::DetectError;
pub use evaluate::{
    check_image, evaluate, Confidences, CouchVerdict, Inspection, OverlapEvaluator,
};
pub use geometry::BoundingBox;
