//! Overlap evaluator: decides whether the dog is on the couch.
//!
//! Only the highest-confidence box of each class takes part in the overlap
//! test. When several boxes of a class share the top confidence, the first
//! one in detector order is used.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

use crate::detect::{ClassId, Detection, Detector, ImageSource};
use crate::error::DetectError;
use crate::geometry::BoundingBox;

/// Per-class maximum confidence. Absent classes report `0.0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Confidences {
    pub dog: f32,
    pub couch: f32,
}

/// Outcome of one single-image check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CouchVerdict {
    pub dog_on_couch: bool,
    pub confidence: Confidences,
    /// Top dog box used for the overlap test.
    pub dog_box: Option<BoundingBox>,
    /// Top couch box used for the overlap test.
    pub couch_box: Option<BoundingBox>,
    /// Fraction of `dog_box` covered by `couch_box`.
    pub overlap_ratio: f32,
}

/// Everything one check produced: the decoded image, the detections kept
/// at the threshold and the verdict drawn from them.
#[derive(Clone, Debug)]
pub struct Inspection {
    pub image: DynamicImage,
    pub detections: Vec<Detection>,
    pub verdict: CouchVerdict,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OverlapEvaluator {
    pub dog: ClassId,
    pub couch: ClassId,
}

impl Default for OverlapEvaluator {
    fn default() -> Self {
        Self {
            dog: ClassId::DOG,
            couch: ClassId::COUCH,
        }
    }
}

impl OverlapEvaluator {
    pub fn new(dog: ClassId, couch: ClassId) -> Self {
        Self { dog, couch }
    }

    pub fn evaluate(&self, detections: &[Detection]) -> CouchVerdict {
        let dog = top_of_class(detections, self.dog);
        let couch = top_of_class(detections, self.couch);

        let confidence = Confidences {
            dog: dog.map_or(0.0, |d| d.confidence),
            couch: couch.map_or(0.0, |d| d.confidence),
        };

        let (Some(dog), Some(couch)) = (dog, couch) else {
            return CouchVerdict {
                confidence,
                dog_box: dog.map(|d| d.bbox),
                couch_box: couch.map(|d| d.bbox),
                ..CouchVerdict::default()
            };
        };

        CouchVerdict {
            dog_on_couch: dog.bbox.overlaps(&couch.bbox),
            confidence,
            dog_box: Some(dog.bbox),
            couch_box: Some(couch.bbox),
            overlap_ratio: dog.bbox.coverage_by(&couch.bbox),
        }
    }

    /// Detect and evaluate in one call, using this evaluator's class ids.
    pub fn check_image(
        &self,
        detector: &Detector,
        source: &ImageSource,
        threshold: f32,
    ) -> Result<CouchVerdict, DetectError> {
        self.inspect(detector, source, threshold)
            .map(|inspection| inspection.verdict)
    }

    /// [`OverlapEvaluator::check_image`], keeping the image and detections
    /// for listing or annotation.
    pub fn inspect(
        &self,
        detector: &Detector,
        source: &ImageSource,
        threshold: f32,
    ) -> Result<Inspection, DetectError> {
        let (image, detections) = detector.detect_with_image(source, threshold)?;
        let verdict = self.evaluate(&detections);
        log::info!(
            "image={} | dog_on_couch={} | confidences: dog={:.3}, couch={:.3}",
            source,
            verdict.dog_on_couch,
            verdict.confidence.dog,
            verdict.confidence.couch
        );
        Ok(Inspection {
            image,
            detections,
            verdict,
        })
    }
}

/// Evaluate with the fixed COCO dog and couch ids.
pub fn evaluate(detections: &[Detection]) -> CouchVerdict {
    OverlapEvaluator::default().evaluate(detections)
}

/// Detect and evaluate in one call with the fixed COCO dog and couch ids.
pub fn check_image(
    detector: &Detector,
    source: &ImageSource,
    threshold: f32,
) -> Result<CouchVerdict, DetectError> {
    OverlapEvaluator::default().check_image(detector, source, threshold)
}

/// First detection of `class` with the maximum confidence.
fn top_of_class(detections: &[Detection], class: ClassId) -> Option<&Detection> {
    detections
        .iter()
        .filter(|d| d.class_id == class)
        .fold(None, |best: Option<&Detection>, d| match best {
            Some(b) if b.confidence >= d.confidence => Some(b),
            _ => Some(d),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(class: ClassId, conf: f32, b: [f32; 4]) -> Detection {
        Detection::new(class, conf, BoundingBox::try_from(b).unwrap())
    }

    #[test]
    fn only_couch_present() {
        let v = evaluate(&[det(ClassId::COUCH, 0.6, [0.0, 0.0, 100.0, 100.0])]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.confidence, Confidences { dog: 0.0, couch: 0.6 });
        assert!(v.dog_box.is_none());
        assert_eq!(v.overlap_ratio, 0.0);
    }

    #[test]
    fn only_dog_present() {
        let v = evaluate(&[
            det(ClassId::DOG, 0.4, [0.0, 0.0, 10.0, 10.0]),
            det(ClassId::DOG, 0.7, [50.0, 50.0, 60.0, 60.0]),
        ]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.confidence, Confidences { dog: 0.7, couch: 0.0 });
    }

    #[test]
    fn empty_input() {
        assert_eq!(evaluate(&[]), CouchVerdict::default());
    }

    #[test]
    fn dog_overlapping_couch() {
        let v = evaluate(&[
            det(ClassId::COUCH, 0.8, [0.0, 100.0, 400.0, 300.0]),
            det(ClassId::DOG, 0.9, [100.0, 50.0, 200.0, 150.0]),
        ]);
        assert!(v.dog_on_couch);
        assert_eq!(v.confidence, Confidences { dog: 0.9, couch: 0.8 });
        assert_eq!(v.overlap_ratio, 0.5);
    }

    #[test]
    fn dog_touching_couch_edge_is_not_on_it() {
        let v = evaluate(&[
            det(ClassId::COUCH, 0.8, [0.0, 100.0, 400.0, 300.0]),
            det(ClassId::DOG, 0.9, [100.0, 0.0, 200.0, 100.0]),
        ]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.overlap_ratio, 0.0);
    }

    #[test]
    fn only_top_boxes_are_tested() {
        // A low-confidence dog box overlaps the couch, the top one does not.
        let v = evaluate(&[
            det(ClassId::DOG, 0.3, [10.0, 10.0, 20.0, 20.0]),
            det(ClassId::DOG, 0.9, [500.0, 500.0, 600.0, 600.0]),
            det(ClassId::COUCH, 0.7, [0.0, 0.0, 100.0, 100.0]),
        ]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.confidence, Confidences { dog: 0.9, couch: 0.7 });
    }

    #[test]
    fn confidence_is_class_max_even_for_untested_boxes() {
        let v = evaluate(&[
            det(ClassId::COUCH, 0.5, [0.0, 0.0, 100.0, 100.0]),
            det(ClassId::COUCH, 0.95, [300.0, 300.0, 400.0, 400.0]),
            det(ClassId::DOG, 0.6, [20.0, 20.0, 40.0, 40.0]),
        ]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.confidence.couch, 0.95);
    }

    #[test]
    fn ties_pick_first_seen() {
        let v = evaluate(&[
            det(ClassId::COUCH, 0.8, [0.0, 0.0, 100.0, 100.0]),
            det(ClassId::DOG, 0.7, [10.0, 10.0, 20.0, 20.0]),
            det(ClassId::DOG, 0.7, [500.0, 500.0, 600.0, 600.0]),
        ]);
        assert!(v.dog_on_couch);
        assert_eq!(
            v.dog_box.map(<[f32; 4]>::from),
            Some([10.0, 10.0, 20.0, 20.0])
        );
    }

    #[test]
    fn other_classes_are_ignored() {
        let v = evaluate(&[
            det(ClassId::PERSON, 0.99, [0.0, 0.0, 100.0, 100.0]),
            det(ClassId::COUCH, 0.8, [0.0, 0.0, 100.0, 100.0]),
        ]);
        assert!(!v.dog_on_couch);
        assert_eq!(v.confidence, Confidences { dog: 0.0, couch: 0.8 });
    }

    #[test]
    fn custom_class_ids() {
        let cat = ClassId(15);
        let bed = ClassId(59);
        let v = OverlapEvaluator::new(cat, bed).evaluate(&[
            det(cat, 0.6, [0.0, 0.0, 10.0, 10.0]),
            det(bed, 0.6, [5.0, 5.0, 50.0, 50.0]),
        ]);
        assert!(v.dog_on_couch);
    }

    #[test]
    fn vanishing_dog_box_still_yields_a_serializable_verdict() {
        let v = evaluate(&[
            det(ClassId::DOG, 0.9, [0.0, 0.0, 1e-30, 1e-30]),
            det(ClassId::COUCH, 0.8, [0.0, 0.0, 10.0, 10.0]),
        ]);
        assert!(v.dog_on_couch);
        assert_eq!(v.overlap_ratio, 0.0);
        let json = serde_json::to_string(&v).unwrap();
        let back: CouchVerdict = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn verdict_json_shape() {
        let v = evaluate(&[det(ClassId::COUCH, 0.5, [0.0, 0.0, 1.0, 1.0])]);
        let json: serde_json::Value = serde_json::to_value(v).unwrap();
        assert_eq!(json["dog_on_couch"], false);
        assert_eq!(json["confidence"]["dog"], 0.0);
        assert_eq!(json["confidence"]["couch"], 0.5);
        assert!(json["dog_box"].is_null());
    }
}
