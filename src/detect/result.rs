use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// COCO-80 class index as produced by YOLOv8 heads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub u32);

impl ClassId {
    pub const PERSON: ClassId = ClassId(0);
    pub const DOG: ClassId = ClassId(16);
    pub const COUCH: ClassId = ClassId(57);

    /// COCO label, `None` for ids outside the 80-class table.
    pub fn name(self) -> Option<&'static str> {
        COCO_CLASSES.get(self.0 as usize).copied()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "class#{}", self.0),
        }
    }
}

/// One (class, confidence, box) triple from a detector.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub class_id: ClassId,
    /// Score in `[0, 1]`.
    pub confidence: f32,
    pub bbox: BoundingBox,
}

impl Detection {
    pub fn new(class_id: ClassId, confidence: f32, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            confidence,
            bbox,
        }
    }
}

pub const COCO_CLASSES: [&str; 80] = [
    "person",
    "bicycle",
    "car",
    "motorcycle",
    "airplane",
    "bus",
    "train",
    "truck",
    "boat",
    "traffic light",
    "fire hydrant",
    "stop sign",
    "parking meter",
    "bench",
    "bird",
    "cat",
    "dog",
    "horse",
    "sheep",
    "cow",
    "elephant",
    "bear",
    "zebra",
    "giraffe",
    "backpack",
    "umbrella",
    "handbag",
    "tie",
    "suitcase",
    "frisbee",
    "skis",
    "snowboard",
    "sports ball",
    "kite",
    "baseball bat",
    "baseball glove",
    "skateboard",
    "surfboard",
    "tennis racket",
    "bottle",
    "wine glass",
    "cup",
    "fork",
    "knife",
    "spoon",
    "bowl",
    "banana",
    "apple",
    "sandwich",
    "orange",
    "broccoli",
    "carrot",
    "hot dog",
    "pizza",
    "donut",
    "cake",
    "chair",
    "couch",
    "potted plant",
    "bed",
    "dining table",
    "toilet",
    "tv",
    "laptop",
    "mouse",
    "remote",
    "keyboard",
    "cell phone",
    "microwave",
    "oven",
    "toaster",
    "sink",
    "refrigerator",
    "book",
    "clock",
    "vase",
    "scissors",
    "teddy bear",
    "hair drier",
    "toothbrush",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_ids_match_coco_labels() {
        assert_eq!(ClassId::DOG.name(), Some("dog"));
        assert_eq!(ClassId::COUCH.name(), Some("couch"));
        assert_eq!(ClassId::PERSON.name(), Some("person"));
        assert_eq!(ClassId(80).name(), None);
        assert_eq!(ClassId(91).to_string(), "class#91");
    }

    #[test]
    fn detection_json_shape() {
        let json = r#"{"class_id": 57, "confidence": 0.6, "bbox": [0, 0, 10, 10]}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.class_id, ClassId::COUCH);
        assert_eq!(det.confidence, 0.6);
        assert_eq!(det.bbox.area(), 100.0);
    }
}
