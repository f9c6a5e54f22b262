//! Axis-aligned bounding boxes in image pixel coordinates.
//!
//! Origin is the top-left corner; `x` grows to the right and `y` grows down.
//! A `BoundingBox` can only be built through [`BoundingBox::new`], so every
//! value in circulation satisfies `x1 < x2` and `y1 < y2` with finite
//! coordinates.

use serde::{Deserialize, Serialize};

use crate::error::DetectError;

/// Immutable axis-aligned box `[x1, y1, x2, y2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl BoundingBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, DetectError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(DetectError::invalid(format!(
                "bounding box has non-finite coordinates [{x1}, {y1}, {x2}, {y2}]"
            )));
        }
        if x1 >= x2 || y1 >= y2 {
            return Err(DetectError::invalid(format!(
                "bounding box [{x1}, {y1}, {x2}, {y2}] must satisfy x1 < x2 and y1 < y2"
            )));
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Build from center/size form as emitted by YOLO heads.
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Result<Self, DetectError> {
        Self::new(cx - w * 0.5, cy - h * 0.5, cx + w * 0.5, cy + h * 0.5)
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Strict intersection test. Boxes that only share an edge or a corner
    /// do not overlap.
    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        self.x1 < other.x2 && self.x2 > other.x1 && self.y1 < other.y2 && self.y2 > other.y1
    }

    /// Area of the intersection, `0.0` when the boxes do not overlap.
    pub fn intersection_area(&self, other: &BoundingBox) -> f32 {
        if !self.overlaps(other) {
            return 0.0;
        }
        let w = self.x2.min(other.x2) - self.x1.max(other.x1);
        let h = self.y2.min(other.y2) - self.y1.max(other.y1);
        w * h
    }

    /// Fraction of `self` covered by `other`, in `[0, 1]`. `0.0` when the
    /// area of `self` is not representable as a positive finite `f32`.
    pub fn coverage_by(&self, other: &BoundingBox) -> f32 {
        let area = self.area();
        if !(area.is_finite() && area > 0.0) {
            return 0.0;
        }
        (self.intersection_area(other) / area).clamp(0.0, 1.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let inter = self.intersection_area(other);
        if inter == 0.0 {
            return 0.0;
        }
        inter / (self.area() + other.area() - inter)
    }

    /// Scale both axes independently and clip to `[0, width] x [0, height]`.
    ///
    /// Returns `None` when nothing of the box is left inside the frame.
    pub fn rescale_clamped(
        &self,
        sx: f32,
        sy: f32,
        width: f32,
        height: f32,
    ) -> Option<BoundingBox> {
        let x1 = (self.x1 * sx).clamp(0.0, width);
        let y1 = (self.y1 * sy).clamp(0.0, height);
        let x2 = (self.x2 * sx).clamp(0.0, width);
        let y2 = (self.y2 * sy).clamp(0.0, height);
        BoundingBox::new(x1, y1, x2, y2).ok()
    }
}

impl TryFrom<[f32; 4]> for BoundingBox {
    type Error = DetectError;

    fn try_from(v: [f32; 4]) -> Result<Self, Self::Error> {
        BoundingBox::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f32; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}
