//! YOLOv8 head decoding and non-maximum suppression.
//!
//! Kept free of any inference runtime so the post-processing can be tested
//! with synthetic tensors.

use anyhow::{anyhow, Result};

use crate::detect::result::{ClassId, Detection};
use crate::geometry::BoundingBox;

/// Post-processing parameters for a YOLOv8 export.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloDecode {
    /// Square model input edge in pixels.
    pub input_size: u32,
    pub iou_threshold: f32,
    pub max_detections: usize,
}

impl Default for YoloDecode {
    fn default() -> Self {
        Self {
            input_size: 640,
            iou_threshold: 0.7,
            max_detections: 300,
        }
    }
}

impl YoloDecode {
    /// Decode a `[1, 4 + classes, anchors]` output tensor given as a
    /// row-major slice.
    ///
    /// Boxes come out in the pixel space of an image of
    /// `image_width x image_height`, clipped to its bounds.
    pub fn decode(
        &self,
        data: &[f32],
        shape: &[usize],
        min_confidence: f32,
        image_width: u32,
        image_height: u32,
    ) -> Result<Vec<Detection>> {
        let (rows, anchors) = match shape {
            [1, rows, anchors] => (*rows, *anchors),
            [rows, anchors] => (*rows, *anchors),
            other => return Err(anyhow!("unexpected YOLO output shape {:?}", other)),
        };
        if rows <= 4 {
            return Err(anyhow!("YOLO output has {} rows, need 4 + classes", rows));
        }
        if data.len() != rows * anchors {
            return Err(anyhow!(
                "YOLO output holds {} values, shape {:?} needs {}",
                data.len(),
                shape,
                rows * anchors
            ));
        }

        let at = |row: usize, anchor: usize| data[row * anchors + anchor];
        let sx = image_width as f32 / self.input_size as f32;
        let sy = image_height as f32 / self.input_size as f32;

        let mut candidates = Vec::new();
        for i in 0..anchors {
            let (class_idx, score) = (4..rows)
                .map(|row| (row - 4, at(row, i)))
                .fold((0usize, f32::NEG_INFINITY), |best, cur| {
                    if cur.1 > best.1 {
                        cur
                    } else {
                        best
                    }
                });
            if !score.is_finite() || score < min_confidence {
                continue;
            }
            let Ok(raw) = BoundingBox::from_center(at(0, i), at(1, i), at(2, i), at(3, i)) else {
                continue;
            };
            let Some(bbox) =
                raw.rescale_clamped(sx, sy, image_width as f32, image_height as f32)
            else {
                continue;
            };
            candidates.push(Detection::new(
                ClassId(class_idx as u32),
                score.min(1.0),
                bbox,
            ));
        }

        let mut kept = non_max_suppression(candidates, self.iou_threshold);
        kept.truncate(self.max_detections);
        Ok(kept)
    }
}

/// Class-aware NMS. Output is sorted by descending confidence; the sort is
/// stable so equal scores keep their input order.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));

    let mut keep: Vec<Detection> = Vec::with_capacity(detections.len());
    for det in detections {
        let suppressed = keep
            .iter()
            .any(|k| k.class_id == det.class_id && k.bbox.iou(&det.bbox) > iou_threshold);
        if !suppressed {
            keep.push(det);
        }
    }
    keep
}
