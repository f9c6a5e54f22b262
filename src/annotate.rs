//! Debug rendering of detections onto a copy of the checked image.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut};
use imageproc::rect::Rect;

use crate::detect::{ClassId, Detection};
use crate::evaluate::CouchVerdict;
use crate::geometry::BoundingBox;

const DOG_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
const COUCH_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
const OTHER_COLOR: Rgb<u8> = Rgb([128, 128, 128]);
const STATUS_BAR_HEIGHT: u32 = 12;
const LINE_WIDTH: u32 = 2;

/// Draw every detection and a status bar: red when the dog is on the
/// couch, green otherwise.
pub fn annotate(
    image: &DynamicImage,
    detections: &[Detection],
    verdict: &CouchVerdict,
) -> RgbImage {
    let mut canvas = image.to_rgb8();

    for det in detections {
        let color = match det.class_id {
            ClassId::DOG => DOG_COLOR,
            ClassId::COUCH => COUCH_COLOR,
            _ => OTHER_COLOR,
        };
        draw_box(&mut canvas, &det.bbox, color);
    }

    let status = if verdict.dog_on_couch {
        DOG_COLOR
    } else {
        COUCH_COLOR
    };
    let width = canvas.width();
    let bar_height = STATUS_BAR_HEIGHT.min(canvas.height());
    if width > 0 && bar_height > 0 {
        draw_filled_rect_mut(&mut canvas, Rect::at(0, 0).of_size(width, bar_height), status);
    }
    canvas
}

/// Render and write `<dir>/<stem>_<unix_ms>_detection.png`, returning the
/// path. An existing file is never replaced; a `_<n>` suffix is added
/// instead.
pub fn save_annotated(
    dir: &Path,
    image_name: &str,
    image: &DynamicImage,
    detections: &[Detection],
    verdict: &CouchVerdict,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create {}", dir.display()))?;
    let stem = Path::new(image_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before unix epoch")?
        .as_millis();
    let out = unused_path(dir, &format!("{stem}_{stamp}"));
    annotate(image, detections, verdict)
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;
    log::debug!("saved detection image {}", out.display());
    Ok(out)
}

fn unused_path(dir: &Path, base: &str) -> PathBuf {
    let mut out = dir.join(format!("{base}_detection.png"));
    let mut n = 1u32;
    while out.exists() {
        out = dir.join(format!("{base}_{n}_detection.png"));
        n += 1;
    }
    out
}

fn draw_box(canvas: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    let x = bbox.x1().floor() as i32;
    let y = bbox.y1().floor() as i32;
    let w = bbox.width().ceil().max(1.0) as u32;
    let h = bbox.height().ceil().max(1.0) as u32;
    for inset in 0..LINE_WIDTH {
        if w <= 2 * inset || h <= 2 * inset {
            break;
        }
        let rect = Rect::at(x + inset as i32, y + inset as i32)
            .of_size(w - 2 * inset, h - 2 * inset);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
