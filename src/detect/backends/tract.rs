#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::detect::yolo::YoloDecode;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// This backend loads a local model file once and performs inference on RGB
/// images resized to the model's square input. It does no network I/O.
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    decode: YoloDecode,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, decode: YoloDecode) -> Result<Self> {
        let model_path = model_path.as_ref();
        if decode.input_size == 0 {
            return Err(anyhow!("model input size must be > 0"));
        }
        let size = decode.input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size)),
            )
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        log::info!(
            "loaded {} ({}x{} input)",
            model_path.display(),
            decode.input_size,
            decode.input_size
        );
        Ok(Self { model, decode })
    }

    fn build_input(&self, image: &DynamicImage) -> Tensor {
        let size = self.decode.input_size;
        let rgb = image
            .resize_exact(size, size, FilterType::Triangle)
            .to_rgb8();
        let size = size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, c, y, x)| {
            rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
        });
        input.into_tensor()
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&self, image: &DynamicImage, min_confidence: f32) -> Result<Vec<Detection>> {
        let input = self.build_input(image);
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let shape = view.shape().to_vec();
        let data: Vec<f32> = view.iter().copied().collect();
        self.decode
            .decode(&data, &shape, min_confidence, image.width(), image.height())
    }

    fn warm_up(&self) -> Result<()> {
        let blank = DynamicImage::new_rgb8(self.decode.input_size, self.decode.input_size);
        self.detect(&blank, 1.0).map(|_| ())
    }
}
