use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the detector adapter and the evaluator.
///
/// Nothing here is retried internally. Backend failures are carried as-is in
/// [`DetectError::Model`] so the caller sees the original message.
#[derive(Debug, Error)]
pub enum DetectError {
    /// The image reference could not be resolved, read or decoded.
    #[error("image not found or unreadable: {path}: {reason}")]
    NotFound { path: PathBuf, reason: String },

    /// The detector could not be initialized or invoked.
    #[error(transparent)]
    Model(#[from] anyhow::Error),

    /// Threshold out of range or malformed detection data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DetectError {
    pub(crate) fn not_found(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::NotFound {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Reject thresholds that are NaN or outside `[0, 1]`.
pub fn validate_threshold(name: &str, value: f32) -> Result<f32, DetectError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DetectError::invalid(format!(
            "{name} must be between 0 and 1, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert_eq!(validate_threshold("conf", 0.0).unwrap(), 0.0);
        assert_eq!(validate_threshold("conf", 1.0).unwrap(), 1.0);
        assert!(validate_threshold("conf", -0.01).is_err());
        assert!(validate_threshold("conf", 1.01).is_err());
        assert!(validate_threshold("conf", f32::NAN).is_err());
    }

    #[test]
    fn model_error_keeps_backend_message() {
        let err: DetectError = anyhow::anyhow!("ONNX inference failed").into();
        assert_eq!(err.to_string(), "ONNX inference failed");
    }
}
