//! Image references accepted by the detector.
//!
//! Resolution happens on every call; nothing is cached. Any failure to reach
//! or decode the pixels is reported as `DetectError::NotFound`.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageReader};

use crate::error::DetectError;

/// A single image, either on disk or already in memory as encoded bytes.
#[derive(Clone, Debug)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    pub fn bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    /// Read and decode the image.
    pub fn load(&self) -> Result<DynamicImage, DetectError> {
        match self {
            ImageSource::Path(path) => load_path(path),
            ImageSource::Bytes(bytes) => ImageReader::new(Cursor::new(bytes))
                .with_guessed_format()
                .map_err(|e| DetectError::not_found("<memory>", e))?
                .decode()
                .map_err(|e| DetectError::not_found("<memory>", e)),
        }
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Bytes(bytes) => write!(f, "<memory:{} bytes>", bytes.len()),
        }
    }
}

fn load_path(path: &Path) -> Result<DynamicImage, DetectError> {
    if !path.is_file() {
        return Err(DetectError::not_found(path, "no such file"));
    }
    ImageReader::open(path)
        .map_err(|e| DetectError::not_found(path, e))?
        .with_guessed_format()
        .map_err(|e| DetectError::not_found(path, e))?
        .decode()
        .map_err(|e| DetectError::not_found(path, e))
}
