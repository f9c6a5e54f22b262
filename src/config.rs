use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::{ClassId, YoloDecode, DEFAULT_CONFIDENCE_THRESHOLD};
use crate::error::validate_threshold;
use crate::evaluate::OverlapEvaluator;

const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_IOU_THRESHOLD: f32 = 0.7;
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_MAX_DETECTIONS: usize = 300;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Deserialize, Default)]
struct SettingsFile {
    base_dir: Option<PathBuf>,
    model: Option<ModelConfigFile>,
    classes: Option<ClassConfigFile>,
    output: Option<OutputConfigFile>,
    logging: Option<LoggingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<PathBuf>,
    confidence_threshold: Option<f32>,
    iou_threshold: Option<f32>,
    input_size: Option<u32>,
    max_detections: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
struct ClassConfigFile {
    dog: Option<u32>,
    couch: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct OutputConfigFile {
    detection_image_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingConfigFile {
    level: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_dir: Option<PathBuf>,
    pub model: ModelSettings,
    pub classes: ClassSettings,
    /// Where annotated images go; `None` disables annotation.
    pub detection_image_dir: Option<PathBuf>,
    pub log_level: String,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub path: PathBuf,
    pub confidence_threshold: f32,
    pub iou_threshold: f32,
    pub input_size: u32,
    pub max_detections: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct ClassSettings {
    pub dog: ClassId,
    pub couch: ClassId,
}

impl Default for Settings {
    fn default() -> Self {
        // Defaults never fail validation.
        Self::from_file(SettingsFile::default())
    }
}

impl Settings {
    /// Defaults, then the JSON file named by `COUCH_NAGGER_CONFIG`, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("COUCH_NAGGER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) if !path.trim().is_empty() => Some(read_config_file(Path::new(path))?),
            _ => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.resolve_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn decode(&self) -> YoloDecode {
        YoloDecode {
            input_size: self.model.input_size,
            iou_threshold: self.model.iou_threshold,
            max_detections: self.model.max_detections,
        }
    }

    pub fn evaluator(&self) -> OverlapEvaluator {
        OverlapEvaluator::new(self.classes.dog, self.classes.couch)
    }

    fn from_file(file: SettingsFile) -> Self {
        let model = file.model.unwrap_or_default();
        let classes = file.classes.unwrap_or_default();
        Self {
            base_dir: file.base_dir,
            model: ModelSettings {
                path: model
                    .path
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
                confidence_threshold: model
                    .confidence_threshold
                    .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD),
                iou_threshold: model.iou_threshold.unwrap_or(DEFAULT_IOU_THRESHOLD),
                input_size: model.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
                max_detections: model.max_detections.unwrap_or(DEFAULT_MAX_DETECTIONS),
            },
            classes: ClassSettings {
                dog: classes.dog.map(ClassId).unwrap_or(ClassId::DOG),
                couch: classes.couch.map(ClassId).unwrap_or(ClassId::COUCH),
            },
            detection_image_dir: file.output.and_then(|o| o.detection_image_dir),
            log_level: file
                .logging
                .and_then(|l| l.level)
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(dir) = env_nonempty("BASE_DIR") {
            self.base_dir = Some(PathBuf::from(dir));
        }
        if let Some(path) = env_nonempty("MODEL_PATH") {
            self.model.path = PathBuf::from(path);
        }
        if let Some(v) = env_parsed::<f32>("CONFIDENCE_THRESHOLD")? {
            self.model.confidence_threshold = v;
        }
        if let Some(v) = env_parsed::<f32>("IOU_THRESHOLD")? {
            self.model.iou_threshold = v;
        }
        if let Some(v) = env_parsed::<u32>("MODEL_INPUT_SIZE")? {
            self.model.input_size = v;
        }
        if let Some(v) = env_parsed::<u32>("DOG_CLASS_ID")? {
            self.classes.dog = ClassId(v);
        }
        if let Some(v) = env_parsed::<u32>("COUCH_CLASS_ID")? {
            self.classes.couch = ClassId(v);
        }
        if let Some(dir) = env_nonempty("DETECTION_IMAGE_DIR") {
            self.detection_image_dir = Some(PathBuf::from(dir));
        }
        if let Some(level) = env_nonempty("LOG_LEVEL") {
            self.log_level = level.to_lowercase();
        }
        Ok(())
    }

    /// Relative paths are taken relative to `base_dir` when one is set.
    fn resolve_paths(&mut self) {
        let Some(base) = self.base_dir.clone() else {
            return;
        };
        let resolve = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };
        self.model.path = resolve(&self.model.path);
        self.detection_image_dir = self.detection_image_dir.as_ref().map(resolve);
    }

    fn validate(&self) -> Result<()> {
        validate_threshold("CONFIDENCE_THRESHOLD", self.model.confidence_threshold)?;
        validate_threshold("IOU_THRESHOLD", self.model.iou_threshold)?;
        if self.model.input_size == 0 || self.model.input_size % 32 != 0 {
            return Err(anyhow!(
                "MODEL_INPUT_SIZE must be a positive multiple of 32, got {}",
                self.model.input_size
            ));
        }
        if self.model.max_detections == 0 {
            return Err(anyhow!("max_detections must be greater than zero"));
        }
        if self.classes.dog == self.classes.couch {
            return Err(anyhow!(
                "dog and couch class ids must differ (both {})",
                self.classes.dog.0
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SettingsFile> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let cfg = serde_json::from_str(&raw)
        .with_context(|| format!("invalid config file {}", path.display()))?;
    Ok(cfg)
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    match env_nonempty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| anyhow!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Settings::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.model.confidence_threshold, 0.25);
        assert_eq!(cfg.classes.dog, ClassId::DOG);
        assert_eq!(cfg.classes.couch, ClassId::COUCH);
        assert_eq!(cfg.decode(), YoloDecode::default());
    }

    #[test]
    fn base_dir_resolves_relative_paths_only() {
        let mut cfg = Settings::default();
        cfg.base_dir = Some(PathBuf::from("/srv/couch"));
        cfg.detection_image_dir = Some(PathBuf::from("/var/captures"));
        cfg.resolve_paths();
        assert_eq!(cfg.model.path, PathBuf::from("/srv/couch/yolov8n.onnx"));
        assert_eq!(cfg.detection_image_dir, Some(PathBuf::from("/var/captures")));
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut cfg = Settings::default();
        cfg.model.confidence_threshold = 1.2;
        assert!(cfg.validate().is_err());

        let mut cfg = Settings::default();
        cfg.model.input_size = 600;
        assert!(cfg.validate().is_err());

        let mut cfg = Settings::default();
        cfg.classes.couch = cfg.classes.dog;
        assert!(cfg.validate().is_err());
    }
}
