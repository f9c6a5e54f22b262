//! couch_check - is the dog on the couch?
//!
//! Runs the detector on each image given on the command line, evaluates the
//! dog/couch overlap and prints one verdict per image.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::io::IsTerminal;
use std::path::PathBuf;

use couch_nagger::annotate::save_annotated;
use couch_nagger::ui::{Ui, UiMode};
use couch_nagger::{
    CouchVerdict, Detection, Detector, ImageSource, Inspection, OverlapEvaluator, ReplayBackend,
    Settings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    /// YOLOv8 ONNX model via tract (requires the backend-tract feature).
    Tract,
    /// Detections recorded in a JSON file.
    Replay,
}

#[cfg(feature = "backend-tract")]
const DEFAULT_BACKEND: BackendKind = BackendKind::Tract;
#[cfg(not(feature = "backend-tract"))]
const DEFAULT_BACKEND: BackendKind = BackendKind::Replay;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Images to check.
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,
    /// Detector backend. Defaults to tract when built with the backend-tract
    /// feature, replay otherwise.
    #[arg(long, value_enum, default_value_t = DEFAULT_BACKEND)]
    backend: BackendKind,
    /// ONNX model path (overrides MODEL_PATH).
    #[arg(long)]
    model: Option<PathBuf>,
    /// Recorded detections for the replay backend.
    #[arg(long)]
    detections: Option<PathBuf>,
    /// Minimum confidence, 0.0 to 1.0 (overrides CONFIDENCE_THRESHOLD).
    #[arg(long)]
    threshold: Option<f32>,
    /// Print one JSON verdict per line.
    #[arg(long)]
    json: bool,
    /// Also list every detection with its class name.
    #[arg(long)]
    list: bool,
    /// Save annotated copies here (overrides DETECTION_IMAGE_DIR).
    #[arg(long, value_name = "DIR")]
    annotate_dir: Option<PathBuf>,
    /// Progress output style.
    #[arg(long, value_enum, default_value_t = UiMode::Auto)]
    ui: UiMode,
}

#[derive(Serialize)]
struct Report<'a> {
    image: String,
    #[serde(flatten)]
    verdict: &'a CouchVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    detections: Option<&'a [Detection]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotated: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = Settings::load().context("failed to load settings")?;
    if let Some(model) = &args.model {
        settings.model.path = model.clone();
    }

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.log_level.as_str()),
    )
    .init();

    let threshold = args
        .threshold
        .unwrap_or(settings.model.confidence_threshold);
    let annotate_dir = args
        .annotate_dir
        .clone()
        .or_else(|| settings.detection_image_dir.clone());
    let evaluator = settings.evaluator();
    let ui = Ui::new(args.ui, std::io::stderr().is_terminal(), args.json);

    let detector = {
        let _stage = ui.stage("load detector");
        let detector = build_detector(&args, &settings)?;
        detector.warm_up()?;
        detector
    };
    log::info!(
        "backend={} threshold={:.2} dog_class={} couch_class={}",
        detector.backend_name(),
        threshold,
        evaluator.dog.0,
        evaluator.couch.0
    );

    for path in &args.images {
        let _stage = ui.stage(&format!("check {}", path.display()));
        check_one(&detector, &evaluator, path, threshold, annotate_dir.as_deref(), &args)?;
    }
    Ok(())
}

fn build_detector(args: &Args, settings: &Settings) -> Result<Detector> {
    match args.backend {
        BackendKind::Replay => {
            let path = args
                .detections
                .as_ref()
                .ok_or_else(|| anyhow!("--detections is required for the replay backend"))?;
            Ok(Detector::new(ReplayBackend::from_file(path)?))
        }
        BackendKind::Tract => {
            #[cfg(feature = "backend-tract")]
            {
                let backend =
                    couch_nagger::TractBackend::new(&settings.model.path, settings.decode())?;
                Ok(Detector::new(backend))
            }
            #[cfg(not(feature = "backend-tract"))]
            {
                Err(anyhow!(
                    "cannot load {}: the tract backend requires the backend-tract feature",
                    settings.model.path.display()
                ))
            }
        }
    }
}

fn check_one(
    detector: &Detector,
    evaluator: &OverlapEvaluator,
    path: &std::path::Path,
    threshold: f32,
    annotate_dir: Option<&std::path::Path>,
    args: &Args,
) -> Result<()> {
    let Inspection {
        image,
        detections,
        verdict,
    } = evaluator.inspect(detector, &ImageSource::from(path), threshold)?;

    let annotated = match annotate_dir {
        Some(dir) => {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("image");
            Some(save_annotated(dir, name, &image, &detections, &verdict)?)
        }
        None => None,
    };

    if args.json {
        let report = Report {
            image: path.display().to_string(),
            verdict: &verdict,
            detections: args.list.then_some(detections.as_slice()),
            annotated,
        };
        println!("{}", serde_json::to_string(&report)?);
        return Ok(());
    }

    let status = if verdict.dog_on_couch {
        "DOG ON COUCH"
    } else {
        "off couch"
    };
    println!(
        "{}: {} (dog={:.3}, couch={:.3}, overlap={:.2})",
        path.display(),
        status,
        verdict.confidence.dog,
        verdict.confidence.couch,
        verdict.overlap_ratio
    );
    if args.list {
        print_listing(&detections, evaluator);
    }
    if let Some(out) = annotated {
        println!("  annotated: {}", out.display());
    }
    Ok(())
}

fn print_listing(detections: &[Detection], evaluator: &OverlapEvaluator) {
    for det in detections {
        let b = det.bbox;
        println!(
            "  class {:3} | {:15} | conf {:.3} | [{:.1}, {:.1}, {:.1}, {:.1}]",
            det.class_id.0,
            det.class_id.to_string(),
            det.confidence,
            b.x1(),
            b.y1(),
            b.x2(),
            b.y2()
        );
    }
    for (label, class) in [("dog", evaluator.dog), ("couch", evaluator.couch)] {
        let found = detections.iter().any(|d| d.class_id == class);
        println!(
            "  {} (class {}): {}",
            label,
            class.0,
            if found { "FOUND" } else { "NOT FOUND" }
        );
    }
}
