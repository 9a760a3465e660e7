#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use image::{ImageBuffer, Rgb};
use tempfile::{NamedTempFile, TempDir};
use tiny_http::Method;

use vocab_detect::config::AppConfig;
use vocab_detect::dataset::{LabelBox, LabelingData};
use vocab_detect::engine::{DetectionEngine, Inference, RawDetection, TrainJob};
use vocab_detect::error::{Error, Result};
use vocab_detect::http::ApiRequest;
use vocab_detect::render::AnnotationRenderer;
use vocab_detect::AppContext;

/// What `FakeEngine::train` does when called.
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOutcome {
    /// Creates `project/<run>/weights/best.pt`.
    WriteBest,
    /// Creates a run directory without a checkpoint.
    NoWeights,
    Fail(String),
}

#[derive(Debug)]
struct FakeState {
    weights: PathBuf,
    classes: Vec<String>,
    scripted: Vec<RawDetection>,
    predict_error: Option<String>,
    train_outcome: TrainOutcome,
    last_job: Option<TrainJob>,
}

/// In-memory `DetectionEngine` returning scripted detections.
#[derive(Debug)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
    predict_calls: AtomicUsize,
    train_calls: AtomicUsize,
}

impl FakeEngine {
    pub fn new(weights: &str) -> Self {
        FakeEngine {
            state: Mutex::new(FakeState {
                weights: PathBuf::from(weights),
                classes: Vec::new(),
                scripted: Vec::new(),
                predict_error: None,
                train_outcome: TrainOutcome::WriteBest,
                last_job: None,
            }),
            predict_calls: AtomicUsize::new(0),
            train_calls: AtomicUsize::new(0),
        }
    }

    /// Detections every later `predict` returns, before threshold filtering.
    pub fn script(&self, detections: Vec<RawDetection>) {
        self.state.lock().unwrap().scripted = detections;
    }

    /// Makes every later `predict` fail with `Error::Engine(message)`.
    pub fn fail_predict(&self, message: &str) {
        self.state.lock().unwrap().predict_error = Some(message.to_string());
    }

    pub fn set_train_outcome(&self, outcome: TrainOutcome) {
        self.state.lock().unwrap().train_outcome = outcome;
    }

    pub fn predict_calls(&self) -> usize {
        self.predict_calls.load(Ordering::SeqCst)
    }

    pub fn train_calls(&self) -> usize {
        self.train_calls.load(Ordering::SeqCst)
    }

    pub fn last_job(&self) -> Option<TrainJob> {
        self.state.lock().unwrap().last_job.clone()
    }
}

impl DetectionEngine for FakeEngine {
    fn set_classes(&self, classes: &[String]) -> Result<()> {
        self.state.lock().unwrap().classes = classes.to_vec();
        Ok(())
    }

    fn predict(&self, image: &Path, _confidence: f32) -> Result<Inference> {
        self.predict_calls.fetch_add(1, Ordering::SeqCst);
        assert!(image.is_file(), "engine was handed a missing image: {}", image.display());
        let state = self.state.lock().unwrap();
        if let Some(message) = &state.predict_error {
            return Err(Error::Engine(message.clone()));
        }
        Ok(Inference { classes: state.classes.clone(), detections: state.scripted.clone() })
    }

    fn train(&self, job: &TrainJob) -> Result<()> {
        self.train_calls.fetch_add(1, Ordering::SeqCst);
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.last_job = Some(job.clone());
            state.train_outcome.clone()
        };
        let run_dir = job.project.join(format!("train{}", self.train_calls()));
        match outcome {
            TrainOutcome::WriteBest => {
                std::fs::create_dir_all(run_dir.join("weights"))?;
                std::fs::write(run_dir.join("weights").join("best.pt"), b"weights")?;
                Ok(())
            }
            TrainOutcome::NoWeights => {
                std::fs::create_dir_all(&run_dir)?;
                Ok(())
            }
            TrainOutcome::Fail(msg) => Err(Error::Engine(msg)),
        }
    }

    fn load_weights(&self, weights: &Path) -> Result<()> {
        if !weights.is_file() {
            return Err(Error::Engine(format!("weights file not found: {}", weights.display())));
        }
        self.state.lock().unwrap().weights = weights.to_path_buf();
        Ok(())
    }

    fn weights(&self) -> PathBuf {
        self.state.lock().unwrap().weights.clone()
    }

    fn classes(&self) -> Vec<String> {
        self.state.lock().unwrap().classes.clone()
    }
}

pub fn raw(class_id: usize, confidence: f32, bbox: [f32; 4]) -> RawDetection {
    RawDetection { class_id, confidence, bbox }
}

/// A service context over a fake engine, with all state under a temp dir.
/// Keep the `TempDir` alive for the duration of the test.
pub fn create_test_context() -> (AppContext, Arc<FakeEngine>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp directory");
    let (ctx, engine) = context_in(dir.path());
    (ctx, engine, dir)
}

/// A context rooted at `root`, e.g. to reload state written earlier.
pub fn context_in(root: &Path) -> (AppContext, Arc<FakeEngine>) {
    let engine = Arc::new(FakeEngine::new("yolov8s-world.pt"));
    let config = AppConfig::rooted_at(root);
    let ctx = AppContext::with_renderer(config, engine.clone(), AnnotationRenderer::without_font())
        .expect("Failed to create test context");
    (ctx, engine)
}

/// Encoded bytes of a `width`x`height` solid-color PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = ImageBuffer::from_fn(width, height, |_, _| Rgb([255u8, 0u8, 0u8]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("Failed to encode test image");
    buf.into_inner()
}

/// Creates a 100x100 red test image and returns the temp file.
/// The file will be automatically cleaned up when dropped.
pub fn create_test_image() -> NamedTempFile {
    let img = ImageBuffer::from_fn(100, 100, |_, _| Rgb([255u8, 0u8, 0u8]));
    let file = tempfile::Builder::new()
        .suffix(".png")
        .tempfile()
        .expect("Failed to create temp image file");
    img.save_with_format(file.path(), image::ImageFormat::Png)
        .expect("Failed to save test image");
    file
}

pub fn label_box(label: &str, x1: f64, y1: f64, x2: f64, y2: f64) -> LabelBox {
    LabelBox { x1, y1, x2, y2, label: label.to_string() }
}

pub fn labeling(boxes: Vec<LabelBox>, width: f64, height: f64) -> LabelingData {
    LabelingData { boxes, image_width: width, image_height: height }
}

pub const BOUNDARY: &str = "----vocabdetecttestboundary";

/// One field of a multipart body under construction.
pub enum FormPart<'a> {
    Text { name: &'a str, value: &'a str },
    File { name: &'a str, filename: &'a str, content_type: &'a str, data: &'a [u8] },
}

/// Encodes `parts` as a `multipart/form-data` body using `BOUNDARY`.
pub fn multipart_body(parts: &[FormPart]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            FormPart::Text { name, value } => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                );
                body.extend_from_slice(value.as_bytes());
            }
            FormPart::File { name, filename, content_type, data } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
            }
        }
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}

/// A multipart POST to `url`.
pub fn multipart_request(url: &str, parts: &[FormPart]) -> ApiRequest {
    ApiRequest::new(Method::Post, url).with_body(&multipart_content_type(), multipart_body(parts))
}

pub fn json_request(method: Method, url: &str, body: serde_json::Value) -> ApiRequest {
    ApiRequest::new(method, url).with_body("application/json", body.to_string())
}

/// The `image` file part for a PNG upload.
pub fn image_part(data: &[u8]) -> FormPart<'_> {
    FormPart::File { name: "image", filename: "photo.png", content_type: "image/png", data }
}

/// `detail` of an error response body.
pub fn detail(resp: &vocab_detect::http::ApiResponse) -> String {
    resp.body
        .as_ref()
        .and_then(|b| b["detail"].as_str())
        .unwrap_or_default()
        .to_string()
}
