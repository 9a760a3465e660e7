use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::engine::engine::{DetectionEngine, TrainJob};
use crate::error::{Error, Result};

/// Confidence threshold used when the caller does not supply one.
pub const DEFAULT_CONFIDENCE: f32 = 0.25;

/// A detection with its class name resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(rename = "class")]
    pub class_name: String,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in source-image pixels.
    pub bbox: [f32; 4],
}

/// Outcome of `Detector::predict`.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    /// The vocabulary is empty; nothing was run.
    NoClasses,
    Detections(Vec<Detection>),
}

/// Adapter between the service and a `DetectionEngine`.
///
/// Owns argument checking and result shaping; the detection itself is
/// entirely the engine's business.
pub struct Detector {
    engine: Arc<dyn DetectionEngine>,
}

impl Detector {
    pub fn new(engine: Arc<dyn DetectionEngine>) -> Self {
        Detector { engine }
    }

    pub fn set_classes(&self, classes: &[String]) -> Result<()> {
        self.engine.set_classes(classes)?;
        if classes.is_empty() {
            info!("No detection classes set.");
        } else {
            info!(?classes, "Model detection classes updated");
        }
        Ok(())
    }

    /// Runs detection on `image` keeping boxes with `confidence >= threshold`.
    ///
    /// The threshold is validated before the vocabulary is even looked at.
    pub fn predict(&self, image: &Path, threshold: f32) -> Result<Prediction> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::ConfidenceOutOfRange(threshold));
        }
        if self.engine.classes().is_empty() {
            warn!("No detection classes set. Add classes before running detection.");
            return Ok(Prediction::NoClasses);
        }

        debug!(image = %image.display(), threshold, "running detection");
        let inference = self.engine.predict(image, threshold)?;
        if inference.classes.is_empty() {
            return Ok(Prediction::NoClasses);
        }

        let detections = inference
            .detections
            .into_iter()
            .filter(|d| d.confidence >= threshold)
            .filter_map(|d| match inference.classes.get(d.class_id) {
                Some(name) => Some(Detection {
                    class_name: name.clone(),
                    confidence: d.confidence,
                    bbox:       d.bbox,
                }),
                None => {
                    warn!(class_id = d.class_id, "engine returned an unknown class index");
                    None
                }
            })
            .collect();

        Ok(Prediction::Detections(detections))
    }

    /// Hot-swaps the active weights. The vocabulary is preserved.
    pub fn load_weights(&self, weights: &Path) -> Result<()> {
        self.engine.load_weights(weights)?;
        info!(weights = %weights.display(), "model weights swapped");
        Ok(())
    }

    pub fn train(&self, job: &TrainJob) -> Result<()> {
        self.engine.train(job)
    }

    pub fn weights(&self) -> PathBuf {
        self.engine.weights()
    }

    pub fn classes(&self) -> Vec<String> {
        self.engine.classes()
    }
}
