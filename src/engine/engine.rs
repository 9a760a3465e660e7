use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One box as reported by an engine, before class names are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDetection {
    /// Index into the vocabulary the engine predicted with.
    pub class_id: usize,
    pub confidence: f32,
    /// `[x1, y1, x2, y2]` in source-image pixels.
    pub bbox: [f32; 4],
}

/// Result of a single `predict` call.
///
/// `classes` is the vocabulary snapshot the engine actually used, so
/// `class_id` can be resolved even if the vocabulary changed meanwhile.
#[derive(Debug, Clone, Default)]
pub struct Inference {
    pub classes: Vec<String>,
    pub detections: Vec<RawDetection>,
}

/// Everything the engine needs to run one fine-tuning pass.
#[derive(Debug, Clone)]
pub struct TrainJob {
    /// Manifest file (`data.yaml`) describing the dataset.
    pub data: PathBuf,
    pub epochs: u32,
    /// Directory the engine writes its run directory into.
    pub project: PathBuf,
}

/// Narrow capability interface over a pretrained open-vocabulary detector.
///
/// Implementations keep their active vocabulary and weight pointer behind
/// a read-write lock and hold it only to snapshot or swap, so `predict` and
/// `train` may run concurrently with `set_classes` and `load_weights`.
pub trait DetectionEngine: Send + Sync {
    /// Replaces the active vocabulary. An empty slice leaves the engine
    /// without an active vocabulary rather than failing.
    fn set_classes(&self, classes: &[String]) -> Result<()>;

    /// Runs inference on the image at `image`, returning boxes whose
    /// confidence is at least `confidence`.
    fn predict(&self, image: &Path, confidence: f32) -> Result<Inference>;

    /// Fine-tunes the current weights on the dataset described by `job`.
    fn train(&self, job: &TrainJob) -> Result<()>;

    /// Swaps the active weights, keeping the active vocabulary.
    fn load_weights(&self, weights: &Path) -> Result<()>;

    /// Currently loaded weights.
    fn weights(&self) -> PathBuf;

    /// Currently active vocabulary.
    fn classes(&self) -> Vec<String>;
}
