use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::engine::engine::{DetectionEngine, Inference, RawDetection, TrainJob};
use crate::error::{Error, Result};

/// Weights and vocabulary the next call will use.
#[derive(Debug, Clone)]
struct ActiveModel {
    weights: PathBuf,
    classes: Vec<String>,
}

/// Detection engine backed by an external worker process.
///
/// Every `predict` / `train` spawns the configured command, writes a single
/// JSON request to its stdin and reads a single JSON response from stdout.
/// The worker is stateless: the active weights and vocabulary travel with
/// each request.
///
/// Predict request / response:
/// ```text
/// {"op":"predict","weights":"...","classes":["person"],"image":"...","confidence":0.25}
/// {"detections":[{"class_id":0,"confidence":0.91,"bbox":[x1,y1,x2,y2]}]}
/// ```
///
/// Train request / response:
/// ```text
/// {"op":"train","weights":"...","classes":[...],"data":"data.yaml","epochs":50,"project":"runs/detect"}
/// {"save_dir":"runs/detect/train3"}
/// ```
pub struct ProcessEngine {
    program: String,
    args:    Vec<String>,
    active:  RwLock<ActiveModel>,
}

#[derive(Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum WorkerRequest<'a> {
    Predict {
        weights:    &'a Path,
        classes:    &'a [String],
        image:      &'a Path,
        confidence: f32,
    },
    Train {
        weights: &'a Path,
        classes: &'a [String],
        data:    &'a Path,
        epochs:  u32,
        project: &'a Path,
    },
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Deserialize)]
struct TrainResponse {
    #[serde(default)]
    save_dir: Option<String>,
}

impl ProcessEngine {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String], weights: impl Into<PathBuf>) -> Result<Self> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| Error::Engine("engine command is empty".into()))?;
        Ok(ProcessEngine {
            program: program.clone(),
            args:    args.to_vec(),
            active:  RwLock::new(ActiveModel { weights: weights.into(), classes: Vec::new() }),
        })
    }

    fn snapshot(&self) -> ActiveModel {
        match self.active.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn update<F: FnOnce(&mut ActiveModel)>(&self, f: F) {
        match self.active.write() {
            Ok(mut guard) => f(&mut guard),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    /// Runs the worker once and returns its stdout.
    fn call(&self, request: &WorkerRequest) -> Result<Vec<u8>> {
        let payload = serde_json::to_vec(request)?;

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::Engine(format!("failed to start '{}': {}", self.program, e)))?;

        // Dropping stdin closes the pipe so the worker sees EOF. A failed
        // write is reported only after the child has been reaped.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(&payload),
            None => Ok(()),
        };

        let output = child.wait_with_output()?;
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "vocab_detect::worker", "{}", line);
        }

        if !output.status.success() {
            let tail: Vec<&str> = stderr.lines().rev().take(5).collect();
            let tail: Vec<&str> = tail.into_iter().rev().collect();
            return Err(Error::Engine(format!(
                "worker exited with {}: {}",
                output.status,
                tail.join(" | ")
            )));
        }
        if let Err(e) = written {
            return Err(Error::Engine(format!("failed to send request to worker: {}", e)));
        }
        Ok(output.stdout)
    }
}

impl DetectionEngine for ProcessEngine {
    fn set_classes(&self, classes: &[String]) -> Result<()> {
        let classes = classes.to_vec();
        self.update(|active| active.classes = classes);
        Ok(())
    }

    fn predict(&self, image: &Path, confidence: f32) -> Result<Inference> {
        let active = self.snapshot();
        if active.classes.is_empty() {
            return Ok(Inference::default());
        }

        let stdout = self.call(&WorkerRequest::Predict {
            weights: &active.weights,
            classes: &active.classes,
            image,
            confidence,
        })?;
        let response: PredictResponse = serde_json::from_slice(&stdout)
            .map_err(|e| Error::Engine(format!("unreadable predict response: {}", e)))?;

        Ok(Inference { classes: active.classes, detections: response.detections })
    }

    fn train(&self, job: &TrainJob) -> Result<()> {
        let active = self.snapshot();
        info!(
            data = %job.data.display(),
            epochs = job.epochs,
            weights = %active.weights.display(),
            "starting worker training run"
        );

        let stdout = self.call(&WorkerRequest::Train {
            weights: &active.weights,
            classes: &active.classes,
            data:    &job.data,
            epochs:  job.epochs,
            project: &job.project,
        })?;
        let response: TrainResponse = serde_json::from_slice(&stdout)
            .map_err(|e| Error::Engine(format!("unreadable train response: {}", e)))?;
        if let Some(dir) = response.save_dir {
            info!(save_dir = %dir, "worker training run finished");
        }
        Ok(())
    }

    fn load_weights(&self, weights: &Path) -> Result<()> {
        if !weights.is_file() {
            return Err(Error::Engine(format!("weights file not found: {}", weights.display())));
        }
        let weights = weights.to_path_buf();
        self.update(|active| active.weights = weights);
        Ok(())
    }

    fn weights(&self) -> PathBuf {
        self.snapshot().weights
    }

    fn classes(&self) -> Vec<String> {
        self.snapshot().classes
    }
}
