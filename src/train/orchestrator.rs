use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::dataset::TrainingManifest;
use crate::engine::{Detector, TrainJob};
use crate::error::{Error, Result};
use crate::train::runs::{best_weights, latest_run_dir};
use crate::train::status::TrainingStatus;

pub const MIN_EPOCHS: u32 = 1;
pub const MAX_EPOCHS: u32 = 500;
pub const DEFAULT_EPOCHS: u32 = 50;

/// Outcome of a successful fine-tuning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingSummary {
    pub epochs: u32,
    pub elapsed_ms: u64,
    /// Newest run directory found after training, if any.
    pub run_dir: Option<PathBuf>,
    /// Checkpoint the detector now runs on, if one was found.
    pub best_weights: Option<PathBuf>,
}

/// Runs fine-tuning through the detector's engine and hot-swaps the
/// resulting weights. One run at a time.
pub struct FineTuner {
    detector: Arc<Detector>,
    runs_dir: PathBuf,
    status:   Mutex<TrainingStatus>,
}

/// Marks the tuner as running; if dropped while still running (the engine
/// panicked) the status falls back to `Failed`.
struct RunGuard<'a> {
    tuner:    &'a FineTuner,
    previous: TrainingStatus,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.tuner.lock_status();
        if status.is_running() {
            *status = TrainingStatus::Failed { reason: "training was interrupted".into() };
        }
    }
}

pub fn validate_epochs(epochs: u32) -> Result<()> {
    if (MIN_EPOCHS..=MAX_EPOCHS).contains(&epochs) {
        Ok(())
    } else {
        Err(Error::EpochsOutOfRange { got: epochs, min: MIN_EPOCHS, max: MAX_EPOCHS })
    }
}

impl FineTuner {
    pub fn new(detector: Arc<Detector>, runs_dir: impl Into<PathBuf>) -> Self {
        FineTuner {
            detector,
            runs_dir: runs_dir.into(),
            status:   Mutex::new(TrainingStatus::Idle),
        }
    }

    pub fn status(&self) -> TrainingStatus {
        self.lock_status().clone()
    }

    pub fn runs_dir(&self) -> &std::path::Path {
        &self.runs_dir
    }

    /// Fine-tunes on `manifest` for `epochs` epochs, blocking until done.
    ///
    /// Epochs outside `1..=500` are rejected before anything runs, as is a
    /// start while another run is active. Engine failures are reported as
    /// `Error::Training`; the previously loaded weights stay active.
    pub fn start(&self, manifest: &TrainingManifest, epochs: u32) -> Result<TrainingSummary> {
        self.start_with(epochs, || Ok(manifest.clone()))
    }

    /// Like `start`, but the manifest is produced by `prepare` only once the
    /// run slot is held, so a rejected start never touches the dataset files.
    ///
    /// If `prepare` fails the previous status is restored and its error is
    /// returned unchanged.
    pub fn start_with<F>(&self, epochs: u32, prepare: F) -> Result<TrainingSummary>
    where
        F: FnOnce() -> Result<TrainingManifest>,
    {
        validate_epochs(epochs)?;
        let guard = self.begin(epochs)?;
        let manifest = match prepare() {
            Ok(manifest) => manifest,
            Err(e) => {
                *self.lock_status() = guard.previous.clone();
                return Err(e);
            }
        };

        info!(
            manifest = %manifest.file.display(),
            classes = manifest.nc,
            epochs,
            "starting fine-tuning"
        );
        let t_start = Instant::now();

        match self.run(&manifest, epochs) {
            Ok((run_dir, best)) => {
                let elapsed_ms = t_start.elapsed().as_millis() as u64;
                *self.lock_status() = TrainingStatus::Done {
                    epochs,
                    elapsed_ms,
                    best_weights: best.clone(),
                };
                info!(elapsed_ms, ?best, "fine-tuning finished");
                Ok(TrainingSummary { epochs, elapsed_ms, run_dir, best_weights: best })
            }
            Err(e) => {
                error!(error = %e, "fine-tuning failed");
                *self.lock_status() = TrainingStatus::Failed { reason: e.to_string() };
                Err(Error::Training(e.to_string()))
            }
        }
    }

    fn begin(&self, epochs: u32) -> Result<RunGuard<'_>> {
        let mut status = self.lock_status();
        if status.is_running() {
            return Err(Error::TrainingInProgress);
        }
        let previous = std::mem::replace(
            &mut *status,
            TrainingStatus::Running {
                epochs,
                started_at: Local::now().to_rfc3339(),
            },
        );
        Ok(RunGuard { tuner: self, previous })
    }

    fn run(&self, manifest: &TrainingManifest, epochs: u32) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
        std::fs::create_dir_all(&self.runs_dir)?;
        self.detector.train(&TrainJob {
            data:    manifest.file.clone(),
            epochs,
            project: self.runs_dir.clone(),
        })?;

        let run_dir = latest_run_dir(&self.runs_dir);
        let best = run_dir.as_deref().and_then(best_weights);
        match &best {
            Some(weights) => self.detector.load_weights(weights)?,
            None => warn!(runs_dir = %self.runs_dir.display(), "no best weights found; keeping current model"),
        }
        Ok((run_dir, best))
    }

    fn lock_status(&self) -> MutexGuard<'_, TrainingStatus> {
        match self.status.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
