use std::path::PathBuf;

use serde::Serialize;

/// Lifecycle of the fine-tuning orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrainingStatus {
    /// No training has been started yet.
    Idle,
    /// A run is in progress; further starts are rejected.
    Running {
        epochs: u32,
        started_at: String,
    },
    /// The last run completed. `best_weights` is set when the model was
    /// hot-swapped to the run's best checkpoint.
    Done {
        epochs: u32,
        elapsed_ms: u64,
        best_weights: Option<PathBuf>,
    },
    /// The last run failed; the previous weights stay active.
    Failed {
        reason: String,
    },
}

impl TrainingStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, TrainingStatus::Running { .. })
    }
}
