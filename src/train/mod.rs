pub mod orchestrator;
pub mod runs;
pub mod status;

pub use orchestrator::{validate_epochs, FineTuner, TrainingSummary, DEFAULT_EPOCHS, MAX_EPOCHS, MIN_EPOCHS};
pub use status::TrainingStatus;
