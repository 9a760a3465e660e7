use thiserror::Error;

/// Errors produced by the detection, labeling and training layers.
///
/// The HTTP layer maps each variant onto a status code; see
/// `http::response::ApiError`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Detection engine error: {0}")]
    Engine(String),

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("Confidence must be between 0.0 and 1.0, got {0}")]
    ConfidenceOutOfRange(f32),

    #[error("Epochs must be between {min} and {max}, got {got}")]
    EpochsOutOfRange { got: u32, min: u32, max: u32 },

    #[error("A training run is already in progress")]
    TrainingInProgress,

    #[error("Invalid class label {0:?}: labels must be a single line")]
    InvalidLabel(String),

    #[error("No training data available. Please submit labeled images first.")]
    NoTrainingData,

    #[error("Training failed: {0}")]
    Training(String),
}

pub type Result<T> = std::result::Result<T, Error>;
