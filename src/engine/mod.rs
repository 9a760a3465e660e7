pub mod detector;
pub mod engine;
pub mod process;

pub use detector::{Detection, Detector, Prediction, DEFAULT_CONFIDENCE};
pub use engine::{DetectionEngine, Inference, RawDetection, TrainJob};
pub use process::ProcessEngine;
