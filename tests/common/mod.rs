mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from vocab_detect for tests
pub use vocab_detect::config::AppConfig;
pub use vocab_detect::dataset::{DatasetLayout, LabelBox, LabelingData, YoloLabel};
pub use vocab_detect::engine::{Detection, DetectionEngine, Detector, Inference, Prediction, RawDetection, TrainJob};
pub use vocab_detect::http::{ApiRequest, ApiResponse};
pub use vocab_detect::render::AnnotationRenderer;
pub use vocab_detect::train::TrainingStatus;
pub use vocab_detect::{AppContext, Error};
