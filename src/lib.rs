pub mod app;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod http;
pub mod render;
pub mod train;
pub mod vocab;

// Convenience re-exports
pub use app::AppContext;
pub use config::AppConfig;
pub use engine::{Detection, DetectionEngine, Detector, Prediction, ProcessEngine};
pub use error::{Error, Result};
pub use render::AnnotationRenderer;
pub use train::{FineTuner, TrainingStatus};
pub use vocab::VocabularyStore;
