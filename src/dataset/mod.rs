pub mod label;
pub mod layout;
pub mod manifest;
pub mod pipeline;
pub mod registry;
pub mod stats;

pub use label::{LabelBox, LabelingData, YoloLabel};
pub use layout::DatasetLayout;
pub use manifest::{ManifestBuilder, TrainingManifest};
pub use pipeline::{LabelPipeline, SavedLabels};
pub use registry::ClassRegistry;
pub use stats::{collect_stats, DatasetStats};
