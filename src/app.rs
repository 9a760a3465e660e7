use std::sync::Arc;

use tracing::{info, warn};

use crate::config::AppConfig;
use crate::dataset::{collect_stats, DatasetLayout, DatasetStats, LabelPipeline, LabelingData, ManifestBuilder, SavedLabels};
use crate::engine::{DetectionEngine, Detector};
use crate::error::{Error, Result};
use crate::render::AnnotationRenderer;
use crate::train::{FineTuner, TrainingSummary};
use crate::vocab::VocabularyStore;

/// Everything one running service owns, shared across request threads
/// behind an `Arc`.
pub struct AppContext {
    pub config:     AppConfig,
    pub detector:   Arc<Detector>,
    pub vocabulary: VocabularyStore,
    pub labels:     LabelPipeline,
    pub manifests:  ManifestBuilder,
    pub trainer:    FineTuner,
    pub renderer:   AnnotationRenderer,
}

impl AppContext {
    pub fn new(config: AppConfig, engine: Arc<dyn DetectionEngine>) -> Result<Self> {
        let renderer = AnnotationRenderer::new(config.font_path.as_deref());
        Self::with_renderer(config, engine, renderer)
    }

    pub fn with_renderer(
        config: AppConfig,
        engine: Arc<dyn DetectionEngine>,
        renderer: AnnotationRenderer,
    ) -> Result<Self> {
        std::fs::create_dir_all(&config.temp_dir)?;

        let detector = Arc::new(Detector::new(engine));
        let vocabulary = VocabularyStore::load(config.vocab_file.clone(), detector.clone())?;
        let layout = DatasetLayout::new(config.dataset_root.clone());
        layout.ensure_dirs()?;

        info!(
            model = %detector.weights().display(),
            vocab = %config.vocab_file.display(),
            dataset = %config.dataset_root.display(),
            "application context ready"
        );

        Ok(AppContext {
            labels:    LabelPipeline::new(layout.clone()),
            manifests: ManifestBuilder::new(layout),
            trainer:   FineTuner::new(detector.clone(), config.runs_dir.clone()),
            config,
            detector,
            vocabulary,
            renderer,
        })
    }

    /// Persists a labeled image, then proposes its labels to the vocabulary.
    ///
    /// The vocabulary update is best-effort: a failure is logged and the
    /// saved labels are still returned.
    pub fn submit_labels(&self, image_bytes: &[u8], original_name: &str, data: &LabelingData) -> Result<SavedLabels> {
        let saved = self.labels.submit(image_bytes, original_name, data)?;

        let unseen: Vec<&str> = data
            .boxes
            .iter()
            .map(|b| b.label.trim())
            .filter(|l| !l.is_empty() && !self.vocabulary.contains(l))
            .collect();
        if !unseen.is_empty() {
            match self.vocabulary.add(&unseen) {
                Ok(_) => info!(classes = ?unseen, "added labeled classes to the vocabulary"),
                Err(e) => warn!(error = %e, "could not add labeled classes to the vocabulary"),
            }
        }
        Ok(saved)
    }

    /// Builds the manifest and runs fine-tuning for `epochs` epochs.
    ///
    /// The manifest is rewritten only after the run slot is taken.
    pub fn start_training(&self, epochs: u32) -> Result<TrainingSummary> {
        self.trainer
            .start_with(epochs, || self.manifests.build()?.ok_or(Error::NoTrainingData))
    }

    pub fn dataset_stats(&self) -> Result<DatasetStats> {
        collect_stats(self.labels.layout())
    }
}
