use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Local;
use tracing::info;

use crate::dataset::label::{LabelingData, YoloLabel};
use crate::dataset::layout::DatasetLayout;
use crate::dataset::registry::ClassRegistry;
use crate::error::Result;

/// What `LabelPipeline::submit` wrote.
#[derive(Debug, Clone)]
pub struct SavedLabels {
    pub image_path: PathBuf,
    pub label_path: PathBuf,
    pub total_labels: usize,
    /// Class names appended to the registry by this submission.
    pub new_classes: Vec<String>,
}

/// Turns user-drawn pixel boxes into YOLO image/label pairs on disk.
///
/// Submissions are serialized: the registry read, any append, the registry
/// rewrite and the pair write all happen under one lock.
pub struct LabelPipeline {
    layout: DatasetLayout,
    lock:   Mutex<()>,
}

impl LabelPipeline {
    pub fn new(layout: DatasetLayout) -> Self {
        LabelPipeline { layout, lock: Mutex::new(()) }
    }

    pub fn layout(&self) -> &DatasetLayout {
        &self.layout
    }

    /// Writes `image_bytes` and its annotation file into the dataset.
    ///
    /// `original_name` is the uploaded file name; only its final path
    /// component is kept. Callers validate `data` (non-empty boxes, positive
    /// dimensions, non-blank labels) beforehand.
    pub fn submit(&self, image_bytes: &[u8], original_name: &str, data: &LabelingData) -> Result<SavedLabels> {
        let _guard = self.serialize();
        self.layout.ensure_dirs()?;

        let mut registry = ClassRegistry::load(self.layout.classes_file())?;
        let mut new_classes = Vec::new();
        let mut lines = Vec::with_capacity(data.boxes.len());
        for b in &data.boxes {
            let name = b.label.trim();
            let (class_id, created) = registry.get_or_create_id(name)?;
            if created {
                new_classes.push(name.to_owned());
            }
            let label = YoloLabel::from_box(b, class_id, data.image_width, data.image_height);
            lines.push(label.to_string());
        }
        if !new_classes.is_empty() {
            registry.save()?;
            info!(?new_classes, "registered new label classes");
        }

        let (image_name, label_name) = pair_names(original_name);
        let image_path = self.layout.images_dir().join(&image_name);
        let label_path = self.layout.labels_dir().join(&label_name);

        std::fs::write(&image_path, image_bytes)?;
        let mut text = lines.join("\n");
        text.push('\n');
        std::fs::write(&label_path, text)?;

        info!(
            image = %image_path.display(),
            labels = lines.len(),
            "saved labeled image"
        );

        Ok(SavedLabels {
            image_path,
            label_path,
            total_labels: lines.len(),
            new_classes,
        })
    }

    fn serialize(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// `({timestamp}_{basename}, {timestamp}_{stem}.txt)` for an upload name.
fn pair_names(original_name: &str) -> (String, String) {
    let timestamp = Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();
    let basename = sanitize_basename(original_name);
    let stem = Path::new(&basename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image")
        .to_owned();
    (
        format!("{}_{}", timestamp, basename),
        format!("{}_{}.txt", timestamp, stem),
    )
}

/// Final path component of `name` with anything outside `[A-Za-z0-9._-]`
/// replaced by `_`. Names without an extension get `.jpg`.
pub fn sanitize_basename(name: &str) -> String {
    let last = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");
    let cleaned: String = last
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        return "image.jpg".to_owned();
    }
    if Path::new(cleaned).extension().is_none() {
        format!("{}.jpg", cleaned)
    } else {
        cleaned.to_owned()
    }
}
