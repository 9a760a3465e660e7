use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::dataset::label::YoloLabel;
use crate::dataset::layout::{is_image_file, DatasetLayout};
use crate::dataset::registry::ClassRegistry;
use crate::error::Result;

/// Snapshot of the labeled dataset, as served by `/training/data/stats`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetStats {
    pub total_images: usize,
    /// Annotation lines across all label files.
    pub total_labels: usize,
    pub classes: Vec<String>,
    /// Annotation lines per class name.
    pub class_counts: BTreeMap<String, usize>,
    pub data_directory: String,
}

/// Walks `images/` and `labels/` and tallies what is there.
///
/// Missing directories count as empty. Label lines with an id outside the
/// registry are counted under `"class_<id>"`.
pub fn collect_stats(layout: &DatasetLayout) -> Result<DatasetStats> {
    let registry = ClassRegistry::load(layout.classes_file())?;
    let classes = registry.classes().to_vec();

    let total_images = list_files(&layout.images_dir())?
        .iter()
        .filter(|p| is_image_file(p))
        .count();

    let mut total_labels = 0;
    let mut class_counts: BTreeMap<String, usize> =
        classes.iter().map(|c| (c.clone(), 0)).collect();

    for path in list_files(&layout.labels_dir())? {
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let text = std::fs::read_to_string(&path)?;
        for label in text.lines().filter_map(YoloLabel::parse) {
            total_labels += 1;
            let name = classes
                .get(label.class_id)
                .cloned()
                .unwrap_or_else(|| format!("class_{}", label.class_id));
            *class_counts.entry(name).or_insert(0) += 1;
        }
    }

    Ok(DatasetStats {
        total_images,
        total_labels,
        classes,
        class_counts,
        data_directory: layout.root().display().to_string(),
    })
}

fn list_files(dir: &Path) -> Result<Vec<std::path::PathBuf>> {
    match std::fs::read_dir(dir) {
        Ok(entries) => Ok(entries
            .flatten()
            .map(|e| e.path())
            .filter(|p| p.is_file())
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}
