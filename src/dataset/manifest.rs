use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::dataset::layout::DatasetLayout;
use crate::dataset::registry::ClassRegistry;
use crate::error::Result;

/// Dataset description consumed by the trainer.
///
/// Field names follow the Ultralytics `data.yaml` keys. `train` and `val`
/// are both the image directory: the dataset is not split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingManifest {
    /// Where this manifest was written; not part of the file itself.
    #[serde(skip)]
    pub file: PathBuf,
    /// Dataset root.
    pub path: PathBuf,
    pub train: String,
    pub val: String,
    /// Number of classes.
    pub nc: usize,
    pub names: Vec<String>,
}

/// Derives `data.yaml` from the class registry.
pub struct ManifestBuilder {
    layout: DatasetLayout,
}

impl ManifestBuilder {
    pub fn new(layout: DatasetLayout) -> Self {
        ManifestBuilder { layout }
    }

    /// Where the manifest is written.
    pub fn manifest_path(&self) -> PathBuf {
        self.layout.manifest_file()
    }

    /// Regenerates the manifest in full.
    ///
    /// Returns `Ok(None)` when the registry is missing or empty; there is
    /// nothing to train on and no file is written.
    pub fn build(&self) -> Result<Option<TrainingManifest>> {
        let registry = ClassRegistry::load(self.layout.classes_file())?;
        if registry.is_empty() {
            return Ok(None);
        }

        let path = self.manifest_path();
        let manifest = TrainingManifest {
            file:  path.clone(),
            path:  absolute(self.layout.root()),
            train: "images".into(),
            val:   "images".into(),
            nc:    registry.len(),
            names: registry.classes().to_vec(),
        };

        // JSON is valid YAML, so the trainer reads this file as-is.
        let file = std::fs::File::create(&path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &manifest)?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        info!(path = %path.display(), classes = manifest.nc, "training manifest written");
        Ok(Some(manifest))
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| match std::env::current_dir() {
        Ok(cwd) => cwd.join(path),
        Err(_) => path.to_path_buf(),
    })
}
