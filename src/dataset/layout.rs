use std::path::{Path, PathBuf};

use crate::error::Result;

/// File extensions counted as dataset images.
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// On-disk layout of the YOLO dataset:
///
/// ```text
/// <root>/
///   images/      uploaded images
///   labels/      one .txt per image, same stem
///   classes.txt  class registry, line number = class id
///   data.yaml    generated training manifest
/// ```
#[derive(Debug, Clone)]
pub struct DatasetLayout {
    root: PathBuf,
}

impl DatasetLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DatasetLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }

    pub fn labels_dir(&self) -> PathBuf {
        self.root.join("labels")
    }

    pub fn classes_file(&self) -> PathBuf {
        self.root.join("classes.txt")
    }

    pub fn manifest_file(&self) -> PathBuf {
        self.root.join("data.yaml")
    }

    /// Creates `images/` and `labels/` if they are missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(self.images_dir())?;
        std::fs::create_dir_all(self.labels_dir())?;
        Ok(())
    }
}

pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|ext| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
