use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::engine::Detector;
use crate::error::Result;

/// Trims each name, drops blanks and duplicates, keeping first-seen order.
pub fn normalize_classes<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        let name = name.as_ref().trim();
        if !name.is_empty() && !out.iter().any(|n| n == name) {
            out.push(name.to_owned());
        }
    }
    out
}

/// The set of class names the detector is configured to recognize.
///
/// Every mutation pushes the full vocabulary to the detector and then
/// rewrites the vocabulary file. The internal lock is held across both
/// steps so memory, engine and file stay in agreement.
pub struct VocabularyStore {
    path:     PathBuf,
    detector: Arc<Detector>,
    classes:  Mutex<Vec<String>>,
}

impl VocabularyStore {
    /// Loads the vocabulary from `path` and pushes it to `detector`.
    ///
    /// A missing file yields an empty vocabulary. A corrupt or wrongly
    /// shaped file is logged and also yields an empty vocabulary.
    pub fn load(path: impl Into<PathBuf>, detector: Arc<Detector>) -> Result<Self> {
        let path = path.into();
        let classes = read_vocab_file(&path);
        if !classes.is_empty() {
            info!(?classes, "Loaded custom vocabulary");
        }
        detector.set_classes(&classes)?;
        Ok(VocabularyStore { path, detector, classes: Mutex::new(classes) })
    }

    /// Unions `names` (trimmed, blanks dropped) into the vocabulary.
    ///
    /// Returns the vocabulary after the update. If the detector rejects the
    /// new set the vocabulary is left untouched.
    pub fn add<S: AsRef<str>>(&self, names: &[S]) -> Result<Vec<String>> {
        let mut classes = self.lock();
        let mut updated = classes.clone();
        for name in normalize_classes(names) {
            if !updated.contains(&name) {
                updated.push(name);
            }
        }

        self.detector.set_classes(&updated)?;
        *classes = updated;
        self.persist(&classes)?;
        Ok(classes.clone())
    }

    /// Empties the vocabulary.
    pub fn clear(&self) -> Result<()> {
        let mut classes = self.lock();
        self.detector.set_classes(&[])?;
        classes.clear();
        self.persist(&classes)
    }

    pub fn get(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|c| c == name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        match self.classes.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, classes: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::File::create(&self.path)?;
        let mut writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, classes)?;
        writer.flush()?;
        info!(path = %self.path.display(), "Custom vocabulary saved");
        Ok(())
    }
}

fn read_vocab_file(path: &Path) -> Vec<String> {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "could not read vocabulary file");
            return Vec::new();
        }
    };

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Array(items)) => {
            let names: Option<Vec<String>> = items
                .into_iter()
                .map(|v| v.as_str().map(str::to_owned))
                .collect();
            match names {
                Some(names) => normalize_classes(&names),
                None => {
                    warn!(path = %path.display(), "Invalid format in vocabulary file: entries must be strings");
                    Vec::new()
                }
            }
        }
        Ok(_) => {
            warn!(path = %path.display(), "Invalid format in vocabulary file: expected a JSON list");
            Vec::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "JSON decoding error in vocabulary file. File might be corrupted.");
            Vec::new()
        }
    }
}
