use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Checkpoint the trainer leaves inside a run directory.
pub const BEST_WEIGHTS: &str = "weights/best.pt";

/// The most recently modified directory directly under `runs_dir`.
pub fn latest_run_dir(runs_dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(runs_dir).ok()?;
    entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).unwrap_or(SystemTime::UNIX_EPOCH);
            (modified, e.path())
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

/// `run_dir/weights/best.pt`, if the file exists.
pub fn best_weights(run_dir: &Path) -> Option<PathBuf> {
    let path = run_dir.join(BEST_WEIGHTS);
    if path.is_file() { Some(path) } else { None }
}
