use std::path::{Path, PathBuf};

/// Largest request body the HTTP layer will read.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024; // 20 MB

/// Everything the service needs to know about its environment.
///
/// Paths are passed explicitly into each component's constructor; nothing
/// in the crate reads process-wide globals.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Address the HTTP server binds to, e.g. `0.0.0.0:8000`.
    pub bind: String,
    /// Initial detector weights.
    pub model_path: PathBuf,
    /// JSON list file holding the detection vocabulary.
    pub vocab_file: PathBuf,
    /// Root of the YOLO dataset tree (`images/`, `labels/`, `classes.txt`).
    pub dataset_root: PathBuf,
    /// Directory the trainer writes its run directories into.
    pub runs_dir: PathBuf,
    /// Worker command line for the process engine: program followed by args.
    pub engine_command: Vec<String>,
    /// Where request-scoped temporary uploads are written.
    pub temp_dir: PathBuf,
    /// TrueType/OpenType font for label text. Probed from system paths if unset.
    pub font_path: Option<PathBuf>,
    pub max_upload_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            bind:             "0.0.0.0:8000".into(),
            model_path:       PathBuf::from("./yolov8s-world.pt"),
            vocab_file:       PathBuf::from("custom_vocab.json"),
            dataset_root:     PathBuf::from("training_data"),
            runs_dir:         PathBuf::from("runs/detect"),
            engine_command:   vec!["python3".into(), "bridge/yolo_world_bridge.py".into()],
            temp_dir:         std::env::temp_dir(),
            font_path:        None,
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }
}

impl AppConfig {
    /// A configuration whose state files all live under `root`.
    ///
    /// Used by tests and by `--data-dir` on the command line.
    pub fn rooted_at(root: &Path) -> Self {
        AppConfig {
            vocab_file:   root.join("custom_vocab.json"),
            dataset_root: root.join("training_data"),
            runs_dir:     root.join("runs").join("detect"),
            temp_dir:     root.join("tmp"),
            ..AppConfig::default()
        }
    }
}
