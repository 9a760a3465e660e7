//! vocab-detect server
//!
//! Open-vocabulary object detection over HTTP: manage the class vocabulary,
//! detect and annotate uploaded images, collect YOLO-format labels and
//! fine-tune the model on them.
//!
//! Run with:
//!   cargo run --bin vocab-detect-server --release -- --bind 127.0.0.1:8000
//!
//! Inference and training are delegated to a worker command (by default
//! `python3 bridge/yolo_world_bridge.py`) that speaks one JSON request and
//! one JSON response per invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use vocab_detect::config::AppConfig;
use vocab_detect::engine::ProcessEngine;
use vocab_detect::{http, AppContext};

/// Command-line configuration for the detection service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8000", value_name = "ADDR")]
    bind: String,

    /// Initial model weights
    #[arg(long, default_value = "./yolov8s-world.pt", value_name = "FILE")]
    model: PathBuf,

    /// Keep the vocabulary file, dataset, runs and temp files under this directory
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Vocabulary JSON file (overrides --data-dir)
    #[arg(long, value_name = "FILE")]
    vocab_file: Option<PathBuf>,

    /// Dataset root holding images/, labels/ and classes.txt (overrides --data-dir)
    #[arg(long, value_name = "DIR")]
    dataset_dir: Option<PathBuf>,

    /// Directory training runs are written to (overrides --data-dir)
    #[arg(long, value_name = "DIR")]
    runs_dir: Option<PathBuf>,

    /// Font used for box labels; system fonts are probed if unset
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = vocab_detect::config::MAX_UPLOAD_BYTES, value_name = "BYTES")]
    max_upload_bytes: usize,

    /// Engine worker command line, after `--`
    #[arg(last = true, value_name = "COMMAND")]
    engine: Vec<String>,
}

impl Args {
    fn into_config(self) -> AppConfig {
        let mut config = match &self.data_dir {
            Some(dir) => AppConfig::rooted_at(dir),
            None => AppConfig::default(),
        };
        config.bind = self.bind;
        config.model_path = self.model;
        config.font_path = self.font;
        config.max_upload_bytes = self.max_upload_bytes;
        if let Some(p) = self.vocab_file {
            config.vocab_file = p;
        }
        if let Some(p) = self.dataset_dir {
            config.dataset_root = p;
        }
        if let Some(p) = self.runs_dir {
            config.runs_dir = p;
        }
        if !self.engine.is_empty() {
            config.engine_command = self.engine;
        }
        config
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = Args::parse().into_config();
    info!(?config, "starting vocab-detect server");

    let engine = ProcessEngine::new(&config.engine_command, config.model_path.clone())
        .context("invalid engine command")?;
    let bind = config.bind.clone();
    let ctx = AppContext::new(config, Arc::new(engine)).context("failed to initialise service state")?;

    let server = http::bind(&bind).with_context(|| format!("failed to bind {}", bind))?;
    http::serve(server, Arc::new(ctx));
    Ok(())
}
