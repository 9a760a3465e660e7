pub mod app_config;

pub use app_config::{AppConfig, MAX_UPLOAD_BYTES};
