use serde_json::json;

use crate::app::AppContext;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse, HandlerResult};
use crate::train::DEFAULT_EPOCHS;

// ---------------------------------------------------------------------------
// POST /training/start?epochs=N
// ---------------------------------------------------------------------------

/// Runs fine-tuning to completion before responding.
pub fn handle_start(req: &ApiRequest, ctx: &AppContext) -> HandlerResult {
    let epochs = match req.query_param("epochs") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ApiError::bad_request(format!("Invalid epochs value: {}", raw)))?,
        None => DEFAULT_EPOCHS,
    };

    let summary = ctx
        .start_training(epochs)
        .map_err(|e| ApiError::from_error("Training failed", e))?;

    let swapped = match &summary.best_weights {
        Some(path) => format!("model updated to {}", path.display()),
        None => "no new weights found, model unchanged".to_owned(),
    };
    Ok(ApiResponse::ok(json!({
        "message":      format!("Training completed for {} epochs; {}", summary.epochs, swapped),
        "epochs":       summary.epochs,
        "run_dir":      summary.run_dir.map(|p| p.display().to_string()),
        "best_weights": summary.best_weights.map(|p| p.display().to_string()),
        "elapsed_ms":   summary.elapsed_ms,
        "model_path":   ctx.detector.weights().display().to_string(),
    })))
}

// ---------------------------------------------------------------------------
// GET /training/status
// ---------------------------------------------------------------------------

pub fn handle_status(ctx: &AppContext) -> HandlerResult {
    ApiResponse::ok_json(&ctx.trainer.status())
}

// ---------------------------------------------------------------------------
// GET /training/data/stats
// ---------------------------------------------------------------------------

pub fn handle_stats(ctx: &AppContext) -> HandlerResult {
    let stats = ctx
        .dataset_stats()
        .map_err(|e| ApiError::from_error("Error getting training stats", e))?;
    ApiResponse::ok_json(&stats)
}
