use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::app::AppContext;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse, HandlerResult};
use crate::vocab::normalize_classes;

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_root() -> HandlerResult {
    Ok(ApiResponse::ok(json!({
        "message": "YOLO-World open-vocabulary detection API",
        "version": "1.0",
        "endpoints": {
            "model_info":     "GET /model/info",
            "get_classes":    "GET /model/classes",
            "add_classes":    "POST /model/classes",
            "clear_classes":  "DELETE /model/classes",
            "detect":         "POST /detect",
            "detect_conf":    "POST /detect/with-confidence",
            "labeling":       "POST /labeling/submit",
            "training_start": "POST /training/start",
            "training_state": "GET /training/status",
            "training_stats": "GET /training/data/stats",
        },
    })))
}

// ---------------------------------------------------------------------------
// GET /model/info
// ---------------------------------------------------------------------------

pub fn handle_info(ctx: &AppContext) -> HandlerResult {
    let classes = ctx.vocabulary.get();
    Ok(ApiResponse::ok(json!({
        "model_path":      ctx.detector.weights().display().to_string(),
        "vocab_file":      ctx.vocabulary.path().display().to_string(),
        "total_classes":   classes.len(),
        "current_classes": classes,
    })))
}

// ---------------------------------------------------------------------------
// GET /model/classes
// ---------------------------------------------------------------------------

pub fn handle_get_classes(ctx: &AppContext) -> HandlerResult {
    let classes = ctx.vocabulary.get();
    Ok(ApiResponse::ok(json!({
        "message": format!("Retrieved {} detection classes", classes.len()),
        "classes": classes,
    })))
}

// ---------------------------------------------------------------------------
// POST /model/classes
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct AddClassesBody {
    classes: Vec<String>,
}

pub fn handle_add_classes(req: &ApiRequest, ctx: &AppContext) -> HandlerResult {
    let body: AddClassesBody = serde_json::from_slice(&req.body)
        .map_err(|e| ApiError::bad_request(format!("Invalid request body: {}", e)))?;

    if body.classes.is_empty() {
        return Err(ApiError::bad_request("Classes list cannot be empty"));
    }
    let submitted = normalize_classes(&body.classes);
    if submitted.is_empty() {
        return Err(ApiError::bad_request("No valid classes provided"));
    }

    let classes = ctx
        .vocabulary
        .add(&submitted)
        .map_err(|e| ApiError::from_error("Error adding classes", e))?;
    info!(added = ?submitted, total = classes.len(), "detection classes added");

    Ok(ApiResponse::ok(json!({
        "message": format!("Successfully added classes: {}", submitted.join(", ")),
        "classes": classes,
    })))
}

// ---------------------------------------------------------------------------
// DELETE /model/classes
// ---------------------------------------------------------------------------

pub fn handle_clear_classes(ctx: &AppContext) -> HandlerResult {
    ctx.vocabulary
        .clear()
        .map_err(|e| ApiError::from_error("Error clearing classes", e))?;
    info!("detection classes cleared");
    Ok(ApiResponse::ok(json!({
        "message": "All detection classes cleared successfully",
        "classes": Vec::<String>::new(),
    })))
}
