use serde_json::json;

use crate::app::AppContext;
use crate::dataset::registry::is_single_line;
use crate::dataset::LabelingData;
use crate::http::handlers::detect::uploaded_image;
use crate::http::multipart::text_field;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse, HandlerResult};

// ---------------------------------------------------------------------------
// POST /labeling/submit
// ---------------------------------------------------------------------------

pub fn handle_submit(req: &ApiRequest, ctx: &AppContext) -> HandlerResult {
    let parts = req.multipart()?;
    let image = uploaded_image(&parts)?;

    let raw = text_field(&parts, "labeling_data")
        .ok_or_else(|| ApiError::bad_request("Missing labeling_data field"))?;
    let data: LabelingData = serde_json::from_str(&raw)
        .map_err(|e| ApiError::bad_request(format!("Invalid labeling data JSON: {}", e)))?;
    validate(&data)?;

    image::load_from_memory(&image.data)
        .map_err(|e| ApiError::bad_request(format!("Invalid image file: {}", e)))?;

    let original_name = image.filename.as_deref().unwrap_or("image.jpg");
    let saved = ctx
        .submit_labels(&image.data, original_name, &data)
        .map_err(|e| ApiError::from_error("Error saving labeling data", e))?;

    Ok(ApiResponse::ok(json!({
        "message":      "Labeling data saved successfully",
        "saved_path":   saved.image_path.display().to_string(),
        "label_path":   saved.label_path.display().to_string(),
        "total_labels": saved.total_labels,
    })))
}

fn validate(data: &LabelingData) -> Result<(), ApiError> {
    if data.boxes.is_empty() {
        return Err(ApiError::bad_request("No bounding boxes provided"));
    }
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(data.image_width) || !positive(data.image_height) {
        return Err(ApiError::bad_request("Image dimensions must be positive"));
    }
    if data.boxes.iter().any(|b| b.label.trim().is_empty()) {
        return Err(ApiError::bad_request("Every bounding box needs a label"));
    }
    if data.boxes.iter().any(|b| !is_single_line(b.label.trim())) {
        return Err(ApiError::bad_request("Labels must not contain line breaks"));
    }
    Ok(())
}
