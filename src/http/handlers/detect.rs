use std::io::Write;
use std::path::Path;

use serde_json::json;
use tracing::info;

use crate::app::AppContext;
use crate::dataset::layout::is_image_file;
use crate::engine::{Prediction, DEFAULT_CONFIDENCE};
use crate::http::multipart::{file_part, text_field, Part};
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse, HandlerResult};

const NO_CLASSES_MESSAGE: &str = "No detection classes set. Please add classes first.";

// ---------------------------------------------------------------------------
// POST /detect
// ---------------------------------------------------------------------------

pub fn handle_detect(req: &ApiRequest, ctx: &AppContext) -> HandlerResult {
    let parts = req.multipart()?;
    let image = uploaded_image(&parts)?;
    run_detection(ctx, image, DEFAULT_CONFIDENCE, None)
}

// ---------------------------------------------------------------------------
// POST /detect/with-confidence
// ---------------------------------------------------------------------------

pub fn handle_detect_with_confidence(req: &ApiRequest, ctx: &AppContext) -> HandlerResult {
    let parts = req.multipart()?;

    let raw = text_field(&parts, "confidence").or_else(|| req.query_param("confidence"));
    let confidence = match raw {
        Some(s) => s
            .trim()
            .parse::<f32>()
            .map_err(|_| ApiError::bad_request("Confidence must be a number between 0.0 and 1.0"))?,
        None => DEFAULT_CONFIDENCE,
    };
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ApiError::bad_request("Confidence must be between 0.0 and 1.0"));
    }

    let image = uploaded_image(&parts)?;
    run_detection(ctx, image, confidence, Some(confidence))
}

/// The `image` file part, checked for an image content type and a body.
pub(crate) fn uploaded_image(parts: &[Part]) -> Result<&Part, ApiError> {
    let part = file_part(parts, "image").ok_or_else(|| ApiError::bad_request("No image file uploaded"))?;
    let is_image = part
        .content_type
        .as_deref()
        .map(|ct| ct.to_ascii_lowercase().starts_with("image/"))
        .unwrap_or(false);
    if !is_image {
        return Err(ApiError::bad_request("File must be an image"));
    }
    if part.data.is_empty() {
        return Err(ApiError::bad_request("Empty file uploaded"));
    }
    Ok(part)
}

/// Decodes, detects and renders. `reported` is echoed in the message when
/// the caller picked the threshold.
fn run_detection(ctx: &AppContext, part: &Part, confidence: f32, reported: Option<f32>) -> HandlerResult {
    let decoded = image::load_from_memory(&part.data)
        .map_err(|e| ApiError::bad_request(format!("Invalid image file: {}", e)))?;

    // Removed when `upload` drops, whichever way this function returns.
    let upload = write_temp_upload(ctx, part)
        .map_err(|e| ApiError::internal(format!("Error processing image: {}", e)))?;

    let prediction = ctx
        .detector
        .predict(upload.path(), confidence)
        .map_err(|e| ApiError::from_error("Error processing image", e))?;

    let (detections, message) = match prediction {
        Prediction::NoClasses => (Vec::new(), NO_CLASSES_MESSAGE.to_owned()),
        Prediction::Detections(detections) => {
            let message = match reported {
                Some(c) => format!("Found {} objects with confidence {}", detections.len(), c),
                None => format!("Found {} objects", detections.len()),
            };
            (detections, message)
        }
    };

    let processed_image = ctx
        .renderer
        .render(&decoded, &detections)
        .map_err(|e| ApiError::from_error("Error processing image", e))?;

    info!(detections = detections.len(), confidence, "detection request served");
    Ok(ApiResponse::ok(json!({
        "detections":      detections,
        "message":         message,
        "processed_image": processed_image,
    })))
}

fn write_temp_upload(ctx: &AppContext, part: &Part) -> std::io::Result<tempfile::NamedTempFile> {
    let suffix = format!(".{}", upload_extension(part));
    let mut file = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(&suffix)
        .tempfile_in(&ctx.config.temp_dir)?;
    file.write_all(&part.data)?;
    file.flush()?;
    Ok(file)
}

/// Extension for the temp copy: the uploaded name's, else one derived from
/// the content type.
fn upload_extension(part: &Part) -> String {
    if let Some(name) = part.filename.as_deref() {
        let path = Path::new(name);
        if is_image_file(path) {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                return ext.to_ascii_lowercase();
            }
        }
    }
    let subtype = part
        .content_type
        .as_deref()
        .and_then(|ct| ct.split('/').nth(1))
        .map(|s| s.split(';').next().unwrap_or(s).trim().to_ascii_lowercase())
        .unwrap_or_default();
    match subtype.as_str() {
        "jpeg" | "pjpeg" | "" => "jpg".into(),
        other if other.chars().all(|c| c.is_ascii_alphanumeric()) => other.into(),
        _ => "jpg".into(),
    }
}
