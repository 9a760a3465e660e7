use tiny_http::{Method, Request};
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::http::handlers;
use crate::http::request::ApiRequest;
use crate::http::response::{ApiError, ApiResponse};

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Reads `request`, routes it and writes the response back.
pub fn dispatch(mut request: Request, ctx: &AppContext) {
    let response = match ApiRequest::read_from(&mut request, ctx.config.max_upload_bytes) {
        Ok(api) => handle(ctx, &api),
        Err(e) => e.into_response(),
    };
    if let Err(e) = request.respond(response.into_http()) {
        warn!(error = %e, "failed to write response");
    }
}

/// Routes a fully read request to its handler.
pub fn handle(ctx: &AppContext, req: &ApiRequest) -> ApiResponse {
    debug!(method = %req.method, path = %req.path, "request");

    let result = match (&req.method, req.path.as_str()) {
        (Method::Options, _) => Ok(ApiResponse::no_content()),

        (Method::Get, "/") => handlers::model::handle_root(),

        // ── Model / vocabulary ───────────────────────────────────────────
        (Method::Get,    "/model/info")    => handlers::model::handle_info(ctx),
        (Method::Get,    "/model/classes") => handlers::model::handle_get_classes(ctx),
        (Method::Post,   "/model/classes") => handlers::model::handle_add_classes(req, ctx),
        (Method::Delete, "/model/classes") => handlers::model::handle_clear_classes(ctx),

        // ── Detection ────────────────────────────────────────────────────
        (Method::Post, "/detect")                 => handlers::detect::handle_detect(req, ctx),
        (Method::Post, "/detect/with-confidence") => handlers::detect::handle_detect_with_confidence(req, ctx),

        // ── Labeling ─────────────────────────────────────────────────────
        (Method::Post, "/labeling/submit") => handlers::labeling::handle_submit(req, ctx),

        // ── Training ─────────────────────────────────────────────────────
        (Method::Post, "/training/start")      => handlers::training::handle_start(req, ctx),
        (Method::Get,  "/training/status")     => handlers::training::handle_status(ctx),
        (Method::Get,  "/training/data/stats") => handlers::training::handle_stats(ctx),

        _ => Err(ApiError::not_found()),
    };

    result.unwrap_or_else(ApiError::into_response)
}
