use std::io::Cursor;

use serde::Serialize;
use serde_json::{json, Value};
use tiny_http::{Header, Response, StatusCode};
use tracing::error;

use crate::error::Error;

/// A JSON response before it is handed to tiny_http.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// `None` for bodiless responses (204).
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        ApiResponse { status: 200, body: Some(body) }
    }

    /// 200 with any serializable body.
    pub fn ok_json<T: Serialize>(body: &T) -> Result<Self, ApiError> {
        serde_json::to_value(body)
            .map(ApiResponse::ok)
            .map_err(|e| ApiError::internal(format!("Error encoding response: {}", e)))
    }

    pub fn no_content() -> Self {
        ApiResponse { status: 204, body: None }
    }

    /// Converts into a tiny_http response carrying JSON and CORS headers.
    pub fn into_http(self) -> Response<Cursor<Vec<u8>>> {
        let bytes = match &self.body {
            Some(body) => serde_json::to_vec(body).unwrap_or_default(),
            None => Vec::new(),
        };
        let len = bytes.len();
        let mut headers = cors_headers();
        if self.body.is_some() {
            headers.extend(Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).ok());
        }
        Response::new(StatusCode(self.status), headers, Cursor::new(bytes), Some(len), None)
    }
}

/// An error response: `{"detail": "..."}` with a status code.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: u16, detail: impl Into<String>) -> Self {
        ApiError { status, detail: detail.into() }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        ApiError::new(400, detail)
    }

    pub fn not_found() -> Self {
        ApiError::new(404, "Not Found")
    }

    pub fn payload_too_large(limit: usize) -> Self {
        ApiError::new(413, format!("Request body exceeds {} bytes", limit))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        ApiError::new(500, detail)
    }

    /// Maps a library error onto a status code.
    ///
    /// Validation and precondition errors keep their own message; anything
    /// else is a 500 whose detail is `"{context}: {error}"`.
    pub fn from_error(context: &str, err: Error) -> Self {
        match err {
            Error::ConfidenceOutOfRange(_) | Error::EpochsOutOfRange { .. }
            | Error::InvalidLabel(_)
            | Error::NoTrainingData => {
                ApiError::bad_request(err.to_string())
            }
            Error::TrainingInProgress => ApiError::new(409, err.to_string()),
            Error::Training(_) => {
                error!(error = %err, "{}", context);
                ApiError::internal(err.to_string())
            }
            other => {
                error!(error = %other, "{}", context);
                ApiError::internal(format!("{}: {}", context, other))
            }
        }
    }

    pub fn into_response(self) -> ApiResponse {
        ApiResponse { status: self.status, body: Some(json!({ "detail": self.detail })) }
    }
}

pub type HandlerResult = Result<ApiResponse, ApiError>;

fn cors_headers() -> Vec<Header> {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "GET, POST, DELETE, OPTIONS"),
        ("Access-Control-Allow-Headers", "*"),
    ]
    .iter()
    .filter_map(|(k, v)| Header::from_bytes(k.as_bytes(), v.as_bytes()).ok())
    .collect()
}
