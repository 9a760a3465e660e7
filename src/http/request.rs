use std::io::Read;

use tiny_http::{Method, Request};

use crate::http::form::{parse_query, query_get};
use crate::http::multipart::{extract_boundary, parse_parts, Part};
use crate::http::response::ApiError;

/// A fully read request, detached from the connection.
///
/// Handlers work on this rather than on `tiny_http::Request` so the router
/// can be driven without a socket.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl ApiRequest {
    /// `url` may carry a query string.
    pub fn new(method: Method, url: &str) -> Self {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p.to_owned(), q.to_owned()),
            None => (url.to_owned(), String::new()),
        };
        ApiRequest { method, path, query, content_type: String::new(), body: Vec::new() }
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.content_type = content_type.to_owned();
        self.body = body.into();
        self
    }

    /// Reads headers and body off a tiny_http request, refusing bodies
    /// larger than `max_body` bytes.
    pub fn read_from(request: &mut Request, max_body: usize) -> Result<Self, ApiError> {
        if request.body_length().map(|len| len > max_body).unwrap_or(false) {
            return Err(ApiError::payload_too_large(max_body));
        }

        let content_type = request
            .headers()
            .iter()
            .find(|h| h.field.equiv("Content-Type"))
            .map(|h| h.value.as_str().to_owned())
            .unwrap_or_default();

        let mut body = Vec::new();
        request
            .as_reader()
            .take(max_body as u64 + 1)
            .read_to_end(&mut body)
            .map_err(|e| ApiError::bad_request(format!("Could not read request body: {}", e)))?;
        if body.len() > max_body {
            return Err(ApiError::payload_too_large(max_body));
        }

        let mut api = ApiRequest::new(request.method().clone(), request.url());
        api.content_type = content_type;
        api.body = body;
        Ok(api)
    }

    pub fn query_param(&self, key: &str) -> Option<String> {
        let pairs = parse_query(&self.query);
        query_get(&pairs, key).map(str::to_owned)
    }

    pub fn is_multipart(&self) -> bool {
        self.content_type.to_ascii_lowercase().starts_with("multipart/form-data")
    }

    /// Parts of a multipart body; a 400 if the request is not multipart.
    pub fn multipart(&self) -> Result<Vec<Part>, ApiError> {
        if !self.is_multipart() {
            return Err(ApiError::bad_request("Expected a multipart/form-data request"));
        }
        let boundary = extract_boundary(&self.content_type)
            .ok_or_else(|| ApiError::bad_request("Invalid multipart request: missing boundary"))?;
        Ok(parse_parts(&self.body, &boundary))
    }
}
