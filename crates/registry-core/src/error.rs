use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// JSON envelope shared by every service error: `{"kind": ..., "message": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody<'a> {
    pub kind: &'a str,
    pub message: String,
}

/// Render an error envelope with the given status.
///
/// Callers log 5xx themselves before rendering; `TraceLayer` already records
/// the status of every request.
pub fn error_response(status: StatusCode, kind: &str, message: impl Into<String>) -> Response {
    let body = ErrorBody {
        kind,
        message: message.into(),
    };
    (status, Json(body)).into_response()
}
