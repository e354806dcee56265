use axum::http::StatusCode;

/// Handler for `GET /healthz`. The process is up if it can answer.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
