use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use crate::domain::types::VerifyOutcome;
use crate::error::VerificationServiceError;
use crate::state::AppState;

/// Body of every send/verify response.
#[derive(Debug, Serialize)]
pub struct VerificationResponse {
    pub success: bool,
    pub message: &'static str,
}

// ── POST /verification/send ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct SendCodeRequest {
    #[serde(default)]
    pub email: String,
}

pub async fn send_code(
    State(state): State<AppState>,
    Json(body): Json<SendCodeRequest>,
) -> Result<Json<VerificationResponse>, VerificationServiceError> {
    // The code leaves through the outbox, never in the response.
    state.registry().issue_code(&body.email).await?;
    Ok(Json(VerificationResponse {
        success: true,
        message: "CODE_SENT",
    }))
}

// ── POST /verification/verify ────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub code: String,
}

fn outcome_status(outcome: VerifyOutcome) -> StatusCode {
    match outcome {
        VerifyOutcome::Verified => StatusCode::OK,
        VerifyOutcome::InvalidCode | VerifyOutcome::Expired => StatusCode::BAD_REQUEST,
        VerifyOutcome::TooManyAttempts => StatusCode::TOO_MANY_REQUESTS,
    }
}

pub async fn verify_code(
    State(state): State<AppState>,
    Json(body): Json<VerifyCodeRequest>,
) -> Result<(StatusCode, Json<VerificationResponse>), VerificationServiceError> {
    let outcome = state.registry().verify_code(&body.email, &body.code).await?;
    let body = VerificationResponse {
        success: outcome.is_success(),
        message: outcome.message(),
    };
    Ok((outcome_status(outcome), Json(body)))
}

// ── GET /verification/check/{email} ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub verified: bool,
}

pub async fn check_verification(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<CheckResponse>, VerificationServiceError> {
    let verified = state.registry().is_recently_verified(&email).await?;
    Ok(Json(CheckResponse { verified }))
}
