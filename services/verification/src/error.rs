use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use registry_core::error::error_response;

/// Verification service error variants.
///
/// Rejected codes are not errors; see [`crate::domain::types::VerifyOutcome`].
#[derive(Debug, thiserror::Error)]
pub enum VerificationServiceError {
    #[error("email is required")]
    MissingEmail,
    #[error("code is required")]
    MissingCode,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl VerificationServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingEmail => "MISSING_EMAIL",
            Self::MissingCode => "MISSING_CODE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingEmail | Self::MissingCode => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for VerificationServiceError {
    fn into_response(self) -> Response {
        // Only 500s carry a cause worth logging; the message sent back stays generic.
        if let Self::Internal(ref e) = self {
            tracing::error!(error = ?e, kind = "INTERNAL", "internal error");
        }
        error_response(self.status(), self.kind(), self.to_string())
    }
}
