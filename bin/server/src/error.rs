//! Webhook error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Errors returned to Messenger by the webhook endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// Verification request without the expected query parameters.
    MissingParameters,
    /// Verification request with a mode other than `subscribe`.
    InvalidMode { mode: String },
    /// Verification request with the wrong token.
    InvalidVerifyToken,
    /// Event delivery without a valid `X-Hub-Signature`.
    InvalidSignature,
    /// Event delivery body that is not a webhook payload.
    MalformedPayload { reason: String },
}

impl fmt::Display for WebhookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingParameters => write!(f, "missing verification parameters"),
            Self::InvalidMode { mode } => write!(f, "invalid mode '{mode}'"),
            Self::InvalidVerifyToken => write!(f, "invalid verify_token"),
            Self::InvalidSignature => write!(f, "missing or invalid X-Hub signature"),
            Self::MalformedPayload { reason } => write!(f, "malformed payload: {reason}"),
        }
    }
}

impl std::error::Error for WebhookError {}

impl WebhookError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidVerifyToken => StatusCode::FORBIDDEN,
            Self::MissingParameters
            | Self::InvalidMode { .. }
            | Self::InvalidSignature
            | Self::MalformedPayload { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        (self.status(), format!("Error: {self}")).into_response()
    }
}
