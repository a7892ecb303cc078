//! Messenger webhook endpoints.

use crate::app::AppState;
use crate::error::WebhookError;
use crate::events::WebhookPayload;
use crate::signature::SIGNATURE_HEADER;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply body acknowledging an event delivery.
pub const EVENT_RECEIVED: &str = "EVENT_RECEIVED";

const SUBSCRIBE: &str = "subscribe";

/// Query parameters of the verification handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// Answers the subscription handshake with the challenge.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyQuery>,
) -> Result<String, WebhookError> {
    let (Some(mode), Some(token), Some(challenge)) =
        (query.mode, query.verify_token, query.challenge)
    else {
        return Err(WebhookError::MissingParameters);
    };
    if mode != SUBSCRIBE || token.is_empty() || challenge.is_empty() {
        return Err(WebhookError::InvalidMode { mode });
    }
    if token != state.verify_token {
        warn!("webhook verification with wrong token");
        return Err(WebhookError::InvalidVerifyToken);
    }

    info!("webhook verified");
    Ok(challenge)
}

/// Accepts a signed event delivery.
///
/// The event is processed in the background after the acknowledgement.
pub async fn receive(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, WebhookError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(WebhookError::InvalidSignature)?;
    if !state.signatures.verify(signature, &body) {
        warn!("missing or invalid X-Hub signature");
        return Err(WebhookError::InvalidSignature);
    }

    let payload: WebhookPayload =
        serde_json::from_slice(&body).map_err(|e| WebhookError::MalformedPayload {
            reason: e.to_string(),
        })?;
    debug!(object = ?payload.object, entries = payload.entry.len(), "event received");

    match payload.into_first_event() {
        Some(event) => {
            let dispatcher = Arc::clone(&state.dispatcher);
            tokio::spawn(async move { dispatcher.dispatch(event).await });
        }
        None => debug!("delivery without messaging events"),
    }

    Ok((StatusCode::OK, EVENT_RECEIVED))
}
