//! Application state and routing.

use crate::dispatch::Dispatcher;
use crate::signature::SignatureVerifier;
use crate::webhook;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    /// Token expected in the verification handshake.
    pub verify_token: String,
    /// Checks event delivery signatures.
    pub signatures: SignatureVerifier,
    /// Processes messaging events.
    pub dispatcher: Arc<Dispatcher>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(verify_token: impl Into<String>, app_secret: &str, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            verify_token: verify_token.into(),
            signatures: SignatureVerifier::new(app_secret),
            dispatcher,
        }
    }
}

/// Builds the router: the webhook under `/fb/webhook` and images under `/img`.
pub fn router(state: Arc<AppState>, image_dir: &str) -> Router {
    Router::new()
        .route("/fb/webhook", get(webhook::verify).post(webhook::receive))
        .nest_service("/img", ServeDir::new(image_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
