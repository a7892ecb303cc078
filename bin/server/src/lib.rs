//! fishbot webhook server.
//!
//! This crate wires the conversation handler to Facebook Messenger:
//! - Webhook verification and signed event delivery
//! - Dispatch of messaging events to the conversation handler
//! - Static hosting of reply images

pub mod app;
pub mod cleanup;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod signature;
pub mod webhook;
