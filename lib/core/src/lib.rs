//! Core domain types and utilities for the fishbot webhook.
//!
//! This crate provides the foundational types and error handling shared by
//! the reply renderer, the conversation handler and the webhook server.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{ConversationId, ParseIdError};
