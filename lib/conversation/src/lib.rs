//! Conversation handling for the fishbot webhook.
//!
//! This crate provides:
//!
//! - **Session store**: per-conversation state (last known location)
//! - **Conversation handler**: classifies a message, builds the variable
//!   context and renders the reply
//! - **Replies**: canned reply templates for reported catches

pub mod error;
pub mod handler;
pub mod replies;
pub mod session;

pub use error::ConversationError;
pub use handler::{ConversationHandler, IncomingMessage};
pub use session::{InMemorySessionStore, Session, SessionHandle, SessionStore};
