//! Error types for the conversation crate.
//!
//! Only classification can fail a message; every other lookup degrades to a
//! placeholder. `ConversationError` is the context wrapped around the
//! underlying classifier report.

use fishbot_core::ConversationId;
use std::fmt;

/// High-level conversation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationError {
    /// The message could not be classified; no reply is sent.
    ClassificationFailed { conversation_id: ConversationId },
}

impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassificationFailed { conversation_id } => {
                write!(f, "failed to classify message in conversation {conversation_id}")
            }
        }
    }
}

impl std::error::Error for ConversationError {}
