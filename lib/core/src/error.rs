//! Shared result alias.
//!
//! Crates keep their own error enums (`ClassifierError`,
//! `ConversationError`, ...) and wrap them in a rootcause [`Report`] so that
//! each layer can attach its own context on the way up to the webhook.

use rootcause::Report;

/// Result carrying a rootcause [`Report`] with context type `C`.
pub type Result<T, C> = std::result::Result<T, Report<C>>;
