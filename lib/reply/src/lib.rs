//! Reply template rendering for the fishbot webhook.
//!
//! Reply bodies are plain text with a handful of embedded directives:
//!
//! - `---` splits a template into independently rendered segments
//! - `$askForLocation` adds a "send location" quick reply
//! - `$contactAgency` appends a contact card for the wildlife agencies
//! - `[image:<name>]` sends an image after the segment text
//! - `$variable` tokens are interpolated from a [`VariableContext`]
//! - `:: <text>` lines become text quick replies
//!
//! [`render`] turns a template into the ordered [`MessageSegment`]s to send.

pub mod contact;
pub mod context;
mod directive;
pub mod message;
pub mod render;

pub use context::{Variable, VariableContext};
pub use directive::{ASK_FOR_LOCATION, CONTACT_AGENCY};
pub use message::{
    Attachment, Button, GenericTemplate, MessageSegment, QuickReply, TemplateElement,
};
pub use render::{SEGMENT_SEPARATOR, render};
