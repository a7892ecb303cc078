//! Rendered message parts.
//!
//! The shapes mirror what the Messenger Send API accepts, so a
//! [`MessageSegment`] maps onto one outgoing message without reshaping.

use serde::{Deserialize, Serialize};

/// One outgoing message produced by rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSegment {
    /// Display text, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Image or structured attachment, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
    /// Quick replies shown under the message.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub quick_replies: Vec<QuickReply>,
}

impl MessageSegment {
    /// Creates a text message.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// Creates an image message whose bytes are fetched at delivery time.
    #[must_use]
    pub fn image(source: impl Into<String>) -> Self {
        Self {
            attachment: Some(Attachment::Image {
                source: source.into(),
            }),
            ..Self::default()
        }
    }

    /// Creates a structured template message.
    #[must_use]
    pub fn template(template: GenericTemplate) -> Self {
        Self {
            attachment: Some(Attachment::Template(template)),
            ..Self::default()
        }
    }

    /// Replaces the quick replies.
    #[must_use]
    pub fn with_quick_replies(mut self, quick_replies: Vec<QuickReply>) -> Self {
        self.quick_replies = quick_replies;
        self
    }
}

/// An attachment carried by a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum Attachment {
    /// An image, referenced by name or URL until delivery.
    Image {
        /// Image name or absolute URL.
        source: String,
    },
    /// A generic (carousel) template.
    Template(GenericTemplate),
}

/// A generic template: a horizontally scrollable list of cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericTemplate {
    /// Cards in display order.
    pub elements: Vec<TemplateElement>,
}

/// One card of a [`GenericTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateElement {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub buttons: Vec<Button>,
}

/// A card button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    /// Opens a URL.
    WebUrl { title: String, url: String },
    /// Dials a phone number (the payload).
    PhoneNumber { title: String, payload: String },
}

/// A suggested reply attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "content_type", rename_all = "snake_case")]
pub enum QuickReply {
    /// Text option; tapping it sends `payload` as a message.
    Text { title: String, payload: String },
    /// Asks the user to share their location.
    Location,
}

impl QuickReply {
    /// Creates a text option whose title and payload are the same.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        Self::Text {
            title: value.clone(),
            payload: value,
        }
    }
}
