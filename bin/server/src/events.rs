//! Messenger webhook event payloads.
//!
//! Only the fields the bot reacts to are modelled; everything else in the
//! payload is ignored.

use fishbot_core::ConversationId;
use serde::Deserialize;

/// Body of a `POST /fb/webhook` delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

impl WebhookPayload {
    /// The first messaging event of the first entry.
    ///
    /// Messenger batches at most one event per entry for page subscriptions.
    #[must_use]
    pub fn into_first_event(self) -> Option<MessagingEvent> {
        self.entry.into_iter().next()?.messaging.into_iter().next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub postback: Option<Postback>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: ConversationId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub is_echo: bool,
    #[serde(default)]
    pub quick_reply: Option<QuickReplyPayload>,
    #[serde(default)]
    pub attachments: Vec<IncomingAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuickReplyPayload {
    pub payload: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postback {
    pub payload: String,
}

/// A user-sent attachment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingAttachment {
    Image {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        payload: Option<MediaPayload>,
    },
    Location { payload: LocationPayload },
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MediaPayload {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocationPayload {
    pub coordinates: GeoPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub long: f64,
}

/// What the bot should do with an event.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Process each attachment in order.
    Attachments(Vec<IncomingAttachment>),
    /// Handle a piece of text (typed, a quick reply or a postback payload).
    Text(String),
    /// Nothing to do.
    Ignored,
}

impl IncomingAttachment {
    /// URL of an image attachment.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        match self {
            Self::Image { payload, url } => payload
                .as_ref()
                .and_then(|p| p.url.as_deref())
                .or(url.as_deref()),
            _ => None,
        }
    }
}

impl MessagingEvent {
    /// Classifies the event.
    ///
    /// Echoes of the page's own messages are ignored. A quick-reply payload
    /// takes precedence over the message text.
    #[must_use]
    pub fn inbound(&self) -> Inbound {
        if let Some(message) = &self.message {
            if message.is_echo {
                return Inbound::Ignored;
            }
            if !message.attachments.is_empty() {
                return Inbound::Attachments(message.attachments.clone());
            }
            if let Some(quick_reply) = &message.quick_reply {
                return Inbound::Text(quick_reply.payload.clone());
            }
            if let Some(text) = &message.text {
                return Inbound::Text(text.clone());
            }
            return Inbound::Ignored;
        }
        match &self.postback {
            Some(postback) => Inbound::Text(postback.payload.clone()),
            None => Inbound::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(value: serde_json::Value) -> MessagingEvent {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn picks_first_event() {
        let payload: WebhookPayload = serde_json::from_value(json!({
            "object": "page",
            "entry": [{
                "id": "page-1",
                "time": 1_520_000_000,
                "messaging": [{
                    "sender": {"id": "psid-1"},
                    "recipient": {"id": "page-1"},
                    "timestamp": 1_520_000_000,
                    "message": {"mid": "m1", "text": "hello"}
                }]
            }]
        }))
        .unwrap();

        let event = payload.into_first_event().unwrap();
        assert_eq!(event.sender.id.as_str(), "psid-1");
        assert_eq!(event.inbound(), Inbound::Text("hello".to_string()));
    }

    #[test]
    fn empty_payload_has_no_event() {
        let payload: WebhookPayload = serde_json::from_value(json!({"object": "page"})).unwrap();
        assert!(payload.into_first_event().is_none());
    }

    #[test]
    fn quick_reply_payload_wins_over_text() {
        let event = event(json!({
            "sender": {"id": "psid-1"},
            "message": {"text": "Yes!", "quick_reply": {"payload": "YES"}}
        }));
        assert_eq!(event.inbound(), Inbound::Text("YES".to_string()));
    }

    #[test]
    fn echoes_are_ignored() {
        let event = event(json!({
            "sender": {"id": "page-1"},
            "message": {"text": "from the page", "is_echo": true}
        }));
        assert_eq!(event.inbound(), Inbound::Ignored);
    }

    #[test]
    fn postback_payload_is_text() {
        let event = event(json!({
            "sender": {"id": "psid-1"},
            "postback": {"title": "Get Started", "payload": "Get started"}
        }));
        assert_eq!(event.inbound(), Inbound::Text("Get started".to_string()));
    }

    #[test]
    fn delivery_receipts_are_ignored() {
        let event = event(json!({
            "sender": {"id": "psid-1"},
            "delivery": {"mids": ["m1"], "watermark": 1}
        }));
        assert_eq!(event.inbound(), Inbound::Ignored);
    }

    #[test]
    fn parses_attachments() {
        let event = event(json!({
            "sender": {"id": "psid-1"},
            "message": {"attachments": [
                {"type": "image", "payload": {"url": "https://cdn.test/fish.jpg"}},
                {"type": "location", "title": "Pin", "payload": {"coordinates": {"lat": 23.96, "long": 120.97}}},
                {"type": "audio", "payload": {"url": "https://cdn.test/a.mp4"}}
            ]}
        }));

        let Inbound::Attachments(attachments) = event.inbound() else {
            panic!("expected attachments");
        };
        assert_eq!(attachments.len(), 3);
        assert_eq!(attachments[0].image_url(), Some("https://cdn.test/fish.jpg"));
        assert_eq!(
            attachments[1],
            IncomingAttachment::Location {
                payload: LocationPayload {
                    coordinates: GeoPoint {
                        lat: 23.96,
                        long: 120.97
                    }
                }
            }
        );
        assert_eq!(attachments[2], IncomingAttachment::Unsupported);
    }

    #[test]
    fn image_url_falls_back_to_top_level() {
        let attachment: IncomingAttachment = serde_json::from_value(json!({
            "type": "image",
            "url": "https://cdn.test/legacy.jpg"
        }))
        .unwrap();
        assert_eq!(attachment.image_url(), Some("https://cdn.test/legacy.jpg"));
    }
}
