//! Dispatch of messaging events to the conversation handler.
//!
//! The webhook acknowledges deliveries before any of this runs, so failures
//! here are only logged.

use crate::events::{IncomingAttachment, Inbound, MessagingEvent};
use fishbot_conversation::replies::WAIT_FOR_IDENTIFICATION;
use fishbot_conversation::{ConversationHandler, IncomingMessage};
use fishbot_core::ConversationId;
use fishbot_integration::{MessageDelivery, ProfileLookup, SpeciesRecognizer};
use fishbot_reply::MessageSegment;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Routes messaging events through the handler and delivers the replies.
pub struct Dispatcher {
    handler: ConversationHandler,
    delivery: Arc<dyn MessageDelivery>,
    profiles: Arc<dyn ProfileLookup>,
    recognizer: Arc<dyn SpeciesRecognizer>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(
        handler: ConversationHandler,
        delivery: Arc<dyn MessageDelivery>,
        profiles: Arc<dyn ProfileLookup>,
        recognizer: Arc<dyn SpeciesRecognizer>,
    ) -> Self {
        Self {
            handler,
            delivery,
            profiles,
            recognizer,
        }
    }

    /// Processes one messaging event to completion.
    #[instrument(skip(self, event), fields(sender = %event.sender.id))]
    pub async fn dispatch(&self, event: MessagingEvent) {
        let sender = event.sender.id.clone();
        match event.inbound() {
            Inbound::Attachments(attachments) => {
                info!(count = attachments.len(), "received attachments");
                for attachment in &attachments {
                    self.handle_attachment(&sender, attachment).await;
                }
            }
            Inbound::Text(text) => self.handle_text(&sender, text).await,
            Inbound::Ignored => debug!("event ignored"),
        }
    }

    async fn handle_attachment(&self, sender: &ConversationId, attachment: &IncomingAttachment) {
        match attachment {
            IncomingAttachment::Image { .. } => {
                let Some(url) = attachment.image_url() else {
                    warn!("image attachment without url");
                    return;
                };
                self.handle_image(sender, url).await;
            }
            IncomingAttachment::Location { payload } => {
                let point = payload.coordinates;
                let text = format!("Location: {},{}", point.lat, point.long);
                self.handle_text(sender, text).await;
            }
            IncomingAttachment::Unsupported => debug!("unsupported attachment ignored"),
        }
    }

    async fn handle_image(&self, sender: &ConversationId, url: &str) {
        let Some(species) = self.recognizer.recognize(url).await else {
            warn!(image_url = url, "could not identify species");
            return;
        };
        self.deliver(sender, &[MessageSegment::text(WAIT_FOR_IDENTIFICATION)])
            .await;
        self.handle_text(sender, format!("Caught a {}", species.name))
            .await;
    }

    /// Runs `text` through the handler and sends the replies.
    async fn handle_text(&self, sender: &ConversationId, text: String) {
        debug!(text = %text, "handling message");
        let person_name = self.profiles.display_name(sender).await;
        let message = IncomingMessage::new(sender.clone(), text).with_person_name(person_name);

        match self.handler.handle(&message).await {
            Ok(segments) => self.deliver(sender, &segments).await,
            Err(report) => error!(error = %report, "failed to handle message"),
        }
    }

    /// Sends segments one at a time, in order.
    async fn deliver(&self, recipient: &ConversationId, segments: &[MessageSegment]) {
        for segment in segments {
            let outcome = self.delivery.send(recipient, segment).await;
            if !outcome.is_delivered() {
                warn!(?outcome, "reply not delivered");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use fishbot_conversation::InMemorySessionStore;
    use fishbot_integration::{
        Classification, Classifier, ClassifierError, ClassifierQuery, Coordinates,
        DeliveryOutcome, Geocoder, RotatingRecognizer, StaticCatalog,
    };
    use rootcause::Report;
    use serde_json::json;
    use std::sync::Mutex;

    /// Classifier that echoes the message text as speech.
    ///
    /// Texts starting with "Caught a " are classified as catches.
    pub(crate) struct EchoClassifier {
        pub(crate) queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Classifier for EchoClassifier {
        async fn query(
            &self,
            query: &ClassifierQuery,
        ) -> Result<Classification, Report<ClassifierError>> {
            self.queries.lock().unwrap().push(query.text.clone());
            if query.text == "boom" {
                return Err(ClassifierError::Rejected {
                    status: 500,
                    body: "internal".to_string(),
                }
                .into());
            }
            let mut classification = Classification {
                action: "echo".to_string(),
                speech: format!("$personName said: {}", query.text),
                ..Classification::default()
            };
            if let Some(name) = query.text.strip_prefix("Caught a ") {
                classification.action = "caught-a-fish".to_string();
                classification
                    .parameters
                    .insert("fishName".to_string(), json!(name));
            }
            Ok(classification)
        }
    }

    struct NoGeocoder;

    #[async_trait]
    impl Geocoder for NoGeocoder {
        async fn reverse_lookup(&self, _coordinates: &Coordinates) -> Option<String> {
            None
        }
    }

    /// Delivery that records what would have been sent.
    #[derive(Default)]
    pub(crate) struct RecordingDelivery {
        pub(crate) sent: Mutex<Vec<(ConversationId, MessageSegment)>>,
    }

    #[async_trait]
    impl MessageDelivery for RecordingDelivery {
        async fn send(&self, recipient: &ConversationId, segment: &MessageSegment) -> DeliveryOutcome {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.clone(), segment.clone()));
            DeliveryOutcome::Delivered
        }
    }

    struct FixedProfiles;

    #[async_trait]
    impl ProfileLookup for FixedProfiles {
        async fn display_name(&self, _user: &ConversationId) -> Option<String> {
            Some("Ada".to_string())
        }
    }

    pub(crate) fn dispatcher(delivery: Arc<RecordingDelivery>) -> Dispatcher {
        let catalog = Arc::new(StaticCatalog::default());
        let handler = ConversationHandler::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(EchoClassifier {
                queries: Mutex::new(Vec::new()),
            }),
            catalog.clone(),
            Arc::new(NoGeocoder),
        );
        Dispatcher::new(
            handler,
            delivery,
            Arc::new(FixedProfiles),
            Arc::new(RotatingRecognizer::new(catalog)),
        )
    }

    fn event(value: serde_json::Value) -> MessagingEvent {
        serde_json::from_value(value).unwrap()
    }

    fn texts(delivery: &RecordingDelivery) -> Vec<String> {
        delivery
            .sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, segment)| segment.text.clone())
            .collect()
    }

    #[tokio::test]
    async fn text_message_is_answered() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher(delivery.clone());

        dispatcher
            .dispatch(event(json!({
                "sender": {"id": "psid-1"},
                "message": {"text": "hello"}
            })))
            .await;

        let sent = delivery.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0.as_str(), "psid-1");
        assert_eq!(sent[0].1.text.as_deref(), Some("Ada said: hello"));
    }

    #[tokio::test]
    async fn location_becomes_location_text() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher(delivery.clone());

        dispatcher
            .dispatch(event(json!({
                "sender": {"id": "psid-1"},
                "message": {"attachments": [
                    {"type": "location", "payload": {"coordinates": {"lat": 23.96, "long": 120.97}}}
                ]}
            })))
            .await;

        assert_eq!(texts(&delivery), vec!["Ada said: Location: 23.96,120.97"]);
    }

    #[tokio::test]
    async fn image_is_identified_then_reported() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher(delivery.clone());

        dispatcher
            .dispatch(event(json!({
                "sender": {"id": "psid-1"},
                "message": {"attachments": [
                    {"type": "image", "payload": {"url": "https://cdn.test/fish.jpg"}}
                ]}
            })))
            .await;

        let texts = texts(&delivery);
        assert_eq!(texts[0], WAIT_FOR_IDENTIFICATION);
        // First catalog entry is the endangered Carangidae.
        assert!(texts[1].starts_with("Jackpot! You caught a Carangidae."));
        assert_eq!(delivery.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn classifier_failure_sends_nothing() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher(delivery.clone());

        dispatcher
            .dispatch(event(json!({
                "sender": {"id": "psid-1"},
                "message": {"text": "boom"}
            })))
            .await;

        assert!(delivery.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn echo_is_not_answered() {
        let delivery = Arc::new(RecordingDelivery::default());
        let dispatcher = dispatcher(delivery.clone());

        dispatcher
            .dispatch(event(json!({
                "sender": {"id": "page-1"},
                "message": {"text": "hello", "is_echo": true}
            })))
            .await;

        assert!(delivery.sent.lock().unwrap().is_empty());
    }
}
