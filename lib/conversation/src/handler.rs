//! Conversation handler.
//!
//! Turns one incoming message into the reply segments to send back:
//!
//! 1. Lock the conversation's session
//! 2. Classify the message
//! 3. Seed the variable context and overlay species and location lookups
//! 4. Pick the reply template and render it

use crate::error::ConversationError;
use crate::replies;
use crate::session::{Session, SessionStore};
use fishbot_core::ConversationId;
use fishbot_integration::{Classification, Classifier, ClassifierQuery, Geocoder, SpeciesLookup};
use fishbot_reply::{MessageSegment, Variable, VariableContext, render};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Action reported by the classifier when the user describes a catch.
pub const CAUGHT_A_FISH: &str = "caught-a-fish";

/// Locale sent to the classifier unless configured otherwise.
pub const DEFAULT_LOCALE: &str = "en";

/// Source channel reported to the classifier.
pub const SOURCE: &str = "facebook";

/// Location name used when a shared location cannot be resolved.
pub const UNRESOLVED_LOCATION: &str = "$lat,$long";

const DEFAULT_LOCATION: &str = "Nantou";
const DEFAULT_FISH_NAME: &str = "?";
const DEFAULT_FISH_WEIGHT: &str = "1";
const DEFAULT_FISH_LENGTH: &str = "0.5";

/// A normalized user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub conversation_id: ConversationId,
    /// Sender's display name, if the profile lookup succeeded.
    pub person_name: Option<String>,
    pub text: String,
}

impl IncomingMessage {
    #[must_use]
    pub fn new(conversation_id: ConversationId, text: impl Into<String>) -> Self {
        Self {
            conversation_id,
            person_name: None,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn with_person_name(mut self, person_name: Option<String>) -> Self {
        self.person_name = person_name;
        self
    }
}

/// Handles messages for all conversations.
pub struct ConversationHandler {
    sessions: Arc<dyn SessionStore>,
    classifier: Arc<dyn Classifier>,
    species: Arc<dyn SpeciesLookup>,
    geocoder: Arc<dyn Geocoder>,
    locale: String,
}

impl ConversationHandler {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        classifier: Arc<dyn Classifier>,
        species: Arc<dyn SpeciesLookup>,
        geocoder: Arc<dyn Geocoder>,
    ) -> Self {
        Self {
            sessions,
            classifier,
            species,
            geocoder,
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Session store backing this handler.
    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Produces the reply segments for `message`.
    ///
    /// Messages of the same conversation are handled one at a time.
    ///
    /// # Errors
    ///
    /// Returns an error if the message cannot be classified. Species and
    /// location lookups never fail a message.
    #[instrument(skip(self, message), fields(conversation = %message.conversation_id))]
    pub async fn handle(
        &self,
        message: &IncomingMessage,
    ) -> fishbot_core::Result<Vec<MessageSegment>, ConversationError> {
        let handle = self.sessions.get_or_create(&message.conversation_id).await;
        let mut session = handle.lock().await;
        session.touch();

        let query = ClassifierQuery::new(
            message.text.clone(),
            message.conversation_id.clone(),
            self.locale.clone(),
        )
        .with_source(SOURCE);
        let classification = self.classifier.query(&query).await.map_err(|report| {
            report.context(ConversationError::ClassificationFailed {
                conversation_id: message.conversation_id.clone(),
            })
        })?;
        info!(action = %classification.action, "message classified");

        let mut context = seed_context(message, &session);
        self.overlay_species(&classification, &mut context).await;
        self.overlay_location(&classification, &mut context, &mut session)
            .await;

        let template = self.pick_template(&classification).await;
        let segments = render(&template, &context);
        debug!(segments = segments.len(), "reply rendered");
        Ok(segments)
    }

    async fn overlay_species(&self, classification: &Classification, context: &mut VariableContext) {
        let Some(name) = classification.fish_name() else {
            return;
        };
        match self.species.by_name(&name).await {
            Some(record) => {
                context.set(Variable::FishName, record.name);
                context.set(Variable::FishWeight, record.weight);
                context.set(Variable::FishLength, record.length);
            }
            None => debug!(fish_name = %name, "species not in catalog"),
        }
    }

    /// Resolves shared coordinates into `$locationName`.
    ///
    /// Only a resolved name is stored in the session. On failure this reply
    /// shows the `$lat,$long` placeholder and the session keeps its previous
    /// location; the placeholder is never stored.
    async fn overlay_location(
        &self,
        classification: &Classification,
        context: &mut VariableContext,
        session: &mut Session,
    ) {
        let Some(coordinates) = classification.coordinates() else {
            return;
        };
        match self.geocoder.reverse_lookup(&coordinates).await {
            Some(name) => {
                context.set(Variable::LocationName, name.clone());
                session.set_location(name);
            }
            None => context.set(Variable::LocationName, UNRESOLVED_LOCATION),
        }
    }

    async fn pick_template(&self, classification: &Classification) -> String {
        if classification.action != CAUGHT_A_FISH {
            return classification.speech.clone();
        }

        let endangered = match classification.fish_name() {
            Some(name) => self
                .species
                .by_name(&name)
                .await
                .is_some_and(|record| record.endangered),
            None => false,
        };
        if endangered {
            replies::ENDANGERED_FISH.to_string()
        } else {
            replies::GOOD_FISH.to_string()
        }
    }
}

fn seed_context(message: &IncomingMessage, session: &Session) -> VariableContext {
    let mut context = VariableContext::new()
        .with(Variable::Br, "\n")
        .with(Variable::Location, DEFAULT_LOCATION)
        .with(Variable::FishName, DEFAULT_FISH_NAME)
        .with(Variable::FishWeight, DEFAULT_FISH_WEIGHT)
        .with(Variable::FishLength, DEFAULT_FISH_LENGTH);
    context.set_opt(Variable::PersonName, message.person_name.clone());
    context.set_opt(Variable::LocationName, session.location_name.clone());
    context
}
