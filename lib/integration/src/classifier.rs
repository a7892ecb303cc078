//! Intent classification.
//!
//! The classifier decides what a user message means: an action name, the
//! reply template the agent authored for that intent, and any parameters it
//! extracted (a fish name, coordinates of a shared location, ...).

use crate::error::ClassifierError;
use async_trait::async_trait;
use fishbot_core::ConversationId;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, instrument};

/// Parameter holding a species name hint.
pub const FISH_NAME_PARAM: &str = "fishName";
/// Parameter holding a latitude.
pub const LATITUDE_PARAM: &str = "lat";
/// Parameter holding a longitude.
pub const LONGITUDE_PARAM: &str = "long";

/// A message to classify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierQuery {
    pub text: String,
    pub conversation_id: ConversationId,
    pub locale: String,
    /// Channel the message came from (e.g. "facebook").
    pub source: Option<String>,
}

impl ClassifierQuery {
    /// Creates a query in the given locale.
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        conversation_id: ConversationId,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            conversation_id,
            locale: locale.into(),
            source: None,
        }
    }

    /// Sets the source channel.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// A pair of coordinates, kept as the classifier reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub lat: String,
    pub long: String,
}

/// The classifier's verdict on a message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    /// Action name, e.g. `caught-a-fish`.
    pub action: String,
    /// Reply template authored for the matched intent.
    pub speech: String,
    /// Extracted parameters.
    pub parameters: Map<String, JsonValue>,
}

impl Classification {
    /// Returns a parameter as a non-empty string.
    ///
    /// Numbers are formatted; empty strings, nulls and other types count as
    /// missing.
    #[must_use]
    pub fn parameter(&self, key: &str) -> Option<String> {
        match self.parameters.get(key)? {
            JsonValue::String(s) if !s.trim().is_empty() => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The species name hint, if the classifier extracted one.
    #[must_use]
    pub fn fish_name(&self) -> Option<String> {
        self.parameter(FISH_NAME_PARAM)
    }

    /// Coordinates, if both latitude and longitude were extracted.
    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates {
            lat: self.parameter(LATITUDE_PARAM)?,
            long: self.parameter(LONGITUDE_PARAM)?,
        })
    }
}

/// Trait for intent classifiers.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classifies a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the service cannot be reached or answers with a
    /// non-success status. The caller must not reply to the message.
    async fn query(&self, query: &ClassifierQuery) -> Result<Classification, Report<ClassifierError>>;
}

/// Configuration for the Dialogflow classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct ClassifierConfig {
    /// Agent client access token.
    pub access_token: String,
    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Protocol version sent as the `v` query parameter.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: String,
    /// Locale of user messages.
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_base_url() -> String {
    "https://api.dialogflow.com/v1".to_string()
}

fn default_protocol_version() -> String {
    "20150910".to_string()
}

fn default_locale() -> String {
    "en".to_string()
}

impl ClassifierConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: default_base_url(),
            protocol_version: default_protocol_version(),
            locale: default_locale(),
        }
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Dialogflow (v1 `/query`) classifier.
pub struct DialogflowClassifier {
    http: reqwest::Client,
    config: ClassifierConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    query: &'a str,
    lang: &'a str,
    session_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    result: QueryResult,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    action: String,
    #[serde(default)]
    speech: Option<String>,
    #[serde(default)]
    fulfillment: Option<Fulfillment>,
    #[serde(default)]
    parameters: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
struct Fulfillment {
    #[serde(default)]
    speech: Option<String>,
}

impl From<QueryResult> for Classification {
    fn from(result: QueryResult) -> Self {
        let speech = result
            .speech
            .filter(|s| !s.is_empty())
            .or_else(|| result.fulfillment.and_then(|f| f.speech))
            .unwrap_or_default();
        Self {
            action: result.action,
            speech,
            parameters: result.parameters,
        }
    }
}

impl DialogflowClassifier {
    /// Creates a classifier sharing the given HTTP client.
    #[must_use]
    pub fn new(http: reqwest::Client, config: ClassifierConfig) -> Self {
        Self { http, config }
    }
}

#[async_trait]
impl Classifier for DialogflowClassifier {
    #[instrument(skip(self, query), fields(conversation = %query.conversation_id))]
    async fn query(&self, query: &ClassifierQuery) -> Result<Classification, Report<ClassifierError>> {
        let url = format!("{}/query", self.config.base_url.trim_end_matches('/'));
        let body = QueryRequest {
            query: &query.text,
            lang: &query.locale,
            session_id: query.conversation_id.as_str(),
            source: query.source.as_deref(),
        };

        let response = self
            .http
            .post(url)
            .query(&[("v", self.config.protocol_version.as_str())])
            .bearer_auth(&self.config.access_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ClassifierError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ClassifierError::RequestFailed {
                reason: e.to_string(),
            })?;
        debug!(status = status.as_u16(), body = %text, "classifier response");

        if !status.is_success() {
            return Err(ClassifierError::Rejected {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }

        let parsed: QueryResponse =
            serde_json::from_str(&text).map_err(|e| ClassifierError::ResponseParseFailed {
                reason: e.to_string(),
            })?;

        Ok(parsed.result.into())
    }
}
