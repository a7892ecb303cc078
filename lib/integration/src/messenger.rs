//! Messenger platform client: delivery, sender profiles and page setup.

use crate::error::DeliveryError;
use crate::image_cache::ImageCache;
use async_trait::async_trait;
use fishbot_core::ConversationId;
use fishbot_reply::{Attachment, MessageSegment, QuickReply, TemplateElement};
use reqwest::multipart::{Form, Part};
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Payload sent when a user taps "Get started".
pub const GET_STARTED_PAYLOAD: &str = "Get started";

/// Result of delivering one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The platform accepted the message.
    Delivered,
    /// The platform answered with a non-success status.
    Rejected { status: u16, body: String },
    /// The message never reached the platform.
    Failed { reason: String },
}

impl DeliveryOutcome {
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered)
    }
}

/// Trait for sending rendered messages.
#[async_trait]
pub trait MessageDelivery: Send + Sync {
    /// Sends one message, resolving any deferred image first.
    ///
    /// Failures are logged and reported in the outcome, never raised.
    async fn send(&self, recipient: &ConversationId, segment: &MessageSegment) -> DeliveryOutcome;
}

/// Trait for looking up how to address a sender.
#[async_trait]
pub trait ProfileLookup: Send + Sync {
    /// The sender's first name, if the platform shares it.
    async fn display_name(&self, user: &ConversationId) -> Option<String>;
}

/// Messenger platform configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MessengerConfig {
    /// Page access token.
    pub access_token: String,
    /// Token expected in the webhook verification handshake.
    pub verify_token: String,
    /// App secret used to sign webhook payloads.
    pub app_secret: String,
    /// Graph API base URL.
    #[serde(default = "default_graph_url")]
    pub graph_url: String,
    /// Graph API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Base URL that relative `[image:<name>]` names are resolved against.
    #[serde(default)]
    pub image_base_url: Option<String>,
}

fn default_graph_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v2.12".to_string()
}

impl MessengerConfig {
    /// Creates a configuration with defaults for optional fields.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        verify_token: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            verify_token: verify_token.into(),
            app_secret: app_secret.into(),
            graph_url: default_graph_url(),
            api_version: default_api_version(),
            image_base_url: None,
        }
    }

    #[must_use]
    pub fn with_graph_url(mut self, graph_url: impl Into<String>) -> Self {
        self.graph_url = graph_url.into();
        self
    }

    #[must_use]
    pub fn with_image_base_url(mut self, image_base_url: impl Into<String>) -> Self {
        self.image_base_url = Some(image_base_url.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.graph_url.trim_end_matches('/'),
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    /// Resolves an image name from a template to a fetchable URL.
    #[must_use]
    pub fn image_url(&self, source: &str) -> String {
        if source.starts_with("http://") || source.starts_with("https://") {
            return source.to_string();
        }
        match &self.image_base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                source.trim_start_matches('/')
            ),
            None => source.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attachment: Option<OutgoingAttachment<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_replies: Option<&'a [QuickReply]>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
enum OutgoingAttachment<'a> {
    /// Bytes travel in the multipart `filedata` field.
    Image { is_reusable: bool },
    Template(TemplatePayload<'a>),
}

#[derive(Debug, Serialize)]
struct TemplatePayload<'a> {
    template_type: &'static str,
    elements: &'a [TemplateElement],
}

impl<'a> From<&'a MessageSegment> for OutgoingMessage<'a> {
    fn from(segment: &'a MessageSegment) -> Self {
        let attachment = segment.attachment.as_ref().map(|a| match a {
            Attachment::Image { .. } => OutgoingAttachment::Image { is_reusable: true },
            Attachment::Template(template) => OutgoingAttachment::Template(TemplatePayload {
                template_type: "generic",
                elements: &template.elements,
            }),
        });
        Self {
            text: segment.text.as_deref(),
            attachment,
            quick_replies: (!segment.quick_replies.is_empty())
                .then_some(segment.quick_replies.as_slice()),
        }
    }
}

#[derive(Debug, Serialize)]
struct Recipient<'a> {
    id: &'a str,
}

#[derive(Debug, Deserialize)]
struct Profile {
    #[serde(default)]
    first_name: Option<String>,
}

/// Messenger Send/Graph API client.
pub struct MessengerClient {
    http: reqwest::Client,
    config: MessengerConfig,
    images: Arc<ImageCache>,
}

impl MessengerClient {
    #[must_use]
    pub fn new(http: reqwest::Client, config: MessengerConfig, images: Arc<ImageCache>) -> Self {
        Self {
            http,
            config,
            images,
        }
    }

    async fn build_form(
        &self,
        recipient: &ConversationId,
        segment: &MessageSegment,
    ) -> Result<Form, Report<DeliveryError>> {
        let encode = |e: serde_json::Error| DeliveryError::EncodingFailed {
            reason: e.to_string(),
        };
        let recipient_json = serde_json::to_string(&Recipient {
            id: recipient.as_str(),
        })
        .map_err(encode)?;
        let message_json =
            serde_json::to_string(&OutgoingMessage::from(segment)).map_err(encode)?;

        let mut form = Form::new()
            .text("messaging_type", "RESPONSE")
            .text("recipient", recipient_json)
            .text("message", message_json);

        if let Some(Attachment::Image { source }) = &segment.attachment {
            let url = self.config.image_url(source);
            let bytes = self.images.get_or_fetch(&self.http, &url).await?;
            let part = Part::bytes(bytes.to_vec())
                .file_name("image.png")
                .mime_str("image/png")
                .map_err(|e| DeliveryError::EncodingFailed {
                    reason: e.to_string(),
                })?;
            form = form.part("filedata", part);
        }

        Ok(form)
    }

    async fn try_send(
        &self,
        recipient: &ConversationId,
        segment: &MessageSegment,
    ) -> Result<reqwest::Response, Report<DeliveryError>> {
        let form = self.build_form(recipient, segment).await?;
        let response = self
            .http
            .post(self.config.endpoint("me/messages"))
            .query(&[("access_token", self.config.access_token.as_str())])
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed {
                reason: e.to_string(),
            })?;
        Ok(response)
    }

    /// Registers the "Get started" button on the page.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform rejects the profile update.
    #[instrument(skip(self))]
    pub async fn setup_profile(&self) -> Result<(), Report<DeliveryError>> {
        let body = serde_json::json!({
            "get_started": { "payload": GET_STARTED_PAYLOAD }
        });
        let response = self
            .http
            .post(self.config.endpoint("me/messenger_profile"))
            .query(&[("access_token", self.config.access_token.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| DeliveryError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body: text,
            }
            .into());
        }
        info!(response = %text, "messenger profile updated");
        Ok(())
    }
}

#[async_trait]
impl MessageDelivery for MessengerClient {
    #[instrument(skip(self, segment), fields(recipient = %recipient))]
    async fn send(&self, recipient: &ConversationId, segment: &MessageSegment) -> DeliveryOutcome {
        match self.try_send(recipient, segment).await {
            Ok(response) if response.status().is_success() => {
                debug!("message delivered");
                DeliveryOutcome::Delivered
            }
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                error!(status, body = %body, "messenger rejected message");
                DeliveryOutcome::Rejected { status, body }
            }
            Err(report) => {
                error!(error = %report, "message delivery failed");
                DeliveryOutcome::Failed {
                    reason: report.to_string(),
                }
            }
        }
    }
}

#[async_trait]
impl ProfileLookup for MessengerClient {
    #[instrument(skip(self), fields(user = %user))]
    async fn display_name(&self, user: &ConversationId) -> Option<String> {
        let response = self
            .http
            .get(self.config.endpoint(user.as_str()))
            .query(&[
                ("fields", "first_name"),
                ("access_token", self.config.access_token.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = response.status().as_u16(), "profile lookup rejected");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "profile lookup failed");
                return None;
            }
        };

        match response.json::<Profile>().await {
            Ok(profile) => profile.first_name,
            Err(e) => {
                warn!(error = %e, "failed to parse profile");
                None
            }
        }
    }
}
