//! # Gupshup Gateway Client
//!
//! Client for the Gupshup WhatsApp messaging API. Outbound messages go as a
//! form-encoded POST where the actual message payload travels JSON-encoded
//! inside the `message` form field; the gateway signals acceptance with
//! HTTP 202.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;

use crate::config;
use crate::consts;
use crate::services::{GatewayService, ServiceError, ServiceResult, UpstreamResponse};

/// Media flavor accepted by the send-media operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Document,
    Video,
}

impl MediaKind {
    /// Parses the wire name used by API callers ("image", "document",
    /// "video").
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "image" => Some(Self::Image),
            "document" => Some(Self::Document),
            "video" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Message payload carried inside the `message` form field.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundPayload {
    /// Plain text message
    Text { text: String },
    /// Image hosted at an external URL; the gateway downloads it
    Image {
        #[serde(rename = "originalUrl")]
        original_url: String,
        #[serde(rename = "previewUrl")]
        preview_url: String,
        caption: String,
    },
    /// Document attachment ("file" on the wire)
    File { url: String, filename: String },
    /// Video hosted at an external URL
    Video { url: String, caption: String },
}

impl OutboundPayload {
    pub fn text(body: String) -> Self {
        Self::Text { text: body }
    }

    /// Builds the payload for a media send. Documents reuse the caption as
    /// the file name, falling back to "document" when none was given.
    pub fn media(kind: MediaKind, url: String, caption: String) -> Self {
        match kind {
            MediaKind::Image => Self::Image {
                original_url: url.clone(),
                preview_url: url,
                caption,
            },
            MediaKind::Document => Self::File {
                url,
                filename: if caption.is_empty() {
                    "document".to_string()
                } else {
                    caption
                },
            },
            MediaKind::Video => Self::Video { url, caption },
        }
    }
}

/// Gupshup API client
pub struct GupshupHandler {
    /// HTTP client for making API requests
    pub client: reqwest::Client,
    /// API key, sent as the `apikey` header on every request
    pub api_key: String,
    /// Application name registered with the gateway
    pub app_name: String,
    /// WhatsApp number messages are sent from
    pub source_number: String,
    /// API base URL, overridable for tests
    pub base_url: String,
}

impl GupshupHandler {
    /// Creates a new gateway client from the application configuration
    pub fn new() -> anyhow::Result<Self> {
        let app_config = config::APP_CONFIG
            .get()
            .context("failed to get app config")?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(app_config.http_timeout_secs))
                .build()?,
            api_key: app_config.gupshup_api_key.clone(),
            app_name: app_config.gupshup_app_name.clone(),
            source_number: app_config.gupshup_source_number.clone(),
            base_url: consts::GUPSHUP_BASE_URL.to_string(),
        })
    }

    /// Posts one message payload to the send endpoint and evaluates the
    /// gateway's accepted/rejected answer.
    async fn post_message(
        &self,
        destination: String,
        payload: OutboundPayload,
    ) -> ServiceResult<UpstreamResponse> {
        let message = serde_json::to_string(&payload)
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let form = [
            ("channel", consts::GUPSHUP_CHANNEL.to_string()),
            ("source", self.source_number.clone()),
            ("destination", destination),
            ("src.name", self.app_name.clone()),
            ("message", message),
        ];

        let response = self
            .client
            .post(format!("{}/sm/api/v1/msg", self.base_url))
            .header("apikey", &self.api_key)
            .form(&form)
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        into_service_result(response, StatusCode::ACCEPTED).await
    }
}

/// Converts a raw gateway response into a [`ServiceResult`]: exactly one
/// status counts as success, everything else is an upstream rejection
/// carrying the body text.
async fn into_service_result(
    response: reqwest::Response,
    accepted: StatusCode,
) -> ServiceResult<UpstreamResponse> {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read response body".to_string());

    if status != accepted {
        return Err(ServiceError::Rejected {
            status: status.as_u16(),
            body: text,
        });
    }

    Ok(UpstreamResponse {
        status: status.as_u16(),
        data: serde_json::from_str(&text).unwrap_or_else(|_| serde_json::json!({})),
    })
}

#[async_trait]
impl GatewayService for GupshupHandler {
    async fn send_text(
        &self,
        destination: String,
        body: String,
    ) -> ServiceResult<UpstreamResponse> {
        self.post_message(destination, OutboundPayload::text(body))
            .await
    }

    async fn send_media(
        &self,
        destination: String,
        kind: MediaKind,
        url: String,
        caption: String,
    ) -> ServiceResult<UpstreamResponse> {
        self.post_message(destination, OutboundPayload::media(kind, url, caption))
            .await
    }

    async fn check_reachable(&self) -> ServiceResult<UpstreamResponse> {
        let response = self
            .client
            .get(format!("{}/sm/api/v1/users/{}", self.base_url, self.app_name))
            .header("apikey", &self.api_key)
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        into_service_result(response, StatusCode::OK).await
    }
}
