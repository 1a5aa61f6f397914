//! External-service clients.
//!
//! Both upstream systems (the WhatsApp gateway and the CRM) are reached
//! through the traits defined here so the orchestration layer can be tested
//! against mocks. Every upstream outcome is a [`ServiceResult`]: transport
//! problems, auth problems and upstream rejections are values, never panics.

pub mod amocrm;
pub mod gupshup;

use async_trait::async_trait;
use derive_more::{Display, Error};
use serde::Serialize;
use std::sync::Arc;

/// Failure of one call against an upstream system.
#[derive(Debug, Clone, Display, Error)]
pub enum ServiceError {
    /// Network-level failure (connect, timeout, TLS). The request may never
    /// have reached the upstream.
    #[display("transport failure: {_0}")]
    Transport(#[error(not(source))] String),

    /// Missing or unusable credentials, including a failed token grant.
    #[display("{_0}")]
    Auth(#[error(not(source))] String),

    /// The upstream answered with a non-success status. `body` is the raw
    /// response text.
    #[display("upstream rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Method not in the supported set; no request was issued.
    #[display("Unsupported method: {_0}")]
    UnsupportedMethod(#[error(not(source))] String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Successful upstream response: HTTP status plus the parsed JSON body
/// (an empty object when the body was empty or not JSON).
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: u16,
    pub data: serde_json::Value,
}

/// Wire envelope reported to HTTP callers, kept shape-compatible with the
/// previous deployment: `{success, data, status_code?, error?}`.
#[derive(Debug, Serialize)]
pub struct CallReport {
    pub success: bool,
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CallReport {
    /// Builds the envelope for an operation that always carries a response
    /// on success.
    pub fn from_result(result: ServiceResult<UpstreamResponse>) -> Self {
        Self::from_outcome(result.map(Some))
    }

    /// Builds the envelope for an operation whose success payload is
    /// optional, e.g. a sync event with no delivery receipt.
    pub fn from_outcome(result: ServiceResult<Option<UpstreamResponse>>) -> Self {
        match result {
            Ok(Some(rsp)) => Self {
                success: true,
                data: rsp.data,
                status_code: Some(rsp.status),
                error: None,
            },
            Ok(None) => Self {
                success: true,
                data: serde_json::json!({}),
                status_code: None,
                error: None,
            },
            Err(err @ ServiceError::Transport(_)) => Self {
                success: false,
                data: serde_json::json!({}),
                status_code: Some(500),
                error: Some(err.to_string()),
            },
            Err(ServiceError::Rejected { status, body }) => Self {
                success: false,
                data: serde_json::from_str(&body).unwrap_or_else(|_| serde_json::json!({})),
                status_code: Some(status),
                error: Some(body),
            },
            Err(err) => Self {
                success: false,
                data: serde_json::json!({}),
                status_code: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Outbound side of the WhatsApp gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GatewayService: Send + Sync {
    /// Sends a plain text message to `destination` (digits only, country
    /// code included). Success means the gateway accepted the message for
    /// delivery, not that it was delivered.
    async fn send_text(&self, destination: String, body: String)
    -> ServiceResult<UpstreamResponse>;

    /// Sends a media message pointing at an externally hosted file.
    async fn send_media(
        &self,
        destination: String,
        kind: gupshup::MediaKind,
        url: String,
        caption: String,
    ) -> ServiceResult<UpstreamResponse>;

    /// Cheap reachability probe against the gateway account endpoint.
    async fn check_reachable(&self) -> ServiceResult<UpstreamResponse>;
}

/// Authenticated CRM operations plus the OAuth token lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CrmService: Send + Sync {
    /// Authorization page URL the user is redirected to.
    fn authorize_url(&self) -> anyhow::Result<String>;

    /// Whether an access token is currently held.
    async fn is_authorized(&self) -> bool;

    /// Authorization-code grant. Replaces the stored token pair on success,
    /// leaves it untouched on failure.
    async fn exchange_code(&self, code: String) -> ServiceResult<()>;

    /// Liveness/auth check against the account endpoint.
    async fn test_connection(&self) -> ServiceResult<UpstreamResponse>;

    /// Creates a contact carrying the phone as a typed custom field.
    async fn create_contact(&self, name: String, phone: String)
    -> ServiceResult<UpstreamResponse>;

    /// Creates a lead linked to an existing contact.
    async fn create_lead(
        &self,
        name: String,
        contact_id: i64,
        price: i64,
    ) -> ServiceResult<UpstreamResponse>;

    /// Attaches a free-text note to an existing lead.
    async fn add_note_to_lead(&self, lead_id: i64, text: String)
    -> ServiceResult<UpstreamResponse>;
}

pub type ImplGatewayService = Arc<dyn GatewayService>;
pub type ImplCrmService = Arc<dyn CrmService>;
