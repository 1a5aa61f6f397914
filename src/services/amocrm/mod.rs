//! # amoCRM Client
//!
//! Authenticated client for the amoCRM v4 REST API. Owns the OAuth token
//! pair: the authorization-code exchange populates it, every successful
//! refresh replaces it wholesale (amoCRM rotates refresh tokens, a used one
//! is dead). The generic [`AmoCrmHandler::call`] engine retries exactly once
//! after a 401 by refreshing the pair; concurrent 401s share a single
//! refresh through the flight guard instead of racing.

pub mod schemas;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

use crate::config;
use crate::services::{CrmService, ServiceError, ServiceResult, UpstreamResponse};
use anyhow::Context;
use schemas::{NewContact, NewLead, NewNote, TokenGrant, TokenResponse};

/// OAuth token pair. Both fields may be empty; an empty access token means
/// unauthenticated, an empty refresh token disables the 401 retry.
#[derive(Clone, Default)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn has_access(&self) -> bool {
        !self.access_token.is_empty()
    }

    pub fn has_refresh(&self) -> bool {
        !self.refresh_token.is_empty()
    }
}

/// Raw reply of one request attempt, before success classification
struct RawReply {
    status: u16,
    text: String,
}

/// amoCRM API client
pub struct AmoCrmHandler {
    /// HTTP client for making API requests
    pub client: reqwest::Client,
    /// Integration client id
    pub client_id: String,
    /// Integration client secret
    pub client_secret: String,
    /// Redirect URI registered with the integration
    pub redirect_uri: String,
    /// Account authorization page the user is sent to
    pub auth_page_url: String,
    /// REST API base, overridable for tests
    pub api_base_url: String,
    /// OAuth2 token endpoint, overridable for tests
    pub token_url: String,
    /// Pipeline new leads land in, when configured
    pub pipeline_id: Option<i64>,
    /// Current token pair
    credentials: RwLock<Credentials>,
    /// Serializes refreshes so concurrent 401s trigger one grant
    refresh_flight: Mutex<()>,
}

impl AmoCrmHandler {
    /// Creates a new CRM client from the application configuration,
    /// seeding the token pair from the optional static config tokens.
    pub fn new() -> anyhow::Result<Self> {
        let app_config = config::APP_CONFIG
            .get()
            .context("failed to get app config")?;

        Ok(Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(app_config.http_timeout_secs))
                .build()?,
            client_id: app_config.amo_client_id.clone(),
            client_secret: app_config.amo_client_secret.clone(),
            redirect_uri: app_config.oauth_redirect_uri(),
            auth_page_url: app_config.amo_auth_url.clone(),
            api_base_url: app_config.amo_api_base_url(),
            token_url: app_config.amo_token_endpoint(),
            pipeline_id: app_config.amo_pipeline_id,
            credentials: RwLock::new(Credentials {
                access_token: app_config.amo_access_token.clone(),
                refresh_token: app_config.amo_refresh_token.clone(),
            }),
            refresh_flight: Mutex::new(()),
        })
    }

    /// Generic authenticated request against the REST API.
    ///
    /// Fails fast when unauthenticated or when the method is outside the
    /// supported set. A 401 answer triggers one refresh followed by one
    /// retry with the new token; if the refresh itself fails the first
    /// 401 rejection is returned unchanged.
    pub async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
    ) -> ServiceResult<UpstreamResponse> {
        let access_token = self.credentials.read().await.access_token.clone();
        if access_token.is_empty() {
            return Err(ServiceError::Auth("No access token available".to_string()));
        }

        if ![Method::GET, Method::POST, Method::PATCH].contains(&method) {
            return Err(ServiceError::UnsupportedMethod(method.to_string()));
        }

        let first = self
            .request_once(endpoint, method.clone(), body, &access_token)
            .await?;

        let can_retry = first.status == StatusCode::UNAUTHORIZED.as_u16()
            && self.credentials.read().await.has_refresh();
        if can_retry {
            match self.refresh_for_retry(&access_token).await {
                Ok(()) => {
                    let renewed = self.credentials.read().await.access_token.clone();
                    let second = self.request_once(endpoint, method, body, &renewed).await?;
                    return classify(second);
                }
                Err(err) => log::warn!("token refresh after 401 failed: {err}"),
            }
        }

        classify(first)
    }

    /// Refresh-token grant. Fails fast when no refresh token is held;
    /// on success both tokens are replaced.
    pub async fn refresh(&self) -> ServiceResult<()> {
        let _flight = self.refresh_flight.lock().await;

        let current = self.credentials.read().await.clone();
        if !current.has_refresh() {
            return Err(ServiceError::Auth("No refresh token available".to_string()));
        }

        self.rotate_credentials(&current.refresh_token).await
    }

    /// Refresh path of the 401 retry. Holds the flight guard; when another
    /// request already rotated the pair while this one was waiting, the
    /// grant is skipped and the rotated pair is used as-is.
    async fn refresh_for_retry(&self, observed_access: &str) -> ServiceResult<()> {
        let _flight = self.refresh_flight.lock().await;

        let current = self.credentials.read().await.clone();
        if current.access_token != observed_access {
            return Ok(());
        }
        if !current.has_refresh() {
            return Err(ServiceError::Auth("No refresh token available".to_string()));
        }

        self.rotate_credentials(&current.refresh_token).await
    }

    /// Performs the refresh grant and stores the renewed pair. Caller must
    /// hold the flight guard.
    async fn rotate_credentials(&self, refresh_token: &str) -> ServiceResult<()> {
        let grant = TokenGrant::refresh(
            &self.client_id,
            &self.client_secret,
            refresh_token,
            &self.redirect_uri,
        );
        let renewed = self.request_grant(&grant).await?;
        *self.credentials.write().await = renewed;
        Ok(())
    }

    /// Posts one grant to the token endpoint and extracts the new pair.
    /// Stored state is not touched here, so a failed grant leaves the
    /// previous tokens usable.
    async fn request_grant(&self, grant: &TokenGrant<'_>) -> ServiceResult<Credentials> {
        let response = self
            .client
            .post(&self.token_url)
            .json(grant)
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        if status != StatusCode::OK {
            return Err(ServiceError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let tokens: TokenResponse = serde_json::from_str(&text)
            .map_err(|err| ServiceError::Auth(format!("unreadable token response: {err}")))?;
        let Some(access_token) = tokens.access_token else {
            return Err(ServiceError::Auth(
                "token endpoint returned no access_token".to_string(),
            ));
        };

        Ok(Credentials {
            access_token,
            refresh_token: tokens.refresh_token.unwrap_or_default(),
        })
    }

    /// Issues a single bearer-authenticated request attempt.
    async fn request_once(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        access_token: &str,
    ) -> ServiceResult<RawReply> {
        let mut request = self
            .client
            .request(method, format!("{}{}", self.api_base_url, endpoint))
            .bearer_auth(access_token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read response body".to_string());

        Ok(RawReply { status, text })
    }
}

/// Success is exactly {200, 201, 204}; anything else is a rejection
/// carrying the raw body.
fn classify(reply: RawReply) -> ServiceResult<UpstreamResponse> {
    let data = serde_json::from_str(&reply.text).unwrap_or_else(|_| serde_json::json!({}));

    if matches!(reply.status, 200 | 201 | 204) {
        return Ok(UpstreamResponse {
            status: reply.status,
            data,
        });
    }

    Err(ServiceError::Rejected {
        status: reply.status,
        body: reply.text,
    })
}

/// Opaque anti-replay value for the authorization redirect. A time hash is
/// enough here; the callback does not bind sessions to it.
fn oauth_state() -> String {
    let now = chrono::Utc::now().timestamp_micros().to_string();
    hex::encode(Sha256::digest(now.as_bytes()))
}

#[async_trait]
impl CrmService for AmoCrmHandler {
    fn authorize_url(&self) -> anyhow::Result<String> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_page_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("state", oauth_state().as_str()),
            ],
        )
        .context("invalid authorization page URL")?;

        Ok(url.to_string())
    }

    async fn is_authorized(&self) -> bool {
        self.credentials.read().await.has_access()
    }

    async fn exchange_code(&self, code: String) -> ServiceResult<()> {
        let grant = TokenGrant::authorization_code(
            &self.client_id,
            &self.client_secret,
            &code,
            &self.redirect_uri,
        );
        let granted = self.request_grant(&grant).await?;
        *self.credentials.write().await = granted;
        Ok(())
    }

    async fn test_connection(&self) -> ServiceResult<UpstreamResponse> {
        self.call("/account", Method::GET, None).await
    }

    async fn create_contact(
        &self,
        name: String,
        phone: String,
    ) -> ServiceResult<UpstreamResponse> {
        let body = serde_json::to_value([NewContact::with_phone(name, phone)])
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        self.call("/contacts", Method::POST, Some(&body)).await
    }

    async fn create_lead(
        &self,
        name: String,
        contact_id: i64,
        price: i64,
    ) -> ServiceResult<UpstreamResponse> {
        let body =
            serde_json::to_value([NewLead::linked_to(name, contact_id, price, self.pipeline_id)])
                .map_err(|err| ServiceError::Transport(err.to_string()))?;

        self.call("/leads", Method::POST, Some(&body)).await
    }

    async fn add_note_to_lead(&self, lead_id: i64, text: String) -> ServiceResult<UpstreamResponse> {
        let body = serde_json::to_value([NewNote::common(lead_id, text)])
            .map_err(|err| ServiceError::Transport(err.to_string()))?;

        // Bulk notes endpoint; the lead is targeted by entity_id in the body
        self.call("/leads/notes", Method::POST, Some(&body)).await
    }
}
