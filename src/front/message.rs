//! # Message Endpoints
//!
//! Outbound whatsapp sending. Both endpoints answer HTTP 200 with the wire
//! envelope `{success, data, status_code?, error?}`; delivery problems live
//! inside the envelope, 400 is reserved for malformed requests.

use ntex::util::Bytes;
use ntex::web;
use serde::Deserialize;

use crate::api::phone::normalize_phone;
use crate::api::sync::{self, SyncDirection, SyncEvent};
use crate::front::{AppState, errors::UserError};
use crate::services::{CallReport, gupshup::MediaKind};

const MISSING_MESSAGE_FIELDS: &str = "Missing phone or message in request data";
const MISSING_MEDIA_FIELDS: &str = "Missing phone or url in request data";

/// Body of `POST /api/send-message`
#[derive(Deserialize, Debug)]
pub struct SendMessageRequest {
    pub phone: Option<String>,
    pub message: Option<String>,
}

impl SendMessageRequest {
    /// Returns `(phone, message)` when both fields are present and non-blank
    fn into_fields(self) -> Option<(String, String)> {
        let phone = self.phone.filter(|value| !value.trim().is_empty())?;
        let message = self.message.filter(|value| !value.trim().is_empty())?;

        Some((phone, message))
    }
}

/// Body of `POST /api/send-media`
#[derive(Deserialize, Debug)]
pub struct SendMediaRequest {
    pub phone: Option<String>,
    pub url: Option<String>,
    pub media_type: Option<String>,
    pub caption: Option<String>,
}

impl SendMediaRequest {
    /// Returns `(phone, url)` when both fields are present and non-blank
    fn into_fields(self) -> Option<(String, String)> {
        let phone = self.phone.filter(|value| !value.trim().is_empty())?;
        let url = self.url.filter(|value| !value.trim().is_empty())?;

        Some((phone, url))
    }
}

/// Sends a text message through the gateway and mirrors it into the crm
#[web::post("/send-message")]
pub async fn send_message(
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let request: SendMessageRequest = serde_json::from_slice(&body)
        .map_err(|_| UserError::FormInputValueError(MISSING_MESSAGE_FIELDS.to_string()))?;

    let Some((phone, message)) = request.into_fields() else {
        return Err(UserError::FormInputValueError(MISSING_MESSAGE_FIELDS.to_string()).into());
    };

    let result = sync::sync(
        SyncEvent {
            phone,
            text: message,
            direction: SyncDirection::Outbound,
        },
        &app_state.gateway_service,
        &app_state.crm_service,
    )
    .await;

    Ok(web::HttpResponse::Ok().json(&CallReport::from_outcome(result)))
}

/// Sends a media message (image, document or video) hosted at an external
/// url. Media sends are delivery only; they are not mirrored into the crm.
#[web::post("/send-media")]
pub async fn send_media(
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let request: SendMediaRequest = serde_json::from_slice(&body)
        .map_err(|_| UserError::FormInputValueError(MISSING_MEDIA_FIELDS.to_string()))?;

    let media_type = request.media_type.clone().unwrap_or("image".to_string());
    let Some(kind) = MediaKind::from_name(&media_type) else {
        return Err(
            UserError::FormInputValueError(format!("Unsupported media_type: {media_type}")).into(),
        );
    };

    let caption = request.caption.clone().unwrap_or_default();
    let Some((phone, url)) = request.into_fields() else {
        return Err(UserError::FormInputValueError(MISSING_MEDIA_FIELDS.to_string()).into());
    };

    let result = app_state
        .gateway_service
        .send_media(normalize_phone(&phone), kind, url, caption)
        .await;

    Ok(web::HttpResponse::Ok().json(&CallReport::from_result(result)))
}
