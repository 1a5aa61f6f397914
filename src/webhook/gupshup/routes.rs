//! # Gupshup Webhook Routes

use ntex::util::Bytes;
use ntex::web;
use serde_json::json;

use super::handler::process_webhook;
use super::schemas::WebhookEvent;
use crate::front::AppState;
use crate::front::errors::UserError;

/// Entry point for gupshup webhook notifications.
///
/// Gupshup expects a 2xx ack for every delivery attempt, so the response is
/// a fixed success envelope no matter what the sync did with the event.
#[web::post("")]
pub async fn receive(
    body: Bytes,
    app_state: web::types::State<AppState>,
) -> Result<web::HttpResponse, web::Error> {
    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|err| UserError::FormInputValueError(format!("invalid webhook payload: {err}")))?;

    process_webhook(event, &app_state.gateway_service, &app_state.crm_service).await;

    Ok(web::HttpResponse::Ok().json(&json!({"success": true})))
}
