//! # Gupshup Webhook Handler
//!
//! Filters webhook events down to incoming messages and dispatches them to
//! the inbound sync. Every other event flavor is dropped here.

use super::schemas::WebhookEvent;
use crate::api::sync::{self, SyncDirection, SyncEvent};
use crate::services::{ImplCrmService, ImplGatewayService};

/// Incoming text message extracted from a webhook event
#[derive(Debug, PartialEq, Eq)]
pub struct IncomingMessage {
    pub phone: String,
    pub text: String,
}

/// Extracts the message content of a webhook event.
///
/// Only events of type "message" with a sender phone qualify; a message
/// without text (a sticker, a location) syncs with an empty body. Delivery
/// receipts and user events yield `None`.
pub fn extract_message(event: &WebhookEvent) -> Option<IncomingMessage> {
    if event.event_type != "message" {
        return None;
    }

    let payload = event.payload.as_ref()?;
    let phone = payload.source.clone()?;
    let text = payload
        .payload
        .as_ref()
        .and_then(|inner| inner.text.clone())
        .unwrap_or_default();

    Some(IncomingMessage { phone, text })
}

/// Runs the inbound sync for a webhook event carrying a message. Events
/// without one are logged and dropped; the caller acks either way.
pub async fn process_webhook(
    event: WebhookEvent,
    gateway: &ImplGatewayService,
    crm: &ImplCrmService,
) {
    let Some(message) = extract_message(&event) else {
        log::debug!("gupshup webhook ignored event of type {:?}", event.event_type);
        return;
    };

    log::info!("incoming whatsapp message from {}", message.phone);

    let sync_event = SyncEvent {
        phone: message.phone,
        text: message.text,
        direction: SyncDirection::Inbound,
    };
    if let Err(err) = sync::sync(sync_event, gateway, crm).await {
        log::warn!("inbound sync failed: {err}");
    }
}
