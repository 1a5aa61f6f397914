//! # Gupshup Webhook Schemas
//!
//! Event envelope pushed by the Gupshup gateway. One endpoint receives every
//! event flavor; the `type` field discriminates, and the interesting content
//! sits two levels deep in `payload.payload`.

use serde::Deserialize;

/// Top-level webhook event
#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    /// Event flavor: "message", "message-event" or "user-event".
    /// Missing on some gateway pings, which are acked and ignored.
    #[serde(rename = "type", default)]
    pub event_type: String,
    /// Event body, shape depends on the event flavor
    pub payload: Option<EventPayload>,
}

/// Body of a webhook event
#[derive(Debug, Deserialize)]
pub struct EventPayload {
    /// Gateway-assigned message id
    pub id: Option<String>,
    /// Sender phone of an incoming message
    pub source: Option<String>,
    /// Recipient number of a delivery event
    pub destination: Option<String>,
    /// Content type of an incoming message, e.g. "text"
    #[serde(rename = "type")]
    pub payload_type: Option<String>,
    /// Nested content
    pub payload: Option<InnerPayload>,
}

/// Innermost content of a message or delivery event
#[derive(Debug, Deserialize)]
pub struct InnerPayload {
    /// Text of an incoming text message
    pub text: Option<String>,
    /// Delivery state of a message-event ("sent", "delivered", "read")
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_incoming_message_event_deserialization() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "app": "DemoApp",
            "timestamp": 1714000000000i64,
            "version": 2,
            "type": "message",
            "payload": {
                "id": "wamid-1",
                "source": "79001234567",
                "type": "text",
                "payload": {"text": "Hi there"},
                "sender": {"phone": "79001234567", "name": "Ivan"}
            }
        }))
        .unwrap();

        assert_eq!(event.event_type, "message");
        let payload = event.payload.unwrap();
        assert_eq!(payload.source.as_deref(), Some("79001234567"));
        assert_eq!(payload.payload_type.as_deref(), Some("text"));
        assert_eq!(
            payload.payload.unwrap().text.as_deref(),
            Some("Hi there")
        );
    }

    #[test]
    fn test_delivery_event_deserialization() {
        let event: WebhookEvent = serde_json::from_value(json!({
            "type": "message-event",
            "payload": {
                "id": "evt-1",
                "destination": "79001234567",
                "payload": {"status": "delivered"}
            }
        }))
        .unwrap();

        assert_eq!(event.event_type, "message-event");
        let payload = event.payload.unwrap();
        assert_eq!(payload.destination.as_deref(), Some("79001234567"));
        assert_eq!(
            payload.payload.unwrap().status.as_deref(),
            Some("delivered")
        );
    }

    #[test]
    fn test_event_without_type_defaults_to_empty() {
        let event: WebhookEvent = serde_json::from_value(json!({"health": "ok"})).unwrap();
        assert_eq!(event.event_type, "");
        assert!(event.payload.is_none());
    }
}
