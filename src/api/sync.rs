//! # Message Sync
//!
//! One message in either direction drives the same pipeline: deliver it (for
//! outbound traffic) and mirror it into the crm as a contact, a lead and a
//! note. The mirror is a side channel; a crm hiccup never fails a delivery
//! that already happened.

use crate::api::phone::normalize_phone;
use crate::consts::DEFAULT_LEAD_PRICE;
use crate::services::amocrm::schemas::{embedded_contact_id, embedded_lead_id};
use crate::services::{ImplCrmService, ImplGatewayService, ServiceResult, UpstreamResponse};

/// Which side produced the message being synced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Sent by us through the gateway
    Outbound,
    /// Received from a customer via webhook
    Inbound,
}

impl SyncDirection {
    /// Note body for the mirrored message. Crm notes are read by
    /// russian-speaking managers, so the direction prefix is russian.
    fn note_text(self, text: &str) -> String {
        match self {
            Self::Outbound => format!("Отправлено сообщение: {text}"),
            Self::Inbound => format!("Получено сообщение: {text}"),
        }
    }
}

/// A single whatsapp message to deliver and mirror
#[derive(Debug)]
pub struct SyncEvent {
    pub phone: String,
    pub text: String,
    pub direction: SyncDirection,
}

/// Drives delivery and crm mirroring for one message.
///
/// Outbound events go through the gateway first; a delivery failure aborts
/// the sync and surfaces unchanged. Inbound events skip straight to the
/// mirror. The returned response is the gateway one (`None` for inbound
/// traffic), untouched by whatever happened on the crm side.
pub async fn sync(
    event: SyncEvent,
    gateway: &ImplGatewayService,
    crm: &ImplCrmService,
) -> ServiceResult<Option<UpstreamResponse>> {
    let phone = normalize_phone(&event.phone);

    let delivery = match event.direction {
        SyncDirection::Outbound => {
            Some(gateway.send_text(phone.clone(), event.text.clone()).await?)
        }
        SyncDirection::Inbound => None,
    };

    mirror_to_crm(&phone, &event.text, event.direction, crm).await;

    Ok(delivery)
}

/// Chains contact, lead and note creation for one synced message.
///
/// Each step needs the id produced by the previous one, so the chain stops at
/// the first step that fails or answers without an id. Failures are logged
/// and swallowed.
async fn mirror_to_crm(phone: &str, text: &str, direction: SyncDirection, crm: &ImplCrmService) {
    if !crm.is_authorized().await {
        log::debug!("crm mirror skipped: no access token");
        return;
    }

    let contact = match crm
        .create_contact(format!("WhatsApp {phone}"), phone.to_string())
        .await
    {
        Ok(response) => response,
        Err(err) => {
            log::warn!("crm contact creation failed: {err}");
            return;
        }
    };
    let Some(contact_id) = embedded_contact_id(&contact.data) else {
        log::warn!("crm contact response carries no contact id");
        return;
    };

    let lead = match crm
        .create_lead(
            format!("WhatsApp диалог с {phone}"),
            contact_id,
            DEFAULT_LEAD_PRICE,
        )
        .await
    {
        Ok(response) => response,
        Err(err) => {
            log::warn!("crm lead creation failed: {err}");
            return;
        }
    };
    let Some(lead_id) = embedded_lead_id(&lead.data) else {
        log::warn!("crm lead response carries no lead id");
        return;
    };

    if let Err(err) = crm
        .add_note_to_lead(lead_id, direction.note_text(text))
        .await
    {
        log::warn!("crm note creation failed: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MockCrmService, MockGatewayService, ServiceError};
    use mockall::predicate::*;
    use serde_json::json;
    use std::sync::Arc;

    fn accepted() -> UpstreamResponse {
        UpstreamResponse {
            status: 202,
            data: json!({"status": "submitted", "messageId": "gBEGkYiEB1VXAgl"}),
        }
    }

    fn contact_created(id: i64) -> UpstreamResponse {
        UpstreamResponse {
            status: 200,
            data: json!({"_embedded": {"contacts": [{"id": id}]}}),
        }
    }

    fn lead_created(id: i64) -> UpstreamResponse {
        UpstreamResponse {
            status: 200,
            data: json!({"_embedded": {"leads": [{"id": id}]}}),
        }
    }

    fn note_created() -> UpstreamResponse {
        UpstreamResponse {
            status: 200,
            data: json!({}),
        }
    }

    fn outbound(phone: &str, text: &str) -> SyncEvent {
        SyncEvent {
            phone: phone.to_string(),
            text: text.to_string(),
            direction: SyncDirection::Outbound,
        }
    }

    #[ntex::test]
    async fn test_outbound_message_mirrors_contact_lead_and_note() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .with(eq("79001234567".to_string()), eq("Hello".to_string()))
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact()
            .with(
                eq("WhatsApp 79001234567".to_string()),
                eq("79001234567".to_string()),
            )
            .times(1)
            .returning(|_, _| Ok(contact_created(101)));
        crm.expect_create_lead()
            .with(
                eq("WhatsApp диалог с 79001234567".to_string()),
                eq(101),
                eq(DEFAULT_LEAD_PRICE),
            )
            .times(1)
            .returning(|_, _, _| Ok(lead_created(555)));
        crm.expect_add_note_to_lead()
            .with(eq(555), eq("Отправлено сообщение: Hello".to_string()))
            .times(1)
            .returning(|_, _| Ok(note_created()));

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let delivery = sync(outbound("+7 900 123-45-67", "Hello"), &gateway, &crm)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(delivery.status, 202);
    }

    #[ntex::test]
    async fn test_failed_delivery_surfaces_and_skips_crm() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Err(ServiceError::Transport("connection refused".to_string())));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized().times(0);
        crm.expect_create_contact().times(0);

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let result = sync(outbound("79001234567", "Hello"), &gateway, &crm).await;

        assert!(matches!(result, Err(ServiceError::Transport(_))));
    }

    #[ntex::test]
    async fn test_unauthorized_crm_keeps_delivery_result() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .times(1)
            .returning(|| false);
        crm.expect_create_contact().times(0);

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let delivery = sync(outbound("79001234567", "Hello"), &gateway, &crm)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(delivery.status, 202);
    }

    #[ntex::test]
    async fn test_inbound_message_never_touches_gateway() {
        let gateway = MockGatewayService::new();

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact()
            .times(1)
            .returning(|_, _| Ok(contact_created(7)));
        crm.expect_create_lead()
            .times(1)
            .returning(|_, _, _| Ok(lead_created(8)));
        crm.expect_add_note_to_lead()
            .with(eq(8), eq("Получено сообщение: Привет".to_string()))
            .times(1)
            .returning(|_, _| Ok(note_created()));

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let event = SyncEvent {
            phone: "89001234567".to_string(),
            text: "Привет".to_string(),
            direction: SyncDirection::Inbound,
        };
        let delivery = sync(event, &gateway, &crm).await.unwrap();

        assert!(delivery.is_none());
    }

    #[ntex::test]
    async fn test_contact_failure_stops_mirror_chain() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact().times(1).returning(|_, _| {
            Err(ServiceError::Rejected {
                status: 400,
                body: r#"{"title":"Bad Request"}"#.to_string(),
            })
        });
        crm.expect_create_lead().times(0);
        crm.expect_add_note_to_lead().times(0);

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let result = sync(outbound("79001234567", "Hello"), &gateway, &crm).await;

        assert!(result.is_ok());
    }

    #[ntex::test]
    async fn test_contact_without_id_stops_mirror_chain() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact().times(1).returning(|_, _| {
            Ok(UpstreamResponse {
                status: 200,
                data: json!({"_embedded": {"contacts": []}}),
            })
        });
        crm.expect_create_lead().times(0);

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let result = sync(outbound("79001234567", "Hello"), &gateway, &crm).await;

        assert!(result.is_ok());
    }

    #[ntex::test]
    async fn test_lead_failure_skips_note() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact()
            .times(1)
            .returning(|_, _| Ok(contact_created(101)));
        crm.expect_create_lead()
            .times(1)
            .returning(|_, _, _| Err(ServiceError::Transport("timed out".to_string())));
        crm.expect_add_note_to_lead().times(0);

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let result = sync(outbound("79001234567", "Hello"), &gateway, &crm).await;

        assert!(result.is_ok());
    }

    #[ntex::test]
    async fn test_note_failure_is_swallowed() {
        let mut gateway = MockGatewayService::new();
        gateway
            .expect_send_text()
            .times(1)
            .returning(|_, _| Ok(accepted()));

        let mut crm = MockCrmService::new();
        crm.expect_is_authorized()
            .returning(|| true);
        crm.expect_create_contact()
            .times(1)
            .returning(|_, _| Ok(contact_created(101)));
        crm.expect_create_lead()
            .times(1)
            .returning(|_, _, _| Ok(lead_created(555)));
        crm.expect_add_note_to_lead()
            .times(1)
            .returning(|_, _| Err(ServiceError::Transport("timed out".to_string())));

        let gateway: ImplGatewayService = Arc::new(gateway);
        let crm: ImplCrmService = Arc::new(crm);

        let delivery = sync(outbound("79001234567", "Hello"), &gateway, &crm)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(delivery.status, 202);
    }
}
