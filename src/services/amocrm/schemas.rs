//! # amoCRM Wire Schemas
//!
//! Request bodies for the amoCRM v4 REST API and the OAuth2 token endpoint.
//! The entity endpoints expect JSON **arrays** of objects even for a single
//! creation, and answer with the created ids under `_embedded`.

use serde::{Deserialize, Serialize};

use crate::consts;

/// OAuth2 token endpoint request, covers both grant types.
#[derive(Debug, Serialize)]
pub struct TokenGrant<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
    pub grant_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
    pub redirect_uri: &'a str,
}

impl<'a> TokenGrant<'a> {
    pub fn authorization_code(
        client_id: &'a str,
        client_secret: &'a str,
        code: &'a str,
        redirect_uri: &'a str,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            grant_type: "authorization_code",
            code: Some(code),
            refresh_token: None,
            redirect_uri,
        }
    }

    pub fn refresh(
        client_id: &'a str,
        client_secret: &'a str,
        refresh_token: &'a str,
        redirect_uri: &'a str,
    ) -> Self {
        Self {
            client_id,
            client_secret,
            grant_type: "refresh_token",
            code: None,
            refresh_token: Some(refresh_token),
            redirect_uri,
        }
    }
}

/// Token endpoint answer. Fields are optional so a malformed 200 can be
/// detected instead of silently storing nothing.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

/// New contact request entry
#[derive(Debug, Serialize)]
pub struct NewContact {
    pub name: String,
    pub custom_fields_values: Vec<ContactField>,
}

impl NewContact {
    /// Contact carrying the phone number as the standard PHONE/WORK custom
    /// field.
    pub fn with_phone(name: String, phone: String) -> Self {
        Self {
            name,
            custom_fields_values: vec![ContactField {
                field_code: consts::AMO_CONTACT_PHONE_FIELD_CODE.to_string(),
                values: vec![FieldValue {
                    value: phone,
                    enum_code: consts::AMO_CONTACT_PHONE_ENUM_CODE.to_string(),
                }],
            }],
        }
    }
}

/// Custom field entry addressed by its field code
#[derive(Debug, Serialize)]
pub struct ContactField {
    pub field_code: String,
    pub values: Vec<FieldValue>,
}

/// Single value of a custom field
#[derive(Debug, Serialize)]
pub struct FieldValue {
    pub value: String,
    pub enum_code: String,
}

/// New lead request entry, linked to one contact at creation time
#[derive(Debug, Serialize)]
pub struct NewLead {
    pub name: String,
    pub price: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<i64>,
    #[serde(rename = "_embedded")]
    pub embedded: LeadEmbedded,
}

impl NewLead {
    pub fn linked_to(name: String, contact_id: i64, price: i64, pipeline_id: Option<i64>) -> Self {
        Self {
            name,
            price,
            pipeline_id,
            embedded: LeadEmbedded {
                contacts: vec![EntityRef { id: contact_id }],
            },
        }
    }
}

/// Embedded references of a new lead
#[derive(Debug, Serialize)]
pub struct LeadEmbedded {
    pub contacts: Vec<EntityRef>,
}

/// Reference to an existing entity by id
#[derive(Debug, Serialize)]
pub struct EntityRef {
    pub id: i64,
}

/// New note request entry
#[derive(Debug, Serialize)]
pub struct NewNote {
    pub entity_id: i64,
    pub note_type: String,
    pub params: NoteParams,
}

impl NewNote {
    /// Free-text note of the standard "common" type.
    pub fn common(lead_id: i64, text: String) -> Self {
        Self {
            entity_id: lead_id,
            note_type: consts::AMO_NOTE_TYPE_COMMON.to_string(),
            params: NoteParams { text },
        }
    }
}

/// Note body
#[derive(Debug, Serialize)]
pub struct NoteParams {
    pub text: String,
}

/// Id of the first contact created by a `/contacts` POST, if the response
/// carries one.
pub fn embedded_contact_id(data: &serde_json::Value) -> Option<i64> {
    data.pointer("/_embedded/contacts/0/id")
        .and_then(serde_json::Value::as_i64)
}

/// Id of the first lead created by a `/leads` POST, if the response carries
/// one.
pub fn embedded_lead_id(data: &serde_json::Value) -> Option<i64> {
    data.pointer("/_embedded/leads/0/id")
        .and_then(serde_json::Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_contact_carries_typed_phone_field() {
        let contact =
            NewContact::with_phone("WhatsApp 79001234567".to_string(), "79001234567".to_string());

        assert_eq!(
            serde_json::to_value(&contact).unwrap(),
            json!({
                "name": "WhatsApp 79001234567",
                "custom_fields_values": [{
                    "field_code": "PHONE",
                    "values": [{"value": "79001234567", "enum_code": "WORK"}]
                }]
            })
        );
    }

    #[test]
    fn test_new_lead_omits_pipeline_when_unset() {
        let lead = NewLead::linked_to("WhatsApp dialog".to_string(), 101, 0, None);
        let value = serde_json::to_value(&lead).unwrap();

        assert!(value.get("pipeline_id").is_none());
        assert_eq!(value["_embedded"]["contacts"][0]["id"], 101);
    }

    #[test]
    fn test_new_lead_includes_configured_pipeline() {
        let lead = NewLead::linked_to("WhatsApp dialog".to_string(), 101, 0, Some(77));
        let value = serde_json::to_value(&lead).unwrap();

        assert_eq!(value["pipeline_id"], 77);
        assert_eq!(value["price"], 0);
    }

    #[test]
    fn test_token_grants_serialize_one_grant_type_each() {
        let code = TokenGrant::authorization_code("id", "secret", "the-code", "http://cb");
        let value = serde_json::to_value(&code).unwrap();
        assert_eq!(value["grant_type"], "authorization_code");
        assert_eq!(value["code"], "the-code");
        assert!(value.get("refresh_token").is_none());

        let refresh = TokenGrant::refresh("id", "secret", "the-refresh", "http://cb");
        let value = serde_json::to_value(&refresh).unwrap();
        assert_eq!(value["grant_type"], "refresh_token");
        assert_eq!(value["refresh_token"], "the-refresh");
        assert!(value.get("code").is_none());
    }

    #[test]
    fn test_embedded_id_extraction() {
        let data = json!({"_embedded": {"contacts": [{"id": 101}, {"id": 102}]}});
        assert_eq!(embedded_contact_id(&data), Some(101));
        assert_eq!(embedded_lead_id(&data), None);

        let data = json!({"_embedded": {"leads": [{"id": 55}]}});
        assert_eq!(embedded_lead_id(&data), Some(55));

        assert_eq!(embedded_contact_id(&json!({})), None);
        assert_eq!(embedded_contact_id(&json!({"_embedded": {"contacts": []}})), None);
    }

    #[test]
    fn test_note_entry_shape() {
        let note = NewNote::common(55, "Отправлено сообщение: Привет".to_string());

        assert_eq!(
            serde_json::to_value(&note).unwrap(),
            json!({
                "entity_id": 55,
                "note_type": "common",
                "params": {"text": "Отправлено сообщение: Привет"}
            })
        );
    }
}
