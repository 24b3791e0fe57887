use async_trait::async_trait;
use notifyx_engine::sender::{SendError, SendReceipt, TextSender};
use notifyx_types::models::InstanceStatus;
use reqwest::Method;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::fallback::{RequestShape, ShapeMemo};

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("failed to reach gateway: {0}")]
    Transport(String),
    #[error("gateway response was not valid JSON")]
    InvalidJson,
    #[error("all known request formats failed")]
    Exhausted,
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// A live session reported by the gateway. Liveness comes from here; the
/// relational store only knows ownership.
#[derive(Debug, Clone, Serialize)]
pub struct GatewayInstance {
    pub name: String,
    pub status: InstanceStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedInstance {
    #[serde(rename = "instanceName")]
    pub instance_name: String,
    #[serde(rename = "instanceId")]
    pub instance_id: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QrCode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qrcode: Option<String>,
    #[serde(rename = "pairingCode", skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub number: String,
    #[serde(rename = "isGroup")]
    pub is_group: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub members: Option<u64>,
}

/// Thin HTTP client for the external WhatsApp gateway.
pub struct GatewayClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
    memo: ShapeMemo,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest client");
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            http,
            memo: ShapeMemo::new(),
        }
    }

    async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
    ) -> GatewayResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut request = self
            .http
            .request(method, &url)
            .header("apikey", &self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            let message = upstream_error_message(&text)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            debug!(endpoint, status = status.as_u16(), %message, "gateway request failed");
            return Err(GatewayError::Status { status: status.as_u16(), message });
        }

        if text.is_empty() {
            return Ok(json!({}));
        }
        serde_json::from_str(&text).map_err(|_| GatewayError::InvalidJson)
    }

    /// Try the shapes in preference order, starting with the memoized winner
    /// for `key` when there is one.
    async fn try_shapes(&self, key: &str, shapes: &[RequestShape]) -> GatewayResult<Value> {
        if let Some(index) = self.memo.winner(key) {
            if let Some(shape) = shapes.get(index) {
                match self
                    .request(shape.method.clone(), &shape.endpoint, shape.body.as_ref())
                    .await
                {
                    Ok(value) => return Ok(value),
                    Err(e) => {
                        debug!(key, index, error = %e, "cached request shape stopped working");
                        self.memo.forget(key);
                    }
                }
            }
        }

        for (index, shape) in shapes.iter().enumerate() {
            match self
                .request(shape.method.clone(), &shape.endpoint, shape.body.as_ref())
                .await
            {
                Ok(value) => {
                    self.memo.record(key, index);
                    return Ok(value);
                }
                Err(e) => {
                    debug!(key, index, error = %e, "request shape failed");
                }
            }
        }

        warn!(key, tried = shapes.len(), "all request shapes failed");
        Err(GatewayError::Exhausted)
    }

    // -- Operations --

    pub async fn create_instance(
        &self,
        instance_name: &str,
        number: Option<&str>,
    ) -> GatewayResult<CreatedInstance> {
        let token = Uuid::new_v4().to_string();
        let body = json!({
            "instanceName": instance_name,
            "integration": "WHATSAPP-BAILEYS",
            "number": number.unwrap_or(""),
            "token": token,
        });

        let data = self
            .request(Method::POST, "/instance/create", Some(&body))
            .await?;

        Ok(CreatedInstance {
            instance_name: instance_name.to_string(),
            instance_id: data
                .get("instanceId")
                .and_then(Value::as_str)
                .unwrap_or(instance_name)
                .to_string(),
            token,
        })
    }

    pub async fn qr_code(&self, instance_name: &str) -> GatewayResult<QrCode> {
        let data = self
            .request(Method::GET, &format!("/instance/connect/{instance_name}"), None)
            .await?;

        Ok(QrCode {
            qrcode: extract_qr(&data),
            pairing_code: data
                .get("pairingCode")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }

    /// Fallback when `/instance/connect` yields nothing usable: the known qr
    /// endpoints across gateway versions, in preference order.
    pub async fn qr_code_alternative(&self, instance_name: &str) -> GatewayResult<QrCode> {
        let shapes = vec![
            RequestShape::get(format!("/instance/qrcode/{instance_name}")),
            RequestShape::get(format!("/instance/qr-code?instanceName={instance_name}")),
            RequestShape::get(format!("/instance/qr-code/{instance_name}")),
            RequestShape::post("/instance/qrcode", json!({"instanceName": instance_name})),
            RequestShape::post("/instance/qr-code", json!({"instanceName": instance_name})),
            RequestShape::get(format!("/instance/getQrcode?instanceName={instance_name}")),
        ];

        let data = self
            .try_shapes(&format!("qrcode-{instance_name}"), &shapes)
            .await?;

        match extract_qr(&data) {
            Some(qrcode) => Ok(QrCode { qrcode: Some(qrcode), pairing_code: None }),
            None => Err(GatewayError::Exhausted),
        }
    }

    pub async fn fetch_instances(&self) -> GatewayResult<Vec<GatewayInstance>> {
        let data = self
            .request(Method::GET, "/instance/fetchInstances", None)
            .await?;
        Ok(parse_instances(&data))
    }

    pub async fn list_contacts(&self, instance_name: &str) -> GatewayResult<Vec<Contact>> {
        // empty filter brings back every contact
        let body = json!({"where": {}});
        let data = self
            .request(
                Method::POST,
                &format!("/chat/findContacts/{instance_name}"),
                Some(&body),
            )
            .await?;
        Ok(parse_contacts(&data))
    }

    pub async fn send_text(
        &self,
        instance_name: &str,
        to: &str,
        text: &str,
    ) -> GatewayResult<SendReceipt> {
        let number = to.split('@').next().unwrap_or(to);
        debug!(instance = instance_name, number, "sending text message");

        let shapes = vec![
            // original long-form body
            RequestShape::post(
                format!("/message/sendText/{instance_name}"),
                json!({
                    "number": number,
                    "options": {"delay": 1200, "presence": "composing", "linkPreview": true},
                    "textMessage": {"text": text},
                }),
            ),
            // simplified body
            RequestShape::post(
                format!("/message/sendText/{instance_name}"),
                json!({"number": number, "text": text}),
            ),
            // alternate endpoint
            RequestShape::post(
                format!("/message/text/{instance_name}"),
                json!({"number": number, "text": text}),
            ),
            // `to`-keyed body
            RequestShape::post(
                format!("/message/sendText/{instance_name}"),
                json!({"to": number, "text": text}),
            ),
        ];

        let data = self
            .try_shapes(&format!("sendText-{instance_name}"), &shapes)
            .await?;

        let message_id = data
            .pointer("/key/id")
            .or_else(|| data.get("messageId"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();

        Ok(SendReceipt { message_id })
    }

    pub async fn disconnect(&self, instance_name: &str) -> GatewayResult<()> {
        self.request(
            Method::DELETE,
            &format!("/instance/logout?instanceName={instance_name}"),
            None,
        )
        .await?;
        Ok(())
    }

    pub async fn delete_instance(&self, instance_id: &str) -> GatewayResult<()> {
        let id = instance_id.trim();
        let shapes = vec![
            RequestShape::delete(format!("/instance/delete/{id}")),
            RequestShape::delete(format!("/instance/delete?instanceName={id}")),
            RequestShape::delete_with_body("/instance/delete", json!({"instanceId": id})),
            RequestShape::delete_with_body("/instance/delete", json!({"instanceName": id})),
        ];

        self.try_shapes(&format!("delete-{id}"), &shapes).await?;
        Ok(())
    }
}

#[async_trait]
impl TextSender for GatewayClient {
    async fn send_text(
        &self,
        instance: &str,
        to: &str,
        text: &str,
    ) -> Result<SendReceipt, SendError> {
        GatewayClient::send_text(self, instance, to, text)
            .await
            .map_err(|e| SendError(e.to_string()))
    }
}

// -- Response parsing, tolerant of the known upstream spellings --

fn upstream_error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .or_else(|| value.get("error"))
        .and_then(Value::as_str)
        .map(String::from)
}

fn connection_status(raw: Option<&Value>) -> InstanceStatus {
    match raw.and_then(Value::as_str) {
        Some("open") => InstanceStatus::Connected,
        _ => InstanceStatus::Disconnected,
    }
}

/// The instance listing arrives either as a plain array of objects or as a
/// `{instances: {name: {...}}}` map, depending on the gateway version.
fn parse_instances(data: &Value) -> Vec<GatewayInstance> {
    if let Some(items) = data.as_array() {
        return items
            .iter()
            .map(|item| GatewayInstance {
                name: item
                    .get("instanceName")
                    .or_else(|| item.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown")
                    .to_string(),
                status: connection_status(
                    item.get("connectionStatus").or_else(|| item.get("status")),
                ),
            })
            .collect();
    }

    if let Some(map) = data.get("instances").and_then(Value::as_object) {
        return map
            .iter()
            .map(|(name, item)| GatewayInstance {
                name: name.clone(),
                status: connection_status(
                    item.get("connectionStatus").or_else(|| item.get("status")),
                ),
            })
            .collect();
    }

    Vec::new()
}

fn map_contact(item: &Value) -> Contact {
    let id = item
        .get("id")
        .or_else(|| item.get("contactId"))
        .or_else(|| item.get("jid"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();

    let number = item
        .get("remoteJid")
        .and_then(Value::as_str)
        .or_else(|| item.get("id").and_then(Value::as_str))
        .and_then(|jid| jid.split('@').next())
        .or_else(|| item.get("number").and_then(Value::as_str))
        .unwrap_or("")
        .to_string();

    Contact {
        is_group: item.get("isGroup").and_then(Value::as_bool).unwrap_or(false)
            || id.contains("@g.us"),
        name: item
            .get("name")
            .or_else(|| item.get("pushName"))
            .or_else(|| item.get("number"))
            .and_then(Value::as_str)
            .unwrap_or("unnamed contact")
            .to_string(),
        image: item
            .get("profilePicture")
            .or_else(|| item.get("profilePictureUrl"))
            .and_then(Value::as_str)
            .map(String::from),
        members: item
            .get("participants")
            .and_then(Value::as_array)
            .map(|p| p.len() as u64),
        id,
        number,
    }
}

/// Contacts arrive as a bare array, under `contacts`, or under whatever the
/// first array-valued field happens to be.
fn parse_contacts(data: &Value) -> Vec<Contact> {
    if let Some(items) = data.as_array() {
        return items.iter().map(map_contact).collect();
    }
    if let Some(items) = data.get("contacts").and_then(Value::as_array) {
        return items.iter().map(map_contact).collect();
    }
    if let Some(obj) = data.as_object() {
        if let Some(items) = obj.values().find_map(Value::as_array) {
            return items.iter().map(map_contact).collect();
        }
    }
    Vec::new()
}

/// The qr image shows up under several different keys across versions.
fn extract_qr(data: &Value) -> Option<String> {
    data.get("qrcode")
        .or_else(|| data.pointer("/data/qrcode"))
        .or_else(|| data.get("base64Image"))
        .or_else(|| data.get("base64"))
        .or_else(|| data.get("image"))
        .and_then(Value::as_str)
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_array_shaped_instance_listing() {
        let data = json!([
            {"instanceName": "main", "connectionStatus": "open"},
            {"name": "backup", "status": "close"}
        ]);
        let instances = parse_instances(&data);
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[0].name, "main");
        assert_eq!(instances[0].status, InstanceStatus::Connected);
        assert_eq!(instances[1].name, "backup");
        assert_eq!(instances[1].status, InstanceStatus::Disconnected);
    }

    #[test]
    fn parses_map_shaped_instance_listing() {
        let data = json!({"instances": {"main": {"status": "open"}, "backup": {}}});
        let mut instances = parse_instances(&data);
        instances.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(instances.len(), 2);
        assert_eq!(instances[1].name, "main");
        assert_eq!(instances[1].status, InstanceStatus::Connected);
    }

    #[test]
    fn unknown_instance_listing_shape_is_empty() {
        assert!(parse_instances(&json!({"weird": true})).is_empty());
    }

    #[test]
    fn contacts_parse_from_bare_array_and_jid_fields() {
        let data = json!([{
            "id": "5511999@s.whatsapp.net",
            "pushName": "Ana",
            "profilePictureUrl": "https://cdn.example/ana.jpg"
        }]);
        let contacts = parse_contacts(&data);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "Ana");
        assert_eq!(contacts[0].number, "5511999");
        assert!(!contacts[0].is_group);
        assert_eq!(contacts[0].image.as_deref(), Some("https://cdn.example/ana.jpg"));
    }

    #[test]
    fn contacts_parse_from_nested_and_fallback_arrays() {
        let nested = json!({"contacts": [{"jid": "1@g.us", "name": "Team", "participants": [1, 2, 3]}]});
        let contacts = parse_contacts(&nested);
        assert!(contacts[0].is_group);
        assert_eq!(contacts[0].members, Some(3));

        let fallback = json!({"results": [{"id": "2@s.whatsapp.net"}]});
        let contacts = parse_contacts(&fallback);
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].name, "unnamed contact");
    }

    #[test]
    fn qr_extraction_checks_the_known_spellings() {
        assert_eq!(extract_qr(&json!({"qrcode": "abc"})).as_deref(), Some("abc"));
        assert_eq!(
            extract_qr(&json!({"data": {"qrcode": "nested"}})).as_deref(),
            Some("nested")
        );
        assert_eq!(extract_qr(&json!({"base64Image": "b64"})).as_deref(), Some("b64"));
        assert_eq!(extract_qr(&json!({"image": "img"})).as_deref(), Some("img"));
        assert!(extract_qr(&json!({"unrelated": 1})).is_none());
    }

    #[test]
    fn upstream_error_messages_prefer_message_over_error() {
        assert_eq!(
            upstream_error_message(r#"{"message":"bad instance","error":"x"}"#).as_deref(),
            Some("bad instance")
        );
        assert_eq!(
            upstream_error_message(r#"{"error":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert!(upstream_error_message("not json").is_none());
    }
}
