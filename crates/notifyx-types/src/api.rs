use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::models::{ActionType, MessageBlock, TriggerType};

// -- JWT Claims --

/// JWT claims shared between the REST middleware and the auth handlers.
/// Canonical definition lives here in notifyx-types to eliminate duplication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Generic envelope --

/// Uniform `{success, message?, data?, error?}` envelope used by the
/// gateway-proxy and send endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, message: None, data: Some(data), error: None }
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Self {
        Self { success: true, message: Some(message.into()), data: Some(data), error: None }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self { success: false, message: None, data: None, error: Some(error.into()) }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Automations --

#[derive(Debug, Deserialize)]
pub struct CreateAutomationRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub trigger_config: Value,
    pub action_type: ActionType,
    #[serde(default)]
    pub action_config: Value,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAutomationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub trigger_type: Option<TriggerType>,
    #[serde(default)]
    pub trigger_config: Option<Value>,
    #[serde(default)]
    pub action_type: Option<ActionType>,
    #[serde(default)]
    pub action_config: Option<Value>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Summary row for the webhook self-test listing.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookSummary {
    pub id: String,
    pub name: String,
    pub path: String,
    pub instance: String,
}

// -- Message scripts --

#[derive(Debug, Deserialize)]
pub struct CreateScriptRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default, rename = "messageBlocks")]
    pub message_blocks: Option<Vec<MessageBlock>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateScriptRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, rename = "messageBlocks")]
    pub message_blocks: Option<Vec<MessageBlock>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

// -- Instances --

#[derive(Debug, Deserialize)]
pub struct CreateInstanceRequest {
    #[serde(rename = "instanceName")]
    pub instance_name: String,
    #[serde(default)]
    pub number: Option<String>,
}

// -- Compose / send --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub id: String,
    pub number: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SendTextRequest {
    pub instance: String,
    pub to: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SendSequenceRequest {
    pub instance: String,
    pub recipient: Recipient,
    pub messages: Vec<String>,
    /// Seconds between consecutive messages.
    #[serde(default)]
    pub delay: f64,
}

#[derive(Debug, Deserialize)]
pub struct SendBulkRequest {
    pub instance: String,
    pub recipients: Vec<Recipient>,
    pub message: String,
}
