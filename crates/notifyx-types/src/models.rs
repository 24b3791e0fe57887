use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// -- Automations --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Webhook,
    Schedule,
    MessageReceived,
    /// Only produced when normalizing legacy `type = "api"` rows, which carried
    /// no trigger of their own.
    CallApi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SendMessage,
    CallApi,
    UpdateContact,
}

/// One template + post-send delay unit within a multi-step send.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageBlock {
    pub id: String,
    pub content: String,
    /// Seconds to wait after sending this block before the next one.
    #[serde(default)]
    pub delay: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookTriggerConfig {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SendMessageActionConfig {
    pub instance: String,
    pub message_template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_blocks: Option<Vec<MessageBlock>>,
}

impl SendMessageActionConfig {
    /// The ordered blocks this action sends. `messageBlocks` wins when present
    /// and non-empty; otherwise the single `messageTemplate` becomes one block
    /// with no trailing delay.
    pub fn blocks(&self) -> Vec<MessageBlock> {
        match &self.message_blocks {
            Some(blocks) if !blocks.is_empty() => blocks.clone(),
            _ if self.message_template.is_empty() => Vec::new(),
            _ => vec![MessageBlock {
                id: "template".to_string(),
                content: self.message_template.clone(),
                delay: 0.0,
            }],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallApiActionConfig {
    pub endpoint: String,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Canonical in-memory automation. Rows are stored in one of two historical
/// shapes; the store normalizes both into this struct, which also keeps the
/// legacy field names populated so older callers keep working.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Automation {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub trigger_type: TriggerType,
    pub trigger_config: Value,
    pub action_type: ActionType,
    pub action_config: Value,
    pub is_active: bool,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    // Legacy view (old schema naming)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub legacy_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at_legacy: Option<String>,
}

impl Automation {
    pub fn is_webhook(&self) -> bool {
        self.trigger_type == TriggerType::Webhook
    }

    pub fn webhook_config(&self) -> Option<WebhookTriggerConfig> {
        if !self.is_webhook() {
            return None;
        }
        serde_json::from_value(self.trigger_config.clone()).ok()
    }

    pub fn send_message_config(&self) -> Option<SendMessageActionConfig> {
        if self.action_type != ActionType::SendMessage {
            return None;
        }
        serde_json::from_value(self.action_config.clone()).ok()
    }
}

// -- Message scripts --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageScript {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Plain text, or the first block's text when `message_blocks` is set.
    pub content: String,
    #[serde(rename = "messageBlocks", skip_serializing_if = "Option::is_none")]
    pub message_blocks: Option<Vec<MessageBlock>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A script's `content` column holds either plain text or a JSON-encoded block
/// array. When it parses as a non-empty block array, the array is authoritative
/// and the display content collapses to the first block's text.
pub fn project_script_content(raw: &str) -> (String, Option<Vec<MessageBlock>>) {
    if let Ok(blocks) = serde_json::from_str::<Vec<MessageBlock>>(raw) {
        if let Some(first) = blocks.first() {
            return (first.content.clone(), Some(blocks));
        }
    }
    (raw.to_string(), None)
}

/// Inverse of [`project_script_content`]: blocks are persisted as the JSON
/// encoding of the array, plain content as-is.
pub fn script_content_for_storage(content: &str, blocks: Option<&[MessageBlock]>) -> String {
    match blocks {
        Some(blocks) if !blocks.is_empty() => {
            serde_json::to_string(blocks).unwrap_or_else(|_| content.to_string())
        }
        _ => content.to_string(),
    }
}

// -- Instances --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Connected,
    Disconnected,
    Connecting,
    Error,
}

/// Ownership mirror of a gateway session. The gateway is the source of truth
/// for liveness; this record is the source of truth for ownership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub instance_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub status: InstanceStatus,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

// -- Execution logs --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Success,
    Error,
    Pending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: String,
    pub automation_id: String,
    pub event_type: String,
    pub status: LogStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blocks_prefer_message_blocks_over_template() {
        let cfg = SendMessageActionConfig {
            instance: "main".into(),
            message_template: "fallback".into(),
            message_blocks: Some(vec![
                MessageBlock { id: "a".into(), content: "first".into(), delay: 2.0 },
                MessageBlock { id: "b".into(), content: "second".into(), delay: 0.0 },
            ]),
        };
        let blocks = cfg.blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].content, "first");
    }

    #[test]
    fn empty_block_list_falls_back_to_template() {
        let cfg = SendMessageActionConfig {
            instance: "main".into(),
            message_template: "hello".into(),
            message_blocks: Some(vec![]),
        };
        let blocks = cfg.blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].content, "hello");
        assert_eq!(blocks[0].delay, 0.0);
    }

    #[test]
    fn no_template_and_no_blocks_yields_nothing() {
        let cfg = SendMessageActionConfig::default();
        assert!(cfg.blocks().is_empty());
    }

    #[test]
    fn action_config_roundtrips_camel_case_keys() {
        let cfg: SendMessageActionConfig = serde_json::from_value(json!({
            "instance": "main",
            "messageTemplate": "hi",
            "messageBlocks": [{"id": "1", "content": "hi", "delay": 3}]
        }))
        .unwrap();
        assert_eq!(cfg.message_template, "hi");
        assert_eq!(cfg.message_blocks.as_ref().unwrap()[0].delay, 3.0);
    }

    #[test]
    fn script_content_block_array_is_authoritative() {
        let raw = r#"[{"id":"1","content":"first bubble","delay":2},{"id":"2","content":"second"}]"#;
        let (content, blocks) = project_script_content(raw);
        assert_eq!(content, "first bubble");
        let blocks = blocks.unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].delay, 0.0);
    }

    #[test]
    fn script_content_plain_text_passes_through() {
        let (content, blocks) = project_script_content("just a message");
        assert_eq!(content, "just a message");
        assert!(blocks.is_none());
    }

    #[test]
    fn script_content_empty_json_array_is_not_projected() {
        let (content, blocks) = project_script_content("[]");
        assert_eq!(content, "[]");
        assert!(blocks.is_none());
    }
}
