use std::time::Duration;

use chrono::Utc;
use notifyx_types::models::{ActionType, Automation};
use serde_json::{Map, Value, json};
use tracing::{info, warn};

use crate::sender::TextSender;
use crate::template;

/// Outcome of one automation invocation, surfaced to the webhook dispatcher.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub message: String,
    pub details: Option<Value>,
}

impl ExecutionOutcome {
    fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            details: None,
        }
    }
}

/// Run a `send_message` automation against a webhook payload.
///
/// Blocks are sent in array order; each block's template is rendered against
/// the payload, and the configured delay is honored between blocks. The first
/// send failure aborts the remaining sequence.
pub async fn execute_send_message(
    automation: &Automation,
    payload: &Map<String, Value>,
    sender: &dyn TextSender,
) -> ExecutionOutcome {
    if automation.action_type != ActionType::SendMessage {
        return ExecutionOutcome::failure("automation action is not send_message");
    }
    let Some(config) = automation.send_message_config() else {
        return ExecutionOutcome::failure("automation has no send_message configuration");
    };

    let recipient = match payload.get("telefone") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return ExecutionOutcome::failure("payload is missing the 'telefone' field"),
    };

    let blocks = config.blocks();
    if blocks.is_empty() {
        return ExecutionOutcome::failure("automation has no message content configured");
    }

    let total = blocks.len();
    for (index, block) in blocks.iter().enumerate() {
        let text = template::render(&block.content, payload);
        info!(
            automation_id = %automation.id,
            block = index + 1,
            total,
            "sending message block"
        );

        if let Err(e) = sender.send_text(&config.instance, &recipient, &text).await {
            warn!(
                automation_id = %automation.id,
                block = index + 1,
                error = %e,
                "send failed, aborting remaining blocks"
            );
            return ExecutionOutcome::failure(format!(
                "failed to send message {} of {}: {}",
                index + 1,
                total,
                e
            ));
        }

        let last = index + 1 == total;
        if !last && block.delay > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(block.delay)).await;
        }
    }

    ExecutionOutcome {
        success: true,
        message: format!("automation executed: {total} message(s) sent"),
        details: Some(json!({
            "automationId": automation.id,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    }
}
