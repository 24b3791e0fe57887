//! Maps either on-disk automation shape to the single canonical in-memory
//! representation. Applied at the store boundary, never leaked past it.

use chrono::{DateTime, NaiveDateTime, Utc};
use notifyx_types::models::{ActionType, Automation, TriggerType};
use serde_json::{Map, Value, json};
use tracing::warn;

use crate::models::AutomationRow;

pub fn normalize(row: AutomationRow) -> Automation {
    if row.has_new_shape() {
        normalize_new(row)
    } else {
        normalize_legacy(row)
    }
}

fn normalize_new(row: AutomationRow) -> Automation {
    let trigger_type = trigger_from_str(row.trigger_type.as_deref().unwrap_or_default());
    let action_type = action_from_str(row.action_type.as_deref().unwrap_or_default());
    let trigger_config = parse_json(row.trigger_config.as_deref());
    let action_config = parse_json(row.action_config.as_deref());
    let is_active = row.is_active.unwrap_or(false);

    // Legacy view derived from the new shape: webhook triggers flatten both
    // configs into the single old `config` document.
    let is_webhook = trigger_type == TriggerType::Webhook;
    let legacy_config = if is_webhook {
        merge_objects(&trigger_config, &action_config)
    } else {
        action_config.clone()
    };

    Automation {
        id: row.id.clone(),
        name: row.name,
        description: row.description,
        trigger_type,
        trigger_config,
        action_type,
        action_config,
        is_active,
        user_id: row.user_id,
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: row.updated_at.as_deref().map(|t| parse_timestamp(t, &row.id)),
        legacy_type: Some(if is_webhook { "webhook" } else { "api" }.to_string()),
        active: Some(is_active),
        config: Some(legacy_config),
        created_at_legacy: Some(row.created_at),
    }
}

fn normalize_legacy(row: AutomationRow) -> Automation {
    let legacy_config = parse_json(row.legacy_config.as_deref());
    let is_webhook = row.legacy_type.as_deref() == Some("webhook");
    let is_active = row.legacy_active.unwrap_or(false);

    let (trigger_type, action_type) = if is_webhook {
        (TriggerType::Webhook, ActionType::SendMessage)
    } else {
        // Old `api` rows had no trigger of their own.
        (TriggerType::CallApi, ActionType::CallApi)
    };

    let trigger_config = if is_webhook {
        pick_keys(&legacy_config, &["path", "secret"])
    } else {
        json!({})
    };
    let action_config = if is_webhook {
        pick_keys(&legacy_config, &["instance", "messageTemplate", "messageBlocks"])
    } else {
        pick_keys(&legacy_config, &["endpoint", "method", "headers", "body"])
    };

    Automation {
        id: row.id.clone(),
        name: row.name,
        description: row.description,
        trigger_type,
        trigger_config,
        action_type,
        action_config,
        is_active,
        user_id: row.user_id,
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: row.updated_at.as_deref().map(|t| parse_timestamp(t, &row.id)),
        legacy_type: row.legacy_type,
        active: Some(is_active),
        config: Some(legacy_config),
        created_at_legacy: Some(row.created_at),
    }
}

fn trigger_from_str(s: &str) -> TriggerType {
    match s {
        "schedule" => TriggerType::Schedule,
        "message_received" => TriggerType::MessageReceived,
        "call_api" => TriggerType::CallApi,
        _ => TriggerType::Webhook,
    }
}

fn action_from_str(s: &str) -> ActionType {
    match s {
        "call_api" => ActionType::CallApi,
        "update_contact" => ActionType::UpdateContact,
        _ => ActionType::SendMessage,
    }
}

fn parse_json(raw: Option<&str>) -> Value {
    raw.and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_else(|| json!({}))
}

/// Shallow merge of two JSON objects, right side winning on key collisions.
fn merge_objects(left: &Value, right: &Value) -> Value {
    let mut merged: Map<String, Value> = left.as_object().cloned().unwrap_or_default();
    if let Some(obj) = right.as_object() {
        for (k, v) in obj {
            merged.insert(k.clone(), v.clone());
        }
    }
    Value::Object(merged)
}

fn pick_keys(source: &Value, keys: &[&str]) -> Value {
    let mut picked = Map::new();
    if let Some(obj) = source.as_object() {
        for key in keys {
            if let Some(v) = obj.get(*key) {
                picked.insert((*key).to_string(), v.clone());
            }
        }
    }
    Value::Object(picked)
}

pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite's datetime('now') produces "YYYY-MM-DD HH:MM:SS" without
            // a timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on record '{}': {}", raw, context, e);
            DateTime::default()
        })
}
