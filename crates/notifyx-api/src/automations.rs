use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::info;
use uuid::Uuid;

use notifyx_types::api::{Claims, CreateAutomationRequest, UpdateAutomationRequest};
use notifyx_types::models::{Automation, ExecutionLog, TriggerType, WebhookTriggerConfig};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<Automation>>, ApiError> {
    let automations = state
        .db
        .list_automations(state.owner_filter(&claims).as_deref())?;
    Ok(Json(automations))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateAutomationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if req.trigger_type == TriggerType::Webhook {
        let config: WebhookTriggerConfig = serde_json::from_value(req.trigger_config.clone())
            .map_err(|_| ApiError::BadRequest("invalid webhook trigger configuration".into()))?;
        if config.path.trim().is_empty() {
            return Err(ApiError::BadRequest("webhook trigger requires a path".into()));
        }
    }

    let now = Utc::now();
    let automation = Automation {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        trigger_type: req.trigger_type,
        trigger_config: non_null(req.trigger_config),
        action_type: req.action_type,
        action_config: non_null(req.action_config),
        is_active: req.is_active,
        user_id: claims.sub.to_string(),
        created_at: now,
        updated_at: Some(now),
        legacy_type: None,
        active: None,
        config: None,
        created_at_legacy: None,
    };

    state.db.insert_automation(&automation)?;
    info!(automation_id = %automation.id, name = %automation.name, "automation created");

    // Re-read so the response carries the normalized legacy view too.
    let created = state
        .db
        .get_automation(&automation.id, None)?
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Automation>, ApiError> {
    let automation = state
        .db
        .get_automation(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(automation))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateAutomationRequest>,
) -> Result<Json<Automation>, ApiError> {
    let mut automation = state
        .db
        .get_automation(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    if let Some(name) = req.name {
        automation.name = name;
    }
    if let Some(description) = req.description {
        automation.description = Some(description);
    }
    if let Some(trigger_type) = req.trigger_type {
        automation.trigger_type = trigger_type;
    }
    if let Some(trigger_config) = req.trigger_config {
        automation.trigger_config = trigger_config;
    }
    if let Some(action_type) = req.action_type {
        automation.action_type = action_type;
    }
    if let Some(action_config) = req.action_config {
        automation.action_config = action_config;
    }
    if let Some(is_active) = req.is_active {
        automation.is_active = is_active;
    }
    automation.updated_at = Some(Utc::now());

    if !state.db.update_automation(&automation)? {
        return Err(ApiError::NotFound);
    }
    info!(automation_id = %id, "automation updated");

    let updated = state
        .db
        .get_automation(&id, None)?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    // Ownership check before the mutation; other tenants' rows read as absent.
    state
        .db
        .get_automation(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    if !state.db.delete_automation(&id)? {
        return Err(ApiError::NotFound);
    }
    info!(automation_id = %id, "automation deleted");
    Ok(Json(json!({ "success": true })))
}

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Vec<ExecutionLog>>, ApiError> {
    state
        .db
        .get_automation(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(state.db.logs_for_automation(&id)?))
}

pub async fn clear_logs(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .get_automation(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    let deleted = state.db.clear_logs(&id)?;
    info!(automation_id = %id, deleted, "execution logs cleared");
    Ok(Json(json!({ "success": true, "deleted": deleted })))
}

fn non_null(value: Value) -> Value {
    if value.is_null() { json!({}) } else { value }
}
