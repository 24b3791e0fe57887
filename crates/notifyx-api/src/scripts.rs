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

use notifyx_types::api::{Claims, CreateScriptRequest, UpdateScriptRequest};
use notifyx_types::models::MessageScript;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MessageScript>>, ApiError> {
    let scripts = state
        .db
        .list_scripts(state.owner_filter(&claims).as_deref())?;
    Ok(Json(scripts))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateScriptRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }

    let now = Utc::now();
    let script = MessageScript {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        description: req.description,
        content: req.content,
        message_blocks: req.message_blocks.filter(|b| !b.is_empty()),
        tags: req.tags,
        user_id: claims.sub.to_string(),
        created_at: now,
        updated_at: Some(now),
    };

    state.db.insert_script(&script)?;
    info!(script_id = %script.id, "message script created");

    // Re-read so the response carries the projected block view.
    let created = state
        .db
        .get_script(&script.id, None)?
        .ok_or(ApiError::NotFound)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_one(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageScript>, ApiError> {
    let script = state
        .db
        .get_script(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(script))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(req): Json<UpdateScriptRequest>,
) -> Result<Json<MessageScript>, ApiError> {
    let mut script = state
        .db
        .get_script(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    if let Some(name) = req.name {
        script.name = name;
    }
    if let Some(description) = req.description {
        script.description = Some(description);
    }
    if let Some(content) = req.content {
        // plain content replaces whatever was stored, blocks included,
        // unless the same update also carries a block list
        script.content = content;
        if req.message_blocks.is_none() {
            script.message_blocks = None;
        }
    }
    if let Some(blocks) = req.message_blocks {
        // an explicit empty block list drops back to plain content
        script.message_blocks = if blocks.is_empty() { None } else { Some(blocks) };
    }
    if let Some(tags) = req.tags {
        script.tags = Some(tags);
    }
    script.updated_at = Some(Utc::now());

    if !state.db.update_script(&script)? {
        return Err(ApiError::NotFound);
    }

    let updated = state.db.get_script(&id, None)?.ok_or(ApiError::NotFound)?;
    Ok(Json(updated))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state
        .db
        .get_script(&id, state.owner_filter(&claims).as_deref())?
        .ok_or(ApiError::NotFound)?;

    if !state.db.delete_script(&id)? {
        return Err(ApiError::NotFound);
    }
    info!(script_id = %id, "message script deleted");
    Ok(Json(json!({ "success": true })))
}
