use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use tracing::{info, warn};

use notifyx_gateway::{Contact, GatewayInstance, QrCode};
use notifyx_types::api::{ApiResponse, Claims, CreateInstanceRequest};
use notifyx_types::models::{Instance, InstanceStatus};

use crate::auth::AppState;
use crate::error::ApiError;

/// Gateway create + mirrored ownership insert. The two stores can drift
/// afterwards; the listing endpoint intersects them by name.
pub async fn create(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateInstanceRequest>,
) -> Result<Json<ApiResponse<Instance>>, ApiError> {
    if req.instance_name.trim().is_empty() {
        return Err(ApiError::BadRequest("instance name is required".into()));
    }

    let created = match state
        .gateway
        .create_instance(&req.instance_name, req.number.as_deref())
        .await
    {
        Ok(created) => created,
        Err(e) => return Ok(Json(ApiResponse::err(e.to_string()))),
    };

    let instance = Instance {
        instance_name: created.instance_name,
        instance_id: Some(created.instance_id),
        token: Some(created.token),
        number: req.number,
        status: InstanceStatus::Disconnected,
        user_id: claims.sub.to_string(),
        created_at: Utc::now(),
    };

    // The ownership mirror is part of the operation's contract: if it cannot
    // be written the creation is reported as failed even though the gateway
    // session exists.
    if let Err(e) = state.db.insert_instance(&instance) {
        warn!(instance = %instance.instance_name, error = %e, "failed to mirror instance");
        return Ok(Json(ApiResponse::err(format!(
            "failed to record instance ownership: {e}"
        ))));
    }

    info!(instance = %instance.instance_name, "instance created");
    Ok(Json(ApiResponse::ok(instance)))
}

/// Gateway listing intersected with the caller's stored instance names.
pub async fn list(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ApiResponse<Vec<GatewayInstance>>>, ApiError> {
    let owned = state.db.instance_names_for_user(&claims.sub.to_string())?;

    match state.gateway.fetch_instances().await {
        Ok(instances) => {
            let mine: Vec<GatewayInstance> = instances
                .into_iter()
                .filter(|i| owned.contains(&i.name))
                .collect();
            Ok(Json(ApiResponse::ok(mine)))
        }
        Err(e) => Ok(Json(ApiResponse::err(e.to_string()))),
    }
}

pub async fn qr_code(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ApiResponse<QrCode>> {
    let primary = state.gateway.qr_code(&name).await;
    let result = match primary {
        Ok(qr) if qr.qrcode.is_some() || qr.pairing_code.is_some() => Ok(qr),
        _ => state.gateway.qr_code_alternative(&name).await,
    };

    match result {
        Ok(qr) => Json(ApiResponse::ok(qr)),
        Err(e) => Json(ApiResponse::err(e.to_string())),
    }
}

/// Errors degrade to an empty contact list so the compose screen still loads.
pub async fn contacts(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ApiResponse<Vec<Contact>>> {
    match state.gateway.list_contacts(&name).await {
        Ok(contacts) => Json(ApiResponse::ok(contacts)),
        Err(e) => {
            warn!(instance = %name, error = %e, "contact listing failed");
            Json(ApiResponse::ok(Vec::new()))
        }
    }
}

pub async fn disconnect(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.gateway.disconnect(&name).await {
        Ok(()) => Json(ApiResponse::ok_with_message((), "instance disconnected")),
        Err(e) => Json(ApiResponse::err(e.to_string())),
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.gateway.delete_instance(&name).await {
        Ok(()) => {
            info!(instance = %name, "instance deleted");
            Json(ApiResponse::ok_with_message((), "instance deleted"))
        }
        Err(e) => Json(ApiResponse::err(e.to_string())),
    }
}
