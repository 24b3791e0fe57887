use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::{error, info, warn};

use notifyx_engine::execute_send_message;
use notifyx_types::api::WebhookSummary;
use notifyx_types::models::LogStatus;

use crate::auth::AppState;
use crate::error::ApiError;

/// `POST /api/webhooks/{path}` — resolve the automation addressed by the
/// routing key, authenticate and validate the request, then drive the
/// templated multi-step send.
///
/// Every terminal branch after resolution writes at most one execution-log
/// row; a log-persistence failure never masks the response.
pub async fn dispatch(
    State(state): State<AppState>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(%path, "webhook request received");

    let automation = match state.db.find_automation_by_path(&path) {
        Ok(Some(automation)) => automation,
        Ok(None) => {
            info!(%path, "no automation for webhook path");
            return error_response(StatusCode::NOT_FOUND, "webhook not found");
        }
        Err(e) => {
            error!(%path, error = %e, "automation lookup failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal server error");
        }
    };

    // Inactive automations reject triggers outright.
    if !automation.is_active {
        warn!(automation_id = %automation.id, "webhook rejected: automation inactive");
        log_attempt(
            &state,
            &automation.id,
            LogStatus::Error,
            "webhook rejected: automation is inactive",
            None,
            &json!({}),
        );
        return error_response(StatusCode::FORBIDDEN, "automation is inactive");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            warn!(automation_id = %automation.id, error = %e, "webhook body is not valid JSON");
            log_attempt(
                &state,
                &automation.id,
                LogStatus::Error,
                &format!("failed to parse request body: {e}"),
                None,
                &json!({ "error": e.to_string() }),
            );
            return error_response(StatusCode::BAD_REQUEST, "invalid request body");
        }
    };

    // Shared-secret check, when one is configured on either schema shape.
    let secret = automation.webhook_config().and_then(|c| c.secret);
    if let Some(secret) = secret {
        let presented = headers
            .get("x-webhook-secret")
            .and_then(|v| v.to_str().ok());
        if presented != Some(secret.as_str()) {
            warn!(automation_id = %automation.id, "webhook rejected: secret mismatch");
            log_attempt(
                &state,
                &automation.id,
                LogStatus::Error,
                "webhook rejected: invalid secret",
                None,
                &payload,
            );
            return error_response(StatusCode::UNAUTHORIZED, "invalid webhook secret");
        }
    }

    // The target phone number is the one required payload field; everything
    // else is free-form template variables.
    if !has_telefone(&payload) {
        warn!(automation_id = %automation.id, "webhook rejected: missing 'telefone'");
        log_attempt(
            &state,
            &automation.id,
            LogStatus::Error,
            "payload is missing the 'telefone' field",
            None,
            &payload,
        );
        return error_response(StatusCode::BAD_REQUEST, "the 'telefone' field is required");
    }

    let payload_map = payload.as_object().cloned().unwrap_or_default();
    let outcome = execute_send_message(&automation, &payload_map, state.sender.as_ref()).await;

    if outcome.success {
        info!(automation_id = %automation.id, "webhook automation executed");
        log_attempt(
            &state,
            &automation.id,
            LogStatus::Success,
            &outcome.message,
            None,
            &payload,
        );
        (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": outcome.message,
                "details": outcome.details,
            })),
        )
            .into_response()
    } else {
        warn!(automation_id = %automation.id, message = %outcome.message, "webhook automation failed");
        log_attempt(
            &state,
            &automation.id,
            LogStatus::Error,
            &outcome.message,
            Some(&outcome.message),
            &payload,
        );
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "success": false,
                "message": outcome.message,
                "details": outcome.details,
            })),
        )
            .into_response()
    }
}

/// Permissive CORS preflight for external callers.
pub async fn dispatch_options() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                "Content-Type, X-Webhook-Secret",
            ),
        ],
    )
}

/// Unauthenticated diagnostic: which webhook automations are live.
pub async fn test_webhook(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let automations = state.db.list_automations(None)?;
    let webhooks: Vec<WebhookSummary> = automations
        .iter()
        .filter(|a| a.is_webhook() && a.is_active)
        .map(|a| WebhookSummary {
            id: a.id.clone(),
            name: a.name.clone(),
            path: a.webhook_config().map(|c| c.path).unwrap_or_default(),
            instance: a
                .send_message_config()
                .map(|c| c.instance)
                .unwrap_or_default(),
        })
        .collect();

    Ok(Json(json!({
        "success": true,
        "message": "webhook dispatcher is reachable",
        "automationsCount": automations.len(),
        "webhookAutomationsCount": webhooks.len(),
        "webhookAutomations": webhooks,
    })))
}

fn has_telefone(payload: &Value) -> bool {
    match payload.get("telefone") {
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Best-effort log write: failures are traced and swallowed so the original
/// response is never replaced by a logging error.
fn log_attempt(
    state: &AppState,
    automation_id: &str,
    status: LogStatus,
    message: &str,
    error_message: Option<&str>,
    payload: &Value,
) {
    if let Err(e) = state.db.add_log(
        automation_id,
        "webhook_execution",
        status,
        message,
        error_message,
        payload,
    ) {
        error!(automation_id, error = %e, "failed to persist execution log");
    }
}
