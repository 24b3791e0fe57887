use axum::{Json, extract::State};
use serde_json::{Value, json};
use tokio::sync::mpsc;

use notifyx_engine::TextSender;
use notifyx_engine::bulk::{self, clean_number};
use notifyx_types::api::{ApiResponse, SendBulkRequest, SendSequenceRequest, SendTextRequest};

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn text(
    State(state): State<AppState>,
    Json(req): Json<SendTextRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if req.message.is_empty() {
        return Err(ApiError::BadRequest("message is required".into()));
    }

    let to = clean_number(&req.to);
    match state.sender.send_text(&req.instance, to, &req.message).await {
        Ok(receipt) => Ok(Json(ApiResponse::ok(json!({ "messageId": receipt.message_id })))),
        Err(e) => Ok(Json(ApiResponse::err(e.to_string()))),
    }
}

/// One recipient, ordered messages, fixed inter-message delay; the chain
/// stops on the first failure.
pub async fn sequence(
    State(state): State<AppState>,
    Json(req): Json<SendSequenceRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if req.messages.is_empty() {
        return Err(ApiError::BadRequest("at least one message is required".into()));
    }

    let (tx, _rx) = mpsc::unbounded_channel();
    let report = bulk::send_sequence(
        state.sender.as_ref(),
        &req.instance,
        &req.recipient,
        &req.messages,
        req.delay,
        &tx,
    )
    .await;

    let data = json!({
        "total": report.total,
        "sent": report.sent,
        "logs": report.entries,
    });
    let response = if report.success {
        ApiResponse::ok_with_message(data, format!("{} message(s) sent", report.sent))
    } else {
        ApiResponse {
            success: false,
            message: Some(format!("sent {} of {} messages", report.sent, report.total)),
            data: Some(data),
            error: report
                .entries
                .last()
                .and_then(|e| e.error.clone()),
        }
    };
    Ok(Json(response))
}

/// Fan out one message to many recipients, tolerating individual failures.
pub async fn bulk(
    State(state): State<AppState>,
    Json(req): Json<SendBulkRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    if req.recipients.is_empty() {
        return Err(ApiError::BadRequest("at least one recipient is required".into()));
    }
    if req.message.is_empty() {
        return Err(ApiError::BadRequest("message is required".into()));
    }

    let (tx, _rx) = mpsc::unbounded_channel();
    let report = bulk::send_bulk(
        state.sender.as_ref(),
        &req.instance,
        &req.recipients,
        &req.message,
        &tx,
    )
    .await;

    let total = req.recipients.len();
    Ok(Json(ApiResponse {
        success: report.successful > 0,
        message: Some(format!(
            "sent to {} of {} recipients",
            report.successful, total
        )),
        data: Some(json!({
            "successful": report.successful,
            "failed": report.failed,
            "logs": report.entries,
        })),
        error: None,
    }))
}
