#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::Utc;
use serde_json::{Value, json};
use tower::ServiceExt;

use notifyx_api::auth::{AppState, AppStateInner};
use notifyx_db::Database;
use notifyx_engine::{SendError, SendReceipt, TextSender};
use notifyx_gateway::GatewayClient;
use notifyx_types::models::{ActionType, Automation, TriggerType};

/// Records every send; fails on scripted call indices.
pub struct MockSender {
    calls: Mutex<Vec<(String, String, String)>>,
    fail_on: Mutex<Vec<usize>>,
    counter: AtomicUsize,
}

impl MockSender {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_on: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn fail_at(&self, index: usize) {
        self.fail_on.lock().unwrap().push(index);
    }

    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl TextSender for MockSender {
    async fn send_text(
        &self,
        instance: &str,
        to: &str,
        text: &str,
    ) -> Result<SendReceipt, SendError> {
        let index = self.counter.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push((
            instance.to_string(),
            to.to_string(),
            text.to_string(),
        ));

        if self.fail_on.lock().unwrap().contains(&index) {
            Err(SendError("gateway refused the message".into()))
        } else {
            Ok(SendReceipt {
                message_id: format!("mock-{index}"),
            })
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sender: Arc<MockSender>,
}

pub fn test_app() -> TestApp {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let sender = Arc::new(MockSender::new());
    // Dead address: instance-management endpoints are not exercised here.
    let gateway = Arc::new(GatewayClient::new("http://127.0.0.1:1", "unused"));

    let state: AppState = Arc::new(AppStateInner {
        db,
        gateway,
        sender: sender.clone(),
        jwt_secret: "integration-test-secret".into(),
        dev_mode: false,
    });

    TestApp {
        router: notifyx_api::router(state.clone()),
        state,
        sender,
    }
}

pub async fn request(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

pub async fn register(router: &Router, username: &str) -> String {
    let (status, body) = request(
        router,
        "POST",
        "/api/auth/register",
        None,
        Some(json!({"username": username, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["token"].as_str().unwrap().to_string()
}

/// Insert a new-shape webhook automation straight into the store.
pub fn insert_webhook_automation(
    state: &AppState,
    id: &str,
    owner: &str,
    path: &str,
    active: bool,
    secret: Option<&str>,
    blocks: Value,
) {
    let mut trigger_config = json!({ "path": path });
    if let Some(secret) = secret {
        trigger_config["secret"] = json!(secret);
    }

    let automation = Automation {
        id: id.to_string(),
        name: format!("hook {path}"),
        description: None,
        trigger_type: TriggerType::Webhook,
        trigger_config,
        action_type: ActionType::SendMessage,
        action_config: json!({ "instance": "main", "messageBlocks": blocks }),
        is_active: active,
        user_id: owner.to_string(),
        created_at: Utc::now(),
        updated_at: None,
        legacy_type: None,
        active: None,
        config: None,
        created_at_legacy: None,
    };
    state.db.insert_automation(&automation).unwrap();
}

/// Insert a legacy-shape webhook row (old `type`/`config`/`active` columns).
pub fn insert_legacy_automation(state: &AppState, id: &str, owner: &str, path: &str) {
    let config = json!({
        "path": path,
        "instance": "old-instance",
        "messageTemplate": "Olá {{nome}}"
    })
    .to_string();

    state
        .db
        .with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO automations (id, name, type, config, active, user_id, created_at)
                 VALUES (?1, ?2, 'webhook', ?3, 1, ?4, ?5)",
                rusqlite::params![id, "legacy hook", config, owner, Utc::now().to_rfc3339()],
            )?;
            Ok(())
        })
        .unwrap();
}

pub fn logs_for(state: &AppState, automation_id: &str) -> Vec<notifyx_types::models::ExecutionLog> {
    state.db.logs_for_automation(automation_id).unwrap()
}
