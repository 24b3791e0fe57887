use crate::Database;
use crate::models::{AutomationRow, InstanceRow, LogRow, ScriptRow, UserRow};
use crate::normalize::{normalize, parse_timestamp};
use anyhow::Result;
use notifyx_types::models::{
    Automation, ExecutionLog, Instance, InstanceStatus, LogStatus, MessageScript,
    project_script_content, script_content_for_storage,
};
use rusqlite::{OptionalExtension, Row, params};
use serde_json::Value;
use uuid::Uuid;

const AUTOMATION_COLUMNS: &str = "id, name, description, trigger_type, trigger_config, \
     action_type, action_config, is_active, type, config, active, user_id, created_at, updated_at";

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;
            let row = stmt
                .query_row([username], |row| {
                    Ok(UserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                })
                .optional()?;
            Ok(row)
        })
    }

    // -- Automations --

    pub fn insert_automation(&self, automation: &Automation) -> Result<()> {
        let trigger_config = serde_json::to_string(&automation.trigger_config)?;
        let action_config = serde_json::to_string(&automation.action_config)?;
        let trigger_type = type_tag(&automation.trigger_type)?;
        let action_type = type_tag(&automation.action_type)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO automations
                     (id, name, description, trigger_type, trigger_config,
                      action_type, action_config, is_active, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    automation.id,
                    automation.name,
                    automation.description,
                    trigger_type,
                    trigger_config,
                    action_type,
                    action_config,
                    automation.is_active,
                    automation.user_id,
                    automation.created_at.to_rfc3339(),
                    automation.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(())
        })
    }

    /// Newest first. `owner = None` returns every tenant's rows — the
    /// development bypass, callers gate it explicitly.
    pub fn list_automations(&self, owner: Option<&str>) -> Result<Vec<Automation>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {AUTOMATION_COLUMNS} FROM automations
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY created_at DESC"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([owner], map_automation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows.into_iter().map(normalize).collect())
    }

    /// Ownership-checked fetch: a record owned by another tenant reads as
    /// absent rather than leaking its existence.
    pub fn get_automation(&self, id: &str, owner: Option<&str>) -> Result<Option<Automation>> {
        let row = self.fetch_automation_row(id)?;
        Ok(row.filter(|r| owner.is_none_or(|o| r.user_id == o)).map(normalize))
    }

    /// Rewrites the new-shape columns; legacy columns stay untouched so a
    /// migrated row keeps both shapes populated.
    pub fn update_automation(&self, automation: &Automation) -> Result<bool> {
        let trigger_config = serde_json::to_string(&automation.trigger_config)?;
        let action_config = serde_json::to_string(&automation.action_config)?;
        let trigger_type = type_tag(&automation.trigger_type)?;
        let action_type = type_tag(&automation.action_type)?;

        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE automations SET
                     name = ?2, description = ?3, trigger_type = ?4, trigger_config = ?5,
                     action_type = ?6, action_config = ?7, is_active = ?8, updated_at = ?9
                 WHERE id = ?1",
                params![
                    automation.id,
                    automation.name,
                    automation.description,
                    trigger_type,
                    trigger_config,
                    action_type,
                    action_config,
                    automation.is_active,
                    automation.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_automation(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM automations WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    /// Resolve a webhook routing key across both schema shapes, new format
    /// first. Intentionally not scoped by owner: webhook delivery is
    /// unauthenticated and addressed purely by path.
    pub fn find_automation_by_path(&self, path: &str) -> Result<Option<Automation>> {
        let rows = self.with_conn(|conn| {
            let sql = format!(
                "SELECT {AUTOMATION_COLUMNS} FROM automations
                 WHERE trigger_type = 'webhook' OR type = 'webhook'"
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([], map_automation_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let matches_path = |raw: Option<&str>| {
            raw.and_then(|s| serde_json::from_str::<Value>(s).ok())
                .and_then(|cfg| cfg.get("path").and_then(|p| p.as_str().map(String::from)))
                .is_some_and(|p| p == path)
        };

        let (new_shape, legacy): (Vec<_>, Vec<_>) =
            rows.into_iter().partition(AutomationRow::has_new_shape);

        let hit = new_shape
            .into_iter()
            .find(|r| {
                r.trigger_type.as_deref() == Some("webhook")
                    && matches_path(r.trigger_config.as_deref())
            })
            .or_else(|| legacy.into_iter().find(|r| matches_path(r.legacy_config.as_deref())));

        Ok(hit.map(normalize))
    }

    fn fetch_automation_row(&self, id: &str) -> Result<Option<AutomationRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {AUTOMATION_COLUMNS} FROM automations WHERE id = ?1");
            let mut stmt = conn.prepare(&sql)?;
            let row = stmt.query_row([id], map_automation_row).optional()?;
            Ok(row)
        })
    }

    // -- Execution logs --

    pub fn add_log(
        &self,
        automation_id: &str,
        event_type: &str,
        status: LogStatus,
        message: &str,
        error_message: Option<&str>,
        payload: &Value,
    ) -> Result<ExecutionLog> {
        let id = Uuid::new_v4().to_string();
        let created_at = chrono::Utc::now();
        let payload_text = serde_json::to_string(payload)?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO automation_logs
                     (id, automation_id, event_type, status, message, error_message, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id,
                    automation_id,
                    event_type,
                    log_status_tag(status),
                    message,
                    error_message,
                    payload_text,
                    created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })?;

        Ok(ExecutionLog {
            id,
            automation_id: automation_id.to_string(),
            event_type: event_type.to_string(),
            status,
            message: message.to_string(),
            error_message: error_message.map(String::from),
            payload: payload.clone(),
            created_at,
        })
    }

    pub fn logs_for_automation(&self, automation_id: &str) -> Result<Vec<ExecutionLog>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, automation_id, event_type, status, message, error_message, payload, created_at
                 FROM automation_logs
                 WHERE automation_id = ?1
                 ORDER BY created_at DESC, rowid DESC",
            )?;
            let rows = stmt
                .query_map([automation_id], |row| {
                    Ok(LogRow {
                        id: row.get(0)?,
                        automation_id: row.get(1)?,
                        event_type: row.get(2)?,
                        status: row.get(3)?,
                        message: row.get(4)?,
                        error_message: row.get(5)?,
                        payload: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows.into_iter().map(log_from_row).collect())
    }

    pub fn clear_logs(&self, automation_id: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let deleted = conn.execute(
                "DELETE FROM automation_logs WHERE automation_id = ?1",
                [automation_id],
            )?;
            Ok(deleted)
        })
    }

    // -- Message scripts --

    pub fn insert_script(&self, script: &MessageScript) -> Result<()> {
        let content =
            script_content_for_storage(&script.content, script.message_blocks.as_deref());
        let tags = tags_to_storage(script.tags.as_deref())?;

        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO message_scripts
                     (id, name, description, content, tags, user_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    script.id,
                    script.name,
                    script.description,
                    content,
                    tags,
                    script.user_id,
                    script.created_at.to_rfc3339(),
                    script.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(())
        })
    }

    pub fn list_scripts(&self, owner: Option<&str>) -> Result<Vec<MessageScript>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, content, tags, user_id, created_at, updated_at
                 FROM message_scripts
                 WHERE (?1 IS NULL OR user_id = ?1)
                 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([owner], map_script_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows.into_iter().map(script_from_row).collect())
    }

    pub fn get_script(&self, id: &str, owner: Option<&str>) -> Result<Option<MessageScript>> {
        let row = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, description, content, tags, user_id, created_at, updated_at
                 FROM message_scripts WHERE id = ?1",
            )?;
            let row = stmt.query_row([id], map_script_row).optional()?;
            Ok(row)
        })?;

        Ok(row
            .filter(|r| owner.is_none_or(|o| r.user_id == o))
            .map(script_from_row))
    }

    pub fn update_script(&self, script: &MessageScript) -> Result<bool> {
        let content =
            script_content_for_storage(&script.content, script.message_blocks.as_deref());
        let tags = tags_to_storage(script.tags.as_deref())?;

        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE message_scripts SET
                     name = ?2, description = ?3, content = ?4, tags = ?5, updated_at = ?6
                 WHERE id = ?1",
                params![
                    script.id,
                    script.name,
                    script.description,
                    content,
                    tags,
                    script.updated_at.map(|t| t.to_rfc3339()),
                ],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn delete_script(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute("DELETE FROM message_scripts WHERE id = ?1", [id])?;
            Ok(changed > 0)
        })
    }

    // -- Instances --

    pub fn insert_instance(&self, instance: &Instance) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO instances
                     (id, instance_name, instance_id, token, number, status, user_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    Uuid::new_v4().to_string(),
                    instance.instance_name,
                    instance.instance_id,
                    instance.token,
                    instance.number,
                    instance_status_tag(instance.status),
                    instance.user_id,
                    instance.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    pub fn instances_for_user(&self, owner: &str) -> Result<Vec<Instance>> {
        let rows = self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, instance_name, instance_id, token, number, status, user_id, created_at
                 FROM instances WHERE user_id = ?1 ORDER BY created_at DESC",
            )?;
            let rows = stmt
                .query_map([owner], |row| {
                    Ok(InstanceRow {
                        id: row.get(0)?,
                        instance_name: row.get(1)?,
                        instance_id: row.get(2)?,
                        token: row.get(3)?,
                        number: row.get(4)?,
                        status: row.get(5)?,
                        user_id: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        Ok(rows.into_iter().map(instance_from_row).collect())
    }

    pub fn instance_names_for_user(&self, owner: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT instance_name FROM instances WHERE user_id = ?1")?;
            let names = stmt
                .query_map([owner], |row| row.get::<_, String>(0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(names)
        })
    }

    // -- Development seed --

    /// Seeds one legacy-shaped example automation into an empty store so the
    /// webhook path is exercisable without any setup.
    pub fn seed_dev_data(&self) -> Result<()> {
        self.with_conn_mut(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM automations", [], |r| r.get(0))?;
            if count > 0 {
                return Ok(());
            }

            conn.execute(
                "INSERT INTO automations (id, name, type, config, active, user_id, created_at)
                 VALUES (?1, ?2, 'webhook', ?3, 1, ?4, ?5)",
                params![
                    "1",
                    "Order notification",
                    r#"{"path":"pedido","instance":"main","messageTemplate":"Olá {{nome}}, recebemos seu pedido #{{pedido_id}} no valor de {{valor}}."}"#,
                    "dev-user",
                    chrono::Utc::now().to_rfc3339(),
                ],
            )?;
            tracing::info!("Seeded example webhook automation at path 'pedido'");
            Ok(())
        })
    }
}

// -- Row mapping helpers --

fn map_automation_row(row: &Row) -> rusqlite::Result<AutomationRow> {
    Ok(AutomationRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        trigger_type: row.get(3)?,
        trigger_config: row.get(4)?,
        action_type: row.get(5)?,
        action_config: row.get(6)?,
        is_active: row.get(7)?,
        legacy_type: row.get(8)?,
        legacy_config: row.get(9)?,
        legacy_active: row.get(10)?,
        user_id: row.get(11)?,
        created_at: row.get(12)?,
        updated_at: row.get(13)?,
    })
}

fn map_script_row(row: &Row) -> rusqlite::Result<ScriptRow> {
    Ok(ScriptRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        content: row.get(3)?,
        tags: row.get(4)?,
        user_id: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn script_from_row(row: ScriptRow) -> MessageScript {
    let (content, message_blocks) = project_script_content(&row.content);
    MessageScript {
        id: row.id.clone(),
        name: row.name,
        description: row.description,
        content,
        message_blocks,
        tags: row
            .tags
            .as_deref()
            .and_then(|t| serde_json::from_str(t).ok()),
        user_id: row.user_id,
        created_at: parse_timestamp(&row.created_at, &row.id),
        updated_at: row.updated_at.as_deref().map(|t| parse_timestamp(t, &row.id)),
    }
}

fn log_from_row(row: LogRow) -> ExecutionLog {
    ExecutionLog {
        id: row.id.clone(),
        automation_id: row.automation_id,
        event_type: row.event_type,
        status: match row.status.as_str() {
            "success" => LogStatus::Success,
            "pending" => LogStatus::Pending,
            _ => LogStatus::Error,
        },
        message: row.message,
        error_message: row.error_message,
        payload: serde_json::from_str(&row.payload).unwrap_or(Value::Null),
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

fn instance_from_row(row: InstanceRow) -> Instance {
    Instance {
        instance_name: row.instance_name,
        instance_id: row.instance_id,
        token: row.token,
        number: row.number,
        status: match row.status.as_str() {
            "connected" => InstanceStatus::Connected,
            "connecting" => InstanceStatus::Connecting,
            "error" => InstanceStatus::Error,
            _ => InstanceStatus::Disconnected,
        },
        user_id: row.user_id,
        created_at: parse_timestamp(&row.created_at, &row.id),
    }
}

fn instance_status_tag(status: InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::Connected => "connected",
        InstanceStatus::Disconnected => "disconnected",
        InstanceStatus::Connecting => "connecting",
        InstanceStatus::Error => "error",
    }
}

fn log_status_tag(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Success => "success",
        LogStatus::Error => "error",
        LogStatus::Pending => "pending",
    }
}

fn tags_to_storage(tags: Option<&[String]>) -> Result<Option<String>> {
    tags.map(|t| serde_json::to_string(t).map_err(anyhow::Error::from))
        .transpose()
}

/// Snake-case tag of a serde string enum, for storage.
fn type_tag<T: serde::Serialize>(value: &T) -> Result<String> {
    match serde_json::to_value(value)? {
        Value::String(s) => Ok(s),
        other => anyhow::bail!("expected string tag, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use notifyx_types::models::{ActionType, TriggerType};
    use serde_json::json;

    fn test_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn webhook_automation(id: &str, owner: &str, path: &str) -> Automation {
        Automation {
            id: id.to_string(),
            name: format!("hook {path}"),
            description: None,
            trigger_type: TriggerType::Webhook,
            trigger_config: json!({"path": path}),
            action_type: ActionType::SendMessage,
            action_config: json!({"instance": "main", "messageTemplate": "hi {{nome}}"}),
            is_active: true,
            user_id: owner.to_string(),
            created_at: Utc::now(),
            updated_at: None,
            legacy_type: None,
            active: None,
            config: None,
            created_at_legacy: None,
        }
    }

    fn insert_legacy_webhook(db: &Database, id: &str, owner: &str, path: &str) {
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO automations (id, name, type, config, active, user_id, created_at)
                 VALUES (?1, ?2, 'webhook', ?3, 1, ?4, ?5)",
                params![
                    id,
                    "legacy hook",
                    json!({"path": path, "instance": "old", "messageTemplate": "oi"}).to_string(),
                    owner,
                    Utc::now().to_rfc3339(),
                ],
            )?;
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn automation_roundtrip_and_ownership_scoping() {
        let db = test_db();
        db.insert_automation(&webhook_automation("a1", "alice", "orders")).unwrap();
        db.insert_automation(&webhook_automation("a2", "bob", "invoices")).unwrap();

        let alices = db.list_automations(Some("alice")).unwrap();
        assert_eq!(alices.len(), 1);
        assert_eq!(alices[0].id, "a1");
        assert_eq!(alices[0].webhook_config().unwrap().path, "orders");

        // dev bypass sees everything
        assert_eq!(db.list_automations(None).unwrap().len(), 2);

        // cross-tenant read looks like "not found"
        assert!(db.get_automation("a1", Some("bob")).unwrap().is_none());
        assert!(db.get_automation("a1", Some("alice")).unwrap().is_some());
    }

    #[test]
    fn find_by_path_matches_both_shapes() {
        let db = test_db();
        db.insert_automation(&webhook_automation("new1", "alice", "orders")).unwrap();
        insert_legacy_webhook(&db, "old1", "alice", "legacy-orders");

        let found = db.find_automation_by_path("orders").unwrap().unwrap();
        assert_eq!(found.id, "new1");

        let found = db.find_automation_by_path("legacy-orders").unwrap().unwrap();
        assert_eq!(found.id, "old1");
        assert_eq!(found.send_message_config().unwrap().instance, "old");

        assert!(db.find_automation_by_path("missing").unwrap().is_none());
    }

    #[test]
    fn find_by_path_prefers_new_format_records() {
        let db = test_db();
        insert_legacy_webhook(&db, "old1", "alice", "orders");
        db.insert_automation(&webhook_automation("new1", "alice", "orders")).unwrap();

        let found = db.find_automation_by_path("orders").unwrap().unwrap();
        assert_eq!(found.id, "new1");
    }

    #[test]
    fn update_rewrites_new_shape_and_reports_missing_rows() {
        let db = test_db();
        let mut automation = webhook_automation("a1", "alice", "orders");
        db.insert_automation(&automation).unwrap();

        automation.is_active = false;
        automation.updated_at = Some(Utc::now());
        assert!(db.update_automation(&automation).unwrap());

        let reread = db.get_automation("a1", Some("alice")).unwrap().unwrap();
        assert!(!reread.is_active);
        assert!(reread.updated_at.is_some());

        automation.id = "ghost".to_string();
        assert!(!db.update_automation(&automation).unwrap());
        assert!(!db.delete_automation("ghost").unwrap());
        assert!(db.delete_automation("a1").unwrap());
    }

    #[test]
    fn logs_append_list_and_clear() {
        let db = test_db();
        db.insert_automation(&webhook_automation("a1", "alice", "orders")).unwrap();

        db.add_log("a1", "webhook_execution", LogStatus::Error, "bad secret", None, &json!({"telefone": "+55"}))
            .unwrap();
        db.add_log("a1", "webhook_execution", LogStatus::Success, "sent", None, &json!({}))
            .unwrap();

        let logs = db.logs_for_automation("a1").unwrap();
        assert_eq!(logs.len(), 2);
        // newest first
        assert_eq!(logs[0].status, LogStatus::Success);
        assert_eq!(logs[1].message, "bad secret");
        assert_eq!(logs[1].payload["telefone"], "+55");

        assert_eq!(db.clear_logs("a1").unwrap(), 2);
        assert!(db.logs_for_automation("a1").unwrap().is_empty());
    }

    #[test]
    fn log_insert_requires_existing_automation() {
        let db = test_db();
        let result = db.add_log("ghost", "webhook_execution", LogStatus::Error, "x", None, &json!({}));
        assert!(result.is_err());
    }

    #[test]
    fn script_blocks_are_stored_as_content_and_projected_back() {
        let db = test_db();
        let script = MessageScript {
            id: "s1".into(),
            name: "welcome".into(),
            description: None,
            content: "ignored when blocks exist".into(),
            message_blocks: Some(vec![
                notifyx_types::models::MessageBlock { id: "1".into(), content: "first".into(), delay: 2.0 },
                notifyx_types::models::MessageBlock { id: "2".into(), content: "second".into(), delay: 0.0 },
            ]),
            tags: Some(vec!["onboarding".into()]),
            user_id: "alice".into(),
            created_at: Utc::now(),
            updated_at: None,
        };
        db.insert_script(&script).unwrap();

        let read = db.get_script("s1", Some("alice")).unwrap().unwrap();
        assert_eq!(read.content, "first");
        assert_eq!(read.message_blocks.as_ref().unwrap().len(), 2);
        assert_eq!(read.tags.as_ref().unwrap()[0], "onboarding");

        assert!(db.get_script("s1", Some("bob")).unwrap().is_none());
    }

    #[test]
    fn instances_scope_by_owner() {
        let db = test_db();
        let instance = Instance {
            instance_name: "main".into(),
            instance_id: Some("abc".into()),
            token: None,
            number: Some("+5511999".into()),
            status: InstanceStatus::Disconnected,
            user_id: "alice".into(),
            created_at: Utc::now(),
        };
        db.insert_instance(&instance).unwrap();

        assert_eq!(db.instance_names_for_user("alice").unwrap(), vec!["main"]);
        assert!(db.instance_names_for_user("bob").unwrap().is_empty());

        let listed = db.instances_for_user("alice").unwrap();
        assert_eq!(listed[0].status, InstanceStatus::Disconnected);
    }

    #[test]
    fn seed_is_idempotent_and_legacy_shaped() {
        let db = test_db();
        db.seed_dev_data().unwrap();
        db.seed_dev_data().unwrap();

        let all = db.list_automations(None).unwrap();
        assert_eq!(all.len(), 1);
        let seeded = &all[0];
        assert_eq!(seeded.webhook_config().unwrap().path, "pedido");
        assert!(seeded.is_active);
    }
}
