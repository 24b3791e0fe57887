//! Database row types — these map directly to SQLite rows.
//! Distinct from the notifyx-types API models to keep the store layer
//! independent; normalization into canonical types happens in `normalize`.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

/// Raw automation row. Either the new-shape columns or the legacy columns
/// (`type`/`config`/`active`) are populated; sometimes both.
pub struct AutomationRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_config: Option<String>,
    pub action_type: Option<String>,
    pub action_config: Option<String>,
    pub is_active: Option<bool>,
    pub legacy_type: Option<String>,
    pub legacy_config: Option<String>,
    pub legacy_active: Option<bool>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl AutomationRow {
    /// Whether the row carries the new schema shape.
    pub fn has_new_shape(&self) -> bool {
        self.trigger_type.is_some()
    }
}

pub struct LogRow {
    pub id: String,
    pub automation_id: String,
    pub event_type: String,
    pub status: String,
    pub message: String,
    pub error_message: Option<String>,
    pub payload: String,
    pub created_at: String,
}

pub struct ScriptRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub content: String,
    pub tags: Option<String>,
    pub user_id: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

pub struct InstanceRow {
    pub id: String,
    pub instance_name: String,
    pub instance_id: Option<String>,
    pub token: Option<String>,
    pub number: Option<String>,
    pub status: String,
    pub user_id: String,
    pub created_at: String,
}
