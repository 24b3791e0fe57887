use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("DB: running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id          TEXT PRIMARY KEY,
                username    TEXT NOT NULL UNIQUE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- Automations carry both schema shapes. New rows populate the
            -- trigger_*/action_*/is_active columns; rows imported from the old
            -- schema populate type/config/active. Readers must consult both.
            CREATE TABLE automations (
                id              TEXT PRIMARY KEY,
                name            TEXT NOT NULL,
                description     TEXT,
                trigger_type    TEXT,
                trigger_config  TEXT,
                action_type     TEXT,
                action_config   TEXT,
                is_active       INTEGER,
                type            TEXT,
                config          TEXT,
                active          INTEGER,
                user_id         TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT
            );

            CREATE INDEX idx_automations_user
                ON automations(user_id, created_at);

            CREATE TABLE automation_logs (
                id              TEXT PRIMARY KEY,
                automation_id   TEXT NOT NULL REFERENCES automations(id) ON DELETE CASCADE,
                event_type      TEXT NOT NULL,
                status          TEXT NOT NULL,
                message         TEXT NOT NULL,
                error_message   TEXT,
                payload         TEXT NOT NULL DEFAULT '{}',
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_logs_automation
                ON automation_logs(automation_id, created_at);

            CREATE TABLE message_scripts (
                id          TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                description TEXT,
                content     TEXT NOT NULL DEFAULT '',
                tags        TEXT,
                user_id     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT
            );

            CREATE TABLE instances (
                id              TEXT PRIMARY KEY,
                instance_name   TEXT NOT NULL,
                instance_id     TEXT,
                token           TEXT,
                number          TEXT,
                status          TEXT NOT NULL DEFAULT 'disconnected',
                user_id         TEXT NOT NULL,
                created_at      TEXT NOT NULL
            );

            CREATE INDEX idx_instances_user
                ON instances(user_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
