//! Versioned schema management for the append-only `events` table.
//!
//! Applied migrations are recorded in `_migrations` and checked before each
//! migration runs, so startup is idempotent without relying on swallowed
//! "column already exists" errors. The schema is additive-only: later
//! migrations add optional columns, existing rows are never rewritten.

use anyhow::Result;
use duckdb::Connection;
use tracing::info;

/// Migrations tracking table. Created before anything else so the applied
/// check below always has a table to read.
pub const MIGRATIONS_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS _migrations (
    id          VARCHAR PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Ordered migration list. Append new entries; never edit or reorder applied
/// ones — `_migrations` records them by id.
pub const MIGRATIONS: &[(&str, &str)] = &[
    (
        "m001_create_events",
        r#"
CREATE SEQUENCE IF NOT EXISTS event_ids;

CREATE TABLE IF NOT EXISTS events (
    id              BIGINT PRIMARY KEY DEFAULT nextval('event_ids'),
    occurred_at     BIGINT NOT NULL,               -- epoch seconds, server clock
    source_ip       VARCHAR NOT NULL DEFAULT '',
    user_agent      VARCHAR NOT NULL DEFAULT '',
    page_url        VARCHAR NOT NULL DEFAULT '',
    referrer_url    VARCHAR NOT NULL DEFAULT '',
    visitor_id      VARCHAR NOT NULL DEFAULT '',   -- caller-supplied token; '' = anonymous
    delivery_kind   VARCHAR NOT NULL,              -- 'pixel' | 'beacon'
    event_type      VARCHAR NOT NULL DEFAULT 'page_view'
);

-- Primary query pattern: trailing time window
CREATE INDEX IF NOT EXISTS idx_events_occurred
    ON events(occurred_at);
"#,
    ),
    (
        "m002_interaction_columns",
        r#"
ALTER TABLE events ADD COLUMN event_name       VARCHAR;
ALTER TABLE events ADD COLUMN element_tag      VARCHAR;
ALTER TABLE events ADD COLUMN element_text     VARCHAR;  -- truncated to 200 chars at normalize time
ALTER TABLE events ADD COLUMN link_url         VARCHAR;
ALTER TABLE events ADD COLUMN button_type      VARCHAR;
ALTER TABLE events ADD COLUMN form_id          VARCHAR;
ALTER TABLE events ADD COLUMN duration_ms      BIGINT;
ALTER TABLE events ADD COLUMN client_timestamp BIGINT;   -- epoch millis, untrusted

-- Accelerates event-type breakdowns and the click-name listing
CREATE INDEX IF NOT EXISTS idx_events_type_occurred
    ON events(event_type, occurred_at);
"#,
    ),
];

/// Session pragmas run on every open, not tracked as migrations.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;
"#
    )
}

/// Apply all pending migrations. Safe to run on every startup; a migration
/// recorded in `_migrations` is skipped before its SQL executes. Any other
/// failure propagates and halts startup.
pub fn apply_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(MIGRATIONS_TABLE_SQL)?;

    for (id, sql) in MIGRATIONS {
        let applied: i64 = conn
            .prepare("SELECT COUNT(*) FROM _migrations WHERE id = ?1")?
            .query_row(duckdb::params![id], |row| row.get(0))?;
        if applied > 0 {
            continue;
        }
        conn.execute_batch(sql)?;
        conn.execute(
            "INSERT INTO _migrations (id) VALUES (?1)",
            duckdb::params![id],
        )?;
        info!(migration = id, "Applied schema migration");
    }

    Ok(())
}
