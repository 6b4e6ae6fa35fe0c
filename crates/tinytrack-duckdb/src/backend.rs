use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use tinytrack_core::analytics::{AnalyticsStore, Summary};
use tinytrack_core::event::{DeliveryKind, Event, NewEvent};

use crate::schema::{apply_migrations, init_sql};

/// The DuckDB-backed event store.
///
/// DuckDB is single-writer: concurrent reads are fine, but writes must be
/// serialized. The connection lives behind `Arc<tokio::sync::Mutex<_>>` so
/// the struct clones cheaply across axum handlers and the runtime serializes
/// appends through the mutex. The storage engine's own write-ahead log
/// provides durability; no in-process lock is held across anything but the
/// storage call itself.
pub struct DuckDbStore {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbStore {
    /// Open (or create) the database file at `path` and bring the schema up
    /// to date. Any migration failure is fatal — the process must not start
    /// on a half-migrated store.
    ///
    /// `memory_limit` is a DuckDB size string such as `"512MB"` or `"1GB"`.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        apply_migrations(&conn)?;
        info!("DuckDB opened at {path} with memory_limit={memory_limit}, threads=2");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** store. Intended for tests — data is discarded
    /// when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        apply_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Append one canonical record and return the store-assigned id.
    ///
    /// A single durable insert; ids come from the `event_ids` sequence and
    /// are strictly increasing in append order. Fails only on storage-level
    /// failure, which the caller surfaces as a failed delivery (no retry —
    /// telemetry is best-effort).
    pub async fn append(&self, event: &NewEvent) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"INSERT INTO events (
                occurred_at, client_timestamp, source_ip, user_agent,
                page_url, referrer_url, visitor_id, delivery_kind,
                event_type, event_name, element_tag, element_text,
                link_url, button_type, form_id, duration_ms
            ) VALUES (
                ?1,  ?2,  ?3,  ?4,
                ?5,  ?6,  ?7,  ?8,
                ?9,  ?10, ?11, ?12,
                ?13, ?14, ?15, ?16
            ) RETURNING id"#,
        )?;
        let id: i64 = stmt.query_row(
            duckdb::params![
                event.occurred_at,
                event.client_timestamp,
                event.source_ip,
                event.user_agent,
                event.page_url,
                event.referrer_url,
                event.visitor_id,
                event.delivery_kind.as_str(),
                event.event_type,
                event.event_name,
                event.element_tag,
                event.element_text,
                event.link_url,
                event.button_type,
                event.form_id,
                event.duration_ms,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Raw window query: events with `occurred_at >= since`, optionally
    /// restricted to one event_type, ordered by id. The aggregation layer
    /// uses the grouped primitives in `queries::summary` instead; this is the
    /// row-level access path.
    pub async fn events_since(&self, since: i64, event_type: Option<&str>) -> Result<Vec<Event>> {
        let conn = self.conn.lock().await;
        let base = r#"SELECT
                id, occurred_at, client_timestamp, source_ip, user_agent,
                page_url, referrer_url, visitor_id, delivery_kind,
                event_type, event_name, element_tag, element_text,
                link_url, button_type, form_id, duration_ms
            FROM events
            WHERE occurred_at >= ?1"#;

        let sql = if event_type.is_some() {
            format!("{base} AND event_type = ?2 ORDER BY id")
        } else {
            format!("{base} ORDER BY id")
        };

        let mut stmt = conn.prepare(&sql)?;
        let map_row = |row: &duckdb::Row<'_>| -> duckdb::Result<Event> {
            let kind: String = row.get(8)?;
            Ok(Event {
                id: row.get(0)?,
                occurred_at: row.get(1)?,
                client_timestamp: row.get(2)?,
                source_ip: row.get(3)?,
                user_agent: row.get(4)?,
                page_url: row.get(5)?,
                referrer_url: row.get(6)?,
                visitor_id: row.get(7)?,
                delivery_kind: DeliveryKind::from_db(&kind),
                event_type: row.get(9)?,
                event_name: row.get(10)?,
                element_tag: row.get(11)?,
                element_text: row.get(12)?,
                link_url: row.get(13)?,
                button_type: row.get(14)?,
                form_id: row.get(15)?,
                duration_ms: row.get(16)?,
            })
        };

        let rows = match event_type {
            Some(t) => stmt.query_map(duckdb::params![since, t], map_row)?,
            None => stmt.query_map(duckdb::params![since], map_row)?,
        };

        let mut events = Vec::new();
        for row in rows {
            events.push(row?);
        }
        Ok(events)
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint. Returns an error if the connection
    /// is unavailable (file locked, disk full, etc.).
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

#[async_trait]
impl AnalyticsStore for DuckDbStore {
    async fn append(&self, event: &NewEvent) -> Result<i64> {
        DuckDbStore::append(self, event).await
    }

    async fn summarize(&self, window_hours: i64) -> Result<Summary> {
        DuckDbStore::summarize(self, window_hours).await
    }
}
