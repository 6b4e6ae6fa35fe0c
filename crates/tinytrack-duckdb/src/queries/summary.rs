//! The aggregation read path: windowed counts over the `events` table.
//!
//! The store provides raw filtered access plus these count/group primitives;
//! grouping happens in SQL, not by pre-aggregated state. All six aggregates
//! run under a single connection-lock acquisition so a summary is computed
//! against one consistent view of the store.

use anyhow::Result;
use chrono::Utc;
use duckdb::Connection;

use tinytrack_core::analytics::{clamp_window_hours, CountRow, HourlyPoint, Summary};

use crate::DuckDbStore;

pub const TOP_URLS_LIMIT: i64 = 100;
pub const TOP_INTERACTIONS_LIMIT: i64 = 50;

/// Hour-aligned UTC bucket key, e.g. `2026-08-30 14:00:00`. Sortable as a
/// plain string; built from epoch seconds so the session timezone never
/// leaks in.
const HOUR_BUCKET: &str = "strftime(make_timestamp(occurred_at * 1000000), '%Y-%m-%d %H:00:00')";

impl DuckDbStore {
    /// Compute windowed aggregates over the trailing `window_hours` hours.
    ///
    /// `window_hours` is clamped to [1, 720]; out-of-range input is silently
    /// clamped, not rejected. Any query failure fails the whole call — no
    /// partial summary is ever returned.
    pub async fn summarize(&self, window_hours: i64) -> Result<Summary> {
        let hours = clamp_window_hours(window_hours);
        let since = Utc::now().timestamp() - hours * 3600;

        let conn = self.conn.lock().await;

        Ok(Summary {
            window_hours: hours,
            since,
            total_events: count_events(&conn, since)?,
            unique_visitors: count_unique_visitors(&conn, since)?,
            event_types: event_type_counts(&conn, since)?,
            top_interactions: top_interactions(&conn, since)?,
            top_urls: top_urls(&conn, since)?,
            hourly: hourly_histogram(&conn, since)?,
        })
    }
}

fn count_events(conn: &Connection, since: i64) -> Result<i64> {
    let count: i64 = conn
        .prepare("SELECT COUNT(*) FROM events WHERE occurred_at >= ?1")?
        .query_row(duckdb::params![since], |row| row.get(0))?;
    Ok(count)
}

/// Distinct visitors: the grouping key is the visitor token when present,
/// falling back to the source IP for anonymous events. Empty-string
/// visitor_id counts as absent.
fn count_unique_visitors(conn: &Connection, since: i64) -> Result<i64> {
    let count: i64 = conn
        .prepare(
            "SELECT COUNT(DISTINCT COALESCE(NULLIF(visitor_id, ''), source_ip))
             FROM events WHERE occurred_at >= ?1",
        )?
        .query_row(duckdb::params![since], |row| row.get(0))?;
    Ok(count)
}

/// All event types in the window, ordered descending by count. No cap — the
/// type space is small by construction.
fn event_type_counts(conn: &Connection, since: i64) -> Result<Vec<CountRow>> {
    grouped_counts(
        conn,
        "SELECT event_type, COUNT(*) AS c
         FROM events WHERE occurred_at >= ?1
         GROUP BY event_type ORDER BY c DESC",
        since,
    )
}

/// Click event names, ordered descending, capped. Restricted to
/// event_type = 'click' with a non-null name.
fn top_interactions(conn: &Connection, since: i64) -> Result<Vec<CountRow>> {
    grouped_counts(
        conn,
        &format!(
            "SELECT event_name, COUNT(*) AS c
             FROM events
             WHERE occurred_at >= ?1 AND event_type = 'click' AND event_name IS NOT NULL
             GROUP BY event_name ORDER BY c DESC LIMIT {TOP_INTERACTIONS_LIMIT}"
        ),
        since,
    )
}

fn top_urls(conn: &Connection, since: i64) -> Result<Vec<CountRow>> {
    grouped_counts(
        conn,
        &format!(
            "SELECT page_url, COUNT(*) AS c
             FROM events WHERE occurred_at >= ?1
             GROUP BY page_url ORDER BY c DESC LIMIT {TOP_URLS_LIMIT}"
        ),
        since,
    )
}

/// Sparse hourly series, ascending by bucket. Hours with zero events are not
/// synthesized; consumers must tolerate gaps.
fn hourly_histogram(conn: &Connection, since: i64) -> Result<Vec<HourlyPoint>> {
    let sql = format!(
        "SELECT {HOUR_BUCKET} AS bucket, COUNT(*) AS c
         FROM events WHERE occurred_at >= ?1
         GROUP BY bucket ORDER BY bucket ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![since], |row| {
        Ok(HourlyPoint {
            bucket: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut points = Vec::new();
    for row in rows {
        points.push(row?);
    }
    Ok(points)
}

fn grouped_counts(conn: &Connection, sql: &str, since: i64) -> Result<Vec<CountRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(duckdb::params![since], |row| {
        Ok(CountRow {
            key: row.get(0)?,
            count: row.get(1)?,
        })
    })?;

    let mut counts = Vec::new();
    for row in rows {
        counts.push(row?);
    }
    Ok(counts)
}
