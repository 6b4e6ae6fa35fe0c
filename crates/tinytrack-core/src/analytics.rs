//! Aggregation result types and the store abstraction.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::event::NewEvent;

/// Trailing-window bounds for summaries, in hours. Out-of-range requests are
/// silently clamped, not rejected.
pub const MIN_WINDOW_HOURS: i64 = 1;
pub const MAX_WINDOW_HOURS: i64 = 24 * 30;

/// Window applied when the caller does not send an `hours` parameter.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

pub fn clamp_window_hours(hours: i64) -> i64 {
    hours.clamp(MIN_WINDOW_HOURS, MAX_WINDOW_HOURS)
}

/// One grouped-count line: a grouping key and how many events carried it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRow {
    pub key: String,
    pub count: i64,
}

/// One hour-aligned bucket of the time series. `bucket` is a sortable
/// `YYYY-MM-DD HH:00:00` UTC key; hours with zero events are not synthesized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub bucket: String,
    pub count: i64,
}

/// Windowed aggregates over the event store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    /// The clamped window actually used.
    pub window_hours: i64,
    /// Window start, epoch seconds.
    pub since: i64,
    pub total_events: i64,
    /// Distinct grouping keys, where the key is the visitor_id if non-empty,
    /// else the source IP.
    pub unique_visitors: i64,
    /// All event types in the window, ordered descending by count.
    pub event_types: Vec<CountRow>,
    /// Click event names, ordered descending, capped at 50.
    pub top_interactions: Vec<CountRow>,
    /// Page URLs, ordered descending, capped at 100.
    pub top_urls: Vec<CountRow>,
    /// Sparse hourly histogram, ordered ascending by bucket.
    pub hourly: Vec<HourlyPoint>,
}

/// What the HTTP layer needs from a storage backend: the write path and the
/// read path. Object-safe so handlers and tests can hold a `dyn` store.
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    /// Append one canonical record; returns the store-assigned id.
    async fn append(&self, event: &NewEvent) -> Result<i64>;

    /// Compute windowed aggregates. `window_hours` is clamped to
    /// [`MIN_WINDOW_HOURS`, `MAX_WINDOW_HOURS`]. No partial results: any
    /// query failure fails the whole call.
    async fn summarize(&self, window_hours: i64) -> Result<Summary>;
}
