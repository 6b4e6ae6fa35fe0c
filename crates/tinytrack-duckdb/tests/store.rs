//! Write-path tests: append/query round trips, id assignment under
//! concurrency, and migration idempotency.

use std::sync::Arc;

use chrono::Utc;
use tinytrack_core::analytics::AnalyticsStore;
use tinytrack_core::event::{DeliveryKind, NewEvent};
use tinytrack_duckdb::{schema, DuckDbStore};

fn sample_event(visitor_id: &str, event_type: &str) -> NewEvent {
    NewEvent {
        occurred_at: Utc::now().timestamp(),
        client_timestamp: Some(1_700_000_000_123),
        source_ip: "203.0.113.9".to_string(),
        user_agent: "Mozilla/5.0".to_string(),
        page_url: "http://example.com/pricing".to_string(),
        referrer_url: "http://example.com/".to_string(),
        visitor_id: visitor_id.to_string(),
        delivery_kind: DeliveryKind::Beacon,
        event_type: event_type.to_string(),
        event_name: Some("signup_button".to_string()),
        element_tag: Some("button".to_string()),
        element_text: Some("Sign up".to_string()),
        link_url: None,
        button_type: Some("submit".to_string()),
        form_id: None,
        duration_ms: Some(1500),
    }
}

#[tokio::test]
async fn append_then_query_round_trips_all_fields() {
    let store = DuckDbStore::open_in_memory().expect("store");
    let event = sample_event("v1", "click");

    let id = store.append(&event).await.expect("append");
    let rows = store
        .events_since(event.occurred_at - 1, None)
        .await
        .expect("query");

    let stored = rows
        .iter()
        .find(|e| e.id == id)
        .expect("appended event present");
    assert_eq!(stored.occurred_at, event.occurred_at);
    assert_eq!(stored.client_timestamp, event.client_timestamp);
    assert_eq!(stored.source_ip, event.source_ip);
    assert_eq!(stored.user_agent, event.user_agent);
    assert_eq!(stored.page_url, event.page_url);
    assert_eq!(stored.referrer_url, event.referrer_url);
    assert_eq!(stored.visitor_id, event.visitor_id);
    assert_eq!(stored.delivery_kind, event.delivery_kind);
    assert_eq!(stored.event_type, event.event_type);
    assert_eq!(stored.event_name, event.event_name);
    assert_eq!(stored.element_tag, event.element_tag);
    assert_eq!(stored.element_text, event.element_text);
    assert_eq!(stored.link_url, None);
    assert_eq!(stored.button_type, event.button_type);
    assert_eq!(stored.form_id, None);
    assert_eq!(stored.duration_ms, event.duration_ms);
}

#[tokio::test]
async fn ids_are_strictly_increasing_in_append_order() {
    let store = DuckDbStore::open_in_memory().expect("store");
    let mut last = 0;
    for i in 0..10 {
        let id = store
            .append(&sample_event(&format!("v{i}"), "page_view"))
            .await
            .expect("append");
        assert!(id > last, "id {id} not greater than previous {last}");
        last = id;
    }
}

#[tokio::test]
async fn concurrent_appends_lose_nothing_and_assign_distinct_ids() {
    const WRITERS: usize = 8;
    const EVENTS_PER_WRITER: usize = 25;

    let store = Arc::new(DuckDbStore::open_in_memory().expect("store"));
    let since = Utc::now().timestamp() - 1;

    let mut handles = Vec::new();
    for w in 0..WRITERS {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::with_capacity(EVENTS_PER_WRITER);
            for _ in 0..EVENTS_PER_WRITER {
                let id = store
                    .append(&sample_event(&format!("writer{w}"), "page_view"))
                    .await
                    .expect("append");
                ids.push(id);
            }
            ids
        }));
    }

    let mut all_ids = Vec::new();
    for handle in handles {
        all_ids.extend(handle.await.expect("writer task"));
    }

    assert_eq!(all_ids.len(), WRITERS * EVENTS_PER_WRITER);
    all_ids.sort_unstable();
    all_ids.dedup();
    assert_eq!(
        all_ids.len(),
        WRITERS * EVENTS_PER_WRITER,
        "duplicate ids assigned"
    );

    let rows = store.events_since(since, None).await.expect("query");
    assert_eq!(rows.len(), WRITERS * EVENTS_PER_WRITER);
}

#[tokio::test]
async fn event_type_filter_applies_equality() {
    let store = DuckDbStore::open_in_memory().expect("store");
    let since = Utc::now().timestamp() - 1;
    store
        .append(&sample_event("v1", "click"))
        .await
        .expect("append");
    store
        .append(&sample_event("v2", "page_view"))
        .await
        .expect("append");

    let clicks = store
        .events_since(since, Some("click"))
        .await
        .expect("query");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].event_type, "click");
}

#[tokio::test]
async fn migrations_are_recorded_and_rerun_safe() {
    let store = DuckDbStore::open_in_memory().expect("store");
    let conn = store.conn_for_test().await;

    // A second pass over an already-migrated store is a no-op, not an error.
    schema::apply_migrations(&conn).expect("re-run migrations");

    let applied: i64 = conn
        .prepare("SELECT COUNT(*) FROM _migrations")
        .expect("prepare")
        .query_row([], |row| row.get(0))
        .expect("count");
    assert_eq!(applied as usize, schema::MIGRATIONS.len());
}

#[tokio::test]
async fn store_is_usable_through_the_trait_object() {
    let store: Arc<dyn AnalyticsStore> = Arc::new(DuckDbStore::open_in_memory().expect("store"));
    let id = store
        .append(&sample_event("v1", "page_view"))
        .await
        .expect("append");
    assert!(id >= 1);

    let summary = store.summarize(24).await.expect("summarize");
    assert_eq!(summary.total_events, 1);
}
