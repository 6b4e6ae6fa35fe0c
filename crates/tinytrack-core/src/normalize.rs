//! Turns an inbound payload into a canonical [`NewEvent`].
//!
//! Normalization is total: every delivery_kind / raw-field combination yields
//! a well-formed record. Malformed numeric input degrades to absent, never to
//! an error.

use chrono::Utc;
use serde_json::Value;

use crate::event::{BeaconBody, IngestPayload, NewEvent, PixelParams, RequestMeta};

/// element_text is capped at this many characters at normalize time.
pub const ELEMENT_TEXT_MAX_CHARS: usize = 200;

const DEFAULT_EVENT_TYPE: &str = "page_view";

/// Map an inbound payload plus request metadata to a canonical record.
///
/// `occurred_at` is stamped with the current server clock here; any
/// caller-supplied notion of time only survives as `client_timestamp`.
pub fn normalize(payload: IngestPayload, meta: &RequestMeta) -> NewEvent {
    let delivery_kind = payload.delivery_kind();
    let occurred_at = Utc::now().timestamp();

    match payload {
        IngestPayload::Pixel(p) => pixel_event(p, meta, occurred_at, delivery_kind),
        IngestPayload::Beacon(b) => beacon_event(b, meta, occurred_at, delivery_kind),
    }
}

fn pixel_event(
    p: PixelParams,
    meta: &RequestMeta,
    occurred_at: i64,
    delivery_kind: crate::event::DeliveryKind,
) -> NewEvent {
    NewEvent {
        occurred_at,
        client_timestamp: None,
        source_ip: meta.source_ip.clone(),
        user_agent: meta.user_agent.clone(),
        page_url: p.u.unwrap_or_default(),
        referrer_url: p.r.unwrap_or_default(),
        visitor_id: p.uid.unwrap_or_default(),
        delivery_kind,
        event_type: default_event_type(p.event_type),
        event_name: None,
        element_tag: None,
        element_text: None,
        link_url: None,
        button_type: None,
        form_id: None,
        duration_ms: None,
    }
}

fn beacon_event(
    b: BeaconBody,
    meta: &RequestMeta,
    occurred_at: i64,
    delivery_kind: crate::event::DeliveryKind,
) -> NewEvent {
    NewEvent {
        occurred_at,
        client_timestamp: coerce_int(b.timestamp.as_ref()),
        source_ip: meta.source_ip.clone(),
        user_agent: meta.user_agent.clone(),
        page_url: coerce_string(b.url.as_ref()),
        referrer_url: coerce_string(b.referrer.as_ref()),
        visitor_id: coerce_string(b.uid.as_ref()),
        delivery_kind,
        event_type: default_event_type(b.event_type.as_ref().map(stringify)),
        event_name: coerce_opt_string(b.event_name.as_ref()),
        element_tag: coerce_opt_string(b.element_tag.as_ref()),
        element_text: coerce_opt_string(b.element_text.as_ref())
            .map(|s| truncate_chars(&s, ELEMENT_TEXT_MAX_CHARS)),
        link_url: coerce_opt_string(b.link_url.as_ref()),
        button_type: coerce_opt_string(b.button_type.as_ref()),
        form_id: coerce_opt_string(b.form_id.as_ref()),
        duration_ms: coerce_int(b.duration.as_ref()).filter(|d| *d >= 0),
    }
}

/// Empty or absent event_type collapses to "page_view".
fn default_event_type(raw: Option<String>) -> String {
    match raw {
        Some(s) if !s.is_empty() => s,
        _ => DEFAULT_EVENT_TYPE.to_string(),
    }
}

/// Total stringification of a JSON scalar. Strings pass through unquoted;
/// numbers and bools become their text form; null and containers fall back to
/// their compact JSON text.
fn stringify(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Required-string coercion: absent/null becomes the empty-string default.
fn coerce_string(v: Option<&Value>) -> String {
    v.map(stringify).unwrap_or_default()
}

/// Optional-string coercion: absent, null, or empty input stays absent.
fn coerce_opt_string(v: Option<&Value>) -> Option<String> {
    let s = coerce_string(v);
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Integer coercion for duration / client_timestamp. Accepts a JSON number
/// or a numeric string; anything else is absent, not an error.
fn coerce_int(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Truncate to the first `max` characters (not bytes) on a char boundary.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::DeliveryKind;
    use serde_json::json;

    fn meta() -> RequestMeta {
        RequestMeta {
            source_ip: "203.0.113.9".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
        }
    }

    fn beacon(body: serde_json::Value) -> BeaconBody {
        serde_json::from_value(body).expect("beacon body")
    }

    #[test]
    fn pixel_defaults_apply() {
        let event = normalize(IngestPayload::Pixel(PixelParams::default()), &meta());
        assert_eq!(event.delivery_kind, DeliveryKind::Pixel);
        assert_eq!(event.event_type, "page_view");
        assert_eq!(event.page_url, "");
        assert_eq!(event.visitor_id, "");
        assert_eq!(event.source_ip, "203.0.113.9");
        assert!(event.occurred_at <= Utc::now().timestamp());
        assert_eq!(event.duration_ms, None);
        assert_eq!(event.client_timestamp, None);
    }

    #[test]
    fn pixel_empty_event_type_collapses_to_default() {
        let params = PixelParams {
            event_type: Some(String::new()),
            ..Default::default()
        };
        let event = normalize(IngestPayload::Pixel(params), &meta());
        assert_eq!(event.event_type, "page_view");
    }

    #[test]
    fn beacon_scalars_are_stringified_totally() {
        let body = beacon(json!({
            "url": "http://example.com/a",
            "uid": 42,
            "event_type": true,
            "event_name": "signup_button"
        }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.delivery_kind, DeliveryKind::Beacon);
        assert_eq!(event.page_url, "http://example.com/a");
        assert_eq!(event.visitor_id, "42");
        assert_eq!(event.event_type, "true");
        assert_eq!(event.event_name.as_deref(), Some("signup_button"));
    }

    #[test]
    fn non_numeric_duration_degrades_to_absent() {
        let body = beacon(json!({ "duration": "abc" }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.duration_ms, None);
    }

    #[test]
    fn negative_duration_degrades_to_absent() {
        let body = beacon(json!({ "duration": -5 }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.duration_ms, None);
    }

    #[test]
    fn numeric_string_duration_parses() {
        let body = beacon(json!({ "duration": "1500", "timestamp": 1700000000123i64 }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.duration_ms, Some(1500));
        assert_eq!(event.client_timestamp, Some(1_700_000_000_123));
    }

    #[test]
    fn element_text_truncated_to_200_chars() {
        let long = "x".repeat(500);
        let body = beacon(json!({ "element_text": long }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.element_text.map(|s| s.chars().count()), Some(200));
    }

    #[test]
    fn element_text_truncation_respects_char_boundaries() {
        let long = "é".repeat(300);
        let body = beacon(json!({ "element_text": long }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.element_text.map(|s| s.chars().count()), Some(200));
    }

    #[test]
    fn empty_optional_strings_stay_absent() {
        let body = beacon(json!({ "event_name": "", "form_id": null }));
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.event_name, None);
        assert_eq!(event.form_id, None);
    }

    #[test]
    fn unknown_beacon_fields_are_ignored() {
        let body: BeaconBody =
            serde_json::from_value(json!({ "url": "/x", "extra_field": {"a": 1} }))
                .expect("beacon body with unknown field");
        let event = normalize(IngestPayload::Beacon(body), &meta());
        assert_eq!(event.page_url, "/x");
    }
}
