use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Which ingestion path produced a record. Stored as 'pixel' / 'beacon'.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryKind {
    Pixel,
    Beacon,
}

impl DeliveryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryKind::Pixel => "pixel",
            DeliveryKind::Beacon => "beacon",
        }
    }

    /// Map a stored column value back to the enum. The store only ever writes
    /// the two known values; anything else reads as pixel (the base path).
    pub fn from_db(raw: &str) -> Self {
        match raw {
            "beacon" => DeliveryKind::Beacon,
            _ => DeliveryKind::Pixel,
        }
    }
}

/// Query parameters accepted by GET /pixel.gif.
///
/// Short keys match the tracker snippet: `u` = page URL, `r` = referrer,
/// `uid` = cookie-sourced visitor token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PixelParams {
    pub u: Option<String>,
    pub r: Option<String>,
    pub uid: Option<String>,
    pub event_type: Option<String>,
}

/// The JSON body the client beacon sends to POST /event.
///
/// Scalar fields arrive as arbitrary JSON values (string, number, bool, ...);
/// the normalizer coerces them with a total stringification, so decoding here
/// never rejects a field for being the "wrong" scalar type. Unknown fields
/// are ignored — client scripts evolve independently of the server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BeaconBody {
    pub url: Option<Value>,
    #[serde(rename = "ref")]
    pub referrer: Option<Value>,
    pub uid: Option<Value>,
    pub event_type: Option<Value>,
    pub event_name: Option<Value>,
    pub element_tag: Option<Value>,
    pub element_text: Option<Value>,
    pub link_url: Option<Value>,
    pub button_type: Option<Value>,
    pub form_id: Option<Value>,
    pub duration: Option<Value>,
    pub timestamp: Option<Value>,
}

/// An inbound event, decoded once at the HTTP boundary.
#[derive(Debug, Clone)]
pub enum IngestPayload {
    Pixel(PixelParams),
    Beacon(BeaconBody),
}

impl IngestPayload {
    pub fn delivery_kind(&self) -> DeliveryKind {
        match self {
            IngestPayload::Pixel(_) => DeliveryKind::Pixel,
            IngestPayload::Beacon(_) => DeliveryKind::Beacon,
        }
    }
}

/// Request metadata the boundary layer extracts from headers.
/// Both fields are best-effort and may be empty.
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub source_ip: String,
    pub user_agent: String,
}

/// A canonical record produced by the normalizer, ready to append.
/// The store assigns `id`; everything else is final here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Epoch seconds, stamped with the server clock — never caller-supplied.
    pub occurred_at: i64,
    /// Caller-supplied epoch millis; untrusted, duration math only.
    pub client_timestamp: Option<i64>,
    pub source_ip: String,
    pub user_agent: String,
    pub page_url: String,
    pub referrer_url: String,
    pub visitor_id: String,
    pub delivery_kind: DeliveryKind,
    pub event_type: String,
    pub event_name: Option<String>,
    pub element_tag: Option<String>,
    pub element_text: Option<String>,
    pub link_url: Option<String>,
    pub button_type: Option<String>,
    pub form_id: Option<String>,
    pub duration_ms: Option<i64>,
}

/// A stored event — mirrors the DuckDB `events` table columns exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: i64,
    pub occurred_at: i64,
    pub client_timestamp: Option<i64>,
    pub source_ip: String,
    pub user_agent: String,
    pub page_url: String,
    pub referrer_url: String,
    pub visitor_id: String,
    pub delivery_kind: DeliveryKind,
    pub event_type: String,
    pub event_name: Option<String>,
    pub element_tag: Option<String>,
    pub element_text: Option<String>,
    pub link_url: Option<String>,
    pub button_type: Option<String>,
    pub form_id: Option<String>,
    pub duration_ms: Option<i64>,
}
