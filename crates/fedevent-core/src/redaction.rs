//! Allow-list redaction.
//!
//! Redaction keeps only what is needed to re-derive an event's reference hash
//! and check its signatures. It must be a pure function of its input: every
//! server has to arrive at the same bytes for the same event.

use fedevent_canonical::{canonicalize_value, parse_object, CanonicalizationError};
use serde_json::{Map, Value};

/// Room creation event type.
pub const M_ROOM_CREATE: &str = "m.room.create";
/// Membership event type.
pub const M_ROOM_MEMBER: &str = "m.room.member";
/// Join rules event type.
pub const M_ROOM_JOIN_RULES: &str = "m.room.join_rules";
/// Power levels event type.
pub const M_ROOM_POWER_LEVELS: &str = "m.room.power_levels";
/// History visibility event type.
pub const M_ROOM_HISTORY_VISIBILITY: &str = "m.room.history_visibility";
/// Room aliases event type.
pub const M_ROOM_ALIASES: &str = "m.room.aliases";

const KEPT_TOP_LEVEL: &[&str] = &[
    "event_id",
    "sender",
    "room_id",
    "hashes",
    "signatures",
    "type",
    "state_key",
    "depth",
    "prev_events",
    "prev_state",
    "auth_events",
    "origin",
    "origin_server_ts",
    "membership",
];

fn kept_content_keys(event_type: &str) -> &'static [&'static str] {
    match event_type {
        M_ROOM_CREATE => &["creator"],
        M_ROOM_MEMBER => &["membership"],
        M_ROOM_JOIN_RULES => &["join_rule"],
        M_ROOM_POWER_LEVELS => &[
            "users",
            "users_default",
            "events",
            "events_default",
            "state_default",
            "ban",
            "kick",
            "redact",
        ],
        M_ROOM_HISTORY_VISIBILITY => &["history_visibility"],
        M_ROOM_ALIASES => &["aliases"],
        _ => &[],
    }
}

/// Returns the redacted form of an event object.
///
/// `type` and `content` are always present in the result. A missing or
/// non-string `type` redacts to `""`, a missing or non-object `content` to
/// `{}`. [`redact_json`] rejects the mistyped cases instead.
pub fn redact_object(event: &Map<String, Value>) -> Map<String, Value> {
    let mut redacted: Map<String, Value> = KEPT_TOP_LEVEL
        .iter()
        .filter_map(|key| event.get(*key).map(|value| (key.to_string(), value.clone())))
        .collect();

    let event_type = event.get("type").and_then(Value::as_str).unwrap_or_default();
    redacted.insert("type".to_string(), Value::String(event_type.to_string()));
    let content = match event.get("content") {
        Some(Value::Object(content)) => kept_content_keys(event_type)
            .iter()
            .filter_map(|key| content.get(*key).map(|value| (key.to_string(), value.clone())))
            .collect(),
        _ => Map::new(),
    };
    redacted.insert("content".to_string(), Value::Object(content));
    redacted
}

/// Redacts raw event JSON, returning canonical bytes.
///
/// A `type` that is not a string or a `content` that is not an object is an
/// error; either may be absent or null.
pub fn redact_json(bytes: &[u8]) -> Result<Vec<u8>, CanonicalizationError> {
    let event = parse_object(bytes)?;
    match event.get("type") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => {
            return Err(CanonicalizationError::InvalidStructure(
                "event type must be a string".to_string(),
            ))
        }
    }
    match event.get("content") {
        None | Some(Value::Null) | Some(Value::Object(_)) => {}
        Some(_) => {
            return Err(CanonicalizationError::InvalidStructure(
                "event content must be an object".to_string(),
            ))
        }
    }
    canonicalize_value(&Value::Object(redact_object(&event)))
}
