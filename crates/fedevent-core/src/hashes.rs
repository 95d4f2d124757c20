//! Content hashes and reference hashes.

use fedevent_canonical::{canonicalize_value, Base64Bytes, Sha256Hash};
use serde_json::{json, Map, Value};

use crate::errors::EventError;
use crate::redaction::redact_object;
use crate::room_version::EventFormat;

/// SHA-256 over the unredacted event minus `unsigned`, `signatures` and `hashes`.
pub fn content_hash(event: &Map<String, Value>) -> Result<Sha256Hash, EventError> {
    let mut hashable = event.clone();
    hashable.remove("unsigned");
    hashable.remove("signatures");
    hashable.remove("hashes");
    Ok(Sha256Hash::of(&canonicalize_value(&Value::Object(hashable))?))
}

/// Replaces `hashes` with a freshly computed `{"sha256": ...}`.
pub fn add_content_hash(
    mut event: Map<String, Value>,
) -> Result<Map<String, Value>, EventError> {
    let hash = content_hash(&event)?;
    event.insert("hashes".to_string(), json!({ "sha256": hash.to_base64() }));
    Ok(event)
}

/// Compares the declared `hashes.sha256` with a recomputation.
///
/// A missing, mistyped or undecodable declared hash counts as a mismatch.
pub fn check_content_hash(event: &Map<String, Value>) -> Result<(), EventError> {
    let declared = event
        .get("hashes")
        .and_then(|hashes| hashes.get("sha256"))
        .and_then(Value::as_str)
        .ok_or_else(|| EventError::ContentHashMismatch("no sha256 content hash".to_string()))?;
    let declared = Base64Bytes::decode(declared)
        .map_err(|err| EventError::ContentHashMismatch(err.to_string()))?;
    let computed = content_hash(event)?;
    if declared.as_bytes() != computed.as_bytes() {
        return Err(EventError::ContentHashMismatch(format!(
            "declared {declared}, computed {}",
            computed.to_base64()
        )));
    }
    Ok(())
}

/// SHA-256 over the redacted event minus `signatures` and `unsigned`.
///
/// Compact-format events have no authoritative `event_id`, so one is never
/// part of their reference hash.
pub fn reference_hash(
    event: &Map<String, Value>,
    format: EventFormat,
) -> Result<Sha256Hash, EventError> {
    let mut redacted = redact_object(event);
    redacted.remove("signatures");
    redacted.remove("unsigned");
    if format == EventFormat::Compact {
        redacted.remove("event_id");
    }
    Ok(Sha256Hash::of(&canonicalize_value(&Value::Object(redacted))?))
}
