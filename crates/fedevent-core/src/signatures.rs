use fedevent_canonical::{sign_json_object, verify_json_object, KeyId, SigningKey, VerifyingKey};
use serde_json::{Map, Value};

use crate::errors::EventError;
use crate::redaction::redact_object;

/// Signs the redacted form of `event` and splices the resulting
/// `signatures` map into the unredacted event.
pub fn sign_event(
    signer: &str,
    key_id: &KeyId,
    signing_key: &SigningKey,
    event: &Map<String, Value>,
) -> Result<Map<String, Value>, EventError> {
    let signed = sign_json_object(signer, key_id, signing_key, redact_object(event))?;
    let mut event = event.clone();
    if let Some(signatures) = signed.get("signatures") {
        event.insert("signatures".to_string(), signatures.clone());
    }
    Ok(event)
}

/// Verifies `signer`'s signature over the redacted form of `event`.
pub fn verify_event_signature(
    signer: &str,
    key_id: &KeyId,
    verifying_key: &VerifyingKey,
    event: &Map<String, Value>,
) -> Result<(), EventError> {
    verify_json_object(signer, key_id, verifying_key, &redact_object(event))?;
    Ok(())
}
