//! Verify command implementation.

use fedevent_canonical::{decode_verifying_key, KeyId};
use fedevent_core::{Event, RoomVersion};

use super::read_input;

pub fn run(
    room_version: String,
    server: String,
    key_id: String,
    public_key: String,
    input: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let key_id = KeyId::parse(key_id).map_err(|e| format!("Invalid key id: {}", e))?;
    let public_key =
        decode_verifying_key(&public_key).map_err(|e| format!("Invalid public key: {}", e))?;

    let bytes = read_input(input)?;
    let event = Event::from_untrusted(&bytes, &RoomVersion::new(room_version))
        .map_err(|e| format!("Event rejected: {}", e))?;

    event
        .verify(&server, &key_id, &public_key)
        .map_err(|e| format!("Verification failed for {}: {}", event.event_id(), e))?;
    tracing::debug!(event_id = %event.event_id(), %server, "signature verified");

    if event.redacted() {
        println!("OK {} (redacted: content hash mismatch)", event.event_id());
    } else {
        println!("OK {}", event.event_id());
    }
    Ok(())
}
