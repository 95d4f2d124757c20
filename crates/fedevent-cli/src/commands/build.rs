//! Build command implementation.

use chrono::Utc;
use fedevent_canonical::{KeyId, ServerName};
use fedevent_core::{EventDraft, RoomVersion};

use super::{read_input, signing_key_from_seed};

pub fn run(
    room_version: String,
    origin: String,
    key_id: String,
    seed: String,
    input: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let origin = ServerName::parse(origin).map_err(|e| format!("Invalid origin: {}", e))?;
    let key_id = KeyId::parse(key_id).map_err(|e| format!("Invalid key id: {}", e))?;
    let signing_key = signing_key_from_seed(&seed)?;

    let bytes = read_input(input)?;
    let draft: EventDraft =
        serde_json::from_slice(&bytes).map_err(|e| format!("Invalid draft: {}", e))?;

    let event = draft.build(
        Utc::now(),
        &origin,
        &key_id,
        &signing_key,
        &RoomVersion::new(room_version),
    )?;
    println!("{}", String::from_utf8_lossy(event.json()));
    Ok(())
}
