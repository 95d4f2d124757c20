//! Inspect command implementation.

use fedevent_core::{Event, RoomVersion};
use serde_json::json;

use super::read_input;
use crate::output::{format_json, print_summary};

pub fn run(
    room_version: String,
    json_output: bool,
    input: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input)?;
    let event = Event::from_untrusted(&bytes, &RoomVersion::new(room_version))
        .map_err(|e| format!("Event rejected: {}", e))?;
    let reference = event.event_reference();

    let output = json!({
        "event_id": event.event_id(),
        "room_version": event.room_version(),
        "room_id": event.room_id(),
        "sender": event.sender(),
        "type": event.event_type(),
        "state_key": event.state_key(),
        "depth": event.depth(),
        "origin": event.origin(),
        "origin_server_ts": event.origin_server_ts(),
        "redacted": event.redacted(),
        "reference_sha256": reference.event_sha256,
        "prev_events": event.prev_event_ids(),
        "auth_events": event.auth_event_ids(),
    });

    if json_output {
        println!("{}", format_json(&output));
    } else {
        print_summary(&output);
    }
    Ok(())
}
