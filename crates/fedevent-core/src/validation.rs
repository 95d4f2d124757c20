//! Protocol grammar and size checks.

use fedevent_canonical::{split_id, EVENT_SIGIL, ROOM_SIGIL, USER_SIGIL};

use crate::errors::EventError;
use crate::event::Event;
use crate::redaction::M_ROOM_MEMBER;
use crate::room_version::EventIdFormat;

/// Maximum canonical length of an event, in bytes.
pub const MAX_EVENT_LENGTH: usize = 65536;
/// Maximum length of ids, event types and state keys, in bytes.
pub const MAX_ID_LENGTH: usize = 255;

fn check_length(field: &'static str, value: &str) -> Result<(), EventError> {
    if value.len() > MAX_ID_LENGTH {
        return Err(EventError::FieldTooLong {
            field,
            length: value.len(),
            max: MAX_ID_LENGTH,
        });
    }
    Ok(())
}

fn check_id(field: &'static str, sigil: char, id: &str) -> Result<(), EventError> {
    check_length(field, id)?;
    if !id.starts_with(sigil) {
        return Err(EventError::InvalidIdGrammar {
            field,
            id: id.to_string(),
            reason: format!("must start with '{sigil}'"),
        });
    }
    Ok(())
}

fn domain_of(field: &'static str, sigil: char, id: &str) -> Result<String, EventError> {
    split_id(sigil, id)
        .map(|(_, domain)| domain.as_str().to_string())
        .map_err(|err| EventError::InvalidIdGrammar {
            field,
            id: id.to_string(),
            reason: err.to_string(),
        })
}

/// Runs every field check, stopping at the first failure.
///
/// Under the `Random` id format the event id must carry the origin's domain.
/// The sender's domain must match the origin except for membership events.
/// Rooms without strict validity checking skip the sender comparison when
/// `origin` is absent; strict rooms never do.
pub(crate) fn check_fields(event: &Event) -> Result<(), EventError> {
    let descriptor = event.room_version().describe()?;

    if event.json().len() > MAX_EVENT_LENGTH {
        return Err(EventError::OversizedEvent {
            length: event.json().len(),
            max: MAX_EVENT_LENGTH,
        });
    }
    check_length("type", event.event_type())?;
    if let Some(state_key) = event.state_key() {
        check_length("state_key", state_key)?;
    }
    check_id("room_id", ROOM_SIGIL, event.room_id())?;
    domain_of("room_id", ROOM_SIGIL, event.room_id())?;
    check_id("sender", USER_SIGIL, event.sender())?;

    let origin = event.origin().as_str();
    if descriptor.event_id_format == EventIdFormat::Random {
        check_id("event_id", EVENT_SIGIL, event.event_id())?;
        let domain = domain_of("event_id", EVENT_SIGIL, event.event_id())?;
        if domain != origin {
            return Err(EventError::DomainMismatch {
                field: "event_id",
                domain,
                origin: origin.to_string(),
            });
        }
    }

    let sender_domain = domain_of("sender", USER_SIGIL, event.sender())?;
    let relaxed = origin.is_empty() && !descriptor.strict_validity_checking;
    if event.event_type() != M_ROOM_MEMBER && !relaxed && sender_domain != origin {
        return Err(EventError::DomainMismatch {
            field: "sender",
            domain: sender_domain,
            origin: origin.to_string(),
        });
    }

    if !event.has_prev_events() {
        return Err(EventError::MissingReferences {
            field: "prev_events",
        });
    }
    if !event.has_auth_events() {
        return Err(EventError::MissingReferences {
            field: "auth_events",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room_version::RoomVersion;
    use fedevent_canonical::canonicalize_value;
    use serde_json::{json, Value};

    fn base() -> Value {
        json!({
            "auth_events": [],
            "content": {},
            "depth": 1,
            "event_id": "$e:example.org",
            "origin": "example.org",
            "origin_server_ts": 1,
            "prev_events": [],
            "room_id": "!r:example.org",
            "sender": "@a:example.org",
            "type": "m.room.message",
        })
    }

    fn check(value: Value, version: &str) -> Result<(), EventError> {
        let json = canonicalize_value(&value).unwrap();
        Event::from_trusted(&json, false, &RoomVersion::new(version))
            .unwrap()
            .check_fields()
    }

    fn with(key: &str, value: Value) -> Value {
        let mut event = base();
        event[key] = value;
        event
    }

    fn without(key: &str) -> Value {
        let mut event = base();
        event.as_object_mut().unwrap().remove(key);
        event
    }

    #[test]
    fn well_formed_event_passes() {
        check(base(), "1").unwrap();
        check(without("event_id"), "5").unwrap();
    }

    #[test]
    fn state_key_length_boundary() {
        check(with("state_key", json!("k".repeat(255))), "1").unwrap();
        assert!(matches!(
            check(with("state_key", json!("k".repeat(256))), "1"),
            Err(EventError::FieldTooLong { field: "state_key", .. })
        ));
    }

    #[test]
    fn sigils_are_enforced() {
        assert!(matches!(
            check(with("room_id", json!("#r:example.org")), "1"),
            Err(EventError::InvalidIdGrammar { field: "room_id", .. })
        ));
        assert!(matches!(
            check(with("sender", json!("a:example.org")), "1"),
            Err(EventError::InvalidIdGrammar { field: "sender", .. })
        ));
        assert!(matches!(
            check(with("event_id", json!("e:example.org")), "2"),
            Err(EventError::InvalidIdGrammar { field: "event_id", .. })
        ));
        assert!(matches!(
            check(with("room_id", json!("!nodomain")), "1"),
            Err(EventError::InvalidIdGrammar { field: "room_id", .. })
        ));
    }

    #[test]
    fn long_room_id_is_too_long() {
        let room_id = format!("!{}:example.org", "r".repeat(250));
        assert!(matches!(
            check(with("room_id", json!(room_id)), "3"),
            Err(EventError::FieldTooLong { field: "room_id", .. })
        ));
    }

    #[test]
    fn event_id_domain_only_matters_for_random_ids() {
        let foreign = with("event_id", json!("$e:elsewhere.org"));
        assert!(matches!(
            check(foreign.clone(), "1"),
            Err(EventError::DomainMismatch { field: "event_id", .. })
        ));
        check(foreign, "4").unwrap();
    }

    #[test]
    fn sender_domain_must_match_origin() {
        let foreign = with("sender", json!("@a:elsewhere.org"));
        for version in ["1", "3", "5"] {
            assert!(matches!(
                check(foreign.clone(), version),
                Err(EventError::DomainMismatch { field: "sender", .. })
            ));
        }

        let mut member = foreign;
        member["type"] = json!("m.room.member");
        member["state_key"] = json!("@a:elsewhere.org");
        for version in ["1", "3", "5"] {
            check(member.clone(), version).unwrap();
        }
    }

    #[test]
    fn missing_origin_is_only_tolerated_without_strict_checking() {
        let mut event = without("origin");
        event.as_object_mut().unwrap().remove("event_id");
        check(event.clone(), "4").unwrap();
        assert!(matches!(
            check(event, "5"),
            Err(EventError::DomainMismatch { field: "sender", .. })
        ));
    }

    #[test]
    fn references_must_be_present() {
        assert!(matches!(
            check(without("prev_events"), "1"),
            Err(EventError::MissingReferences { field: "prev_events" })
        ));
        assert!(matches!(
            check(with("auth_events", Value::Null), "4"),
            Err(EventError::MissingReferences { field: "auth_events" })
        ));
    }
}
