use fedevent_canonical::{canonicalize_value, parse_object};
use serde::de::{self, Deserializer};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::EventError;
use crate::event::Event;
use crate::room_version::RoomVersion;

/// An event carrying its room version alongside it.
///
/// On the wire this is the event object with an extra top-level
/// `room_version` key, so the version is known before the event is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderedEvent {
    room_version: RoomVersion,
    event: Event,
}

impl HeaderedEvent {
    /// Wraps an event with its own room version.
    pub fn new(event: Event) -> Self {
        Self {
            room_version: event.room_version().clone(),
            event,
        }
    }

    /// Declared room version.
    pub fn room_version(&self) -> &RoomVersion {
        &self.room_version
    }

    /// Borrows the inner event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Drops the header.
    pub fn unwrap(self) -> Event {
        self.event
    }

    /// Parses headered JSON. The remainder is loaded as a trusted, unredacted event.
    pub fn from_json(bytes: &[u8]) -> Result<Self, EventError> {
        Self::from_object(parse_object(bytes)?)
    }

    fn from_object(mut object: Map<String, Value>) -> Result<Self, EventError> {
        let room_version = match object.remove("room_version") {
            Some(Value::String(version)) => RoomVersion::new(version),
            Some(other) => {
                return Err(EventError::MalformedInput(format!(
                    "room_version must be a string, found {other}"
                )))
            }
            None => {
                return Err(EventError::MalformedInput(
                    "missing room_version header".to_string(),
                ))
            }
        };
        room_version.describe()?;
        let json = canonicalize_value(&Value::Object(object))?;
        let event = Event::from_trusted(&json, false, &room_version)?;
        Ok(Self {
            room_version,
            event,
        })
    }

    /// Canonical headered JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, EventError> {
        Ok(canonicalize_value(&Value::Object(self.to_object()?))?)
    }

    fn to_object(&self) -> Result<Map<String, Value>, EventError> {
        let mut object = parse_object(self.event.json())?;
        object.insert(
            "room_version".to_string(),
            Value::String(self.room_version.as_str().to_string()),
        );
        Ok(object)
    }
}

impl From<Event> for HeaderedEvent {
    fn from(event: Event) -> Self {
        Self::new(event)
    }
}

impl Serialize for HeaderedEvent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_object()
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HeaderedEvent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_object(object).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event_json() -> Value {
        json!({
            "auth_events": [], "content": {}, "depth": 1, "origin": "example.org",
            "origin_server_ts": 7, "prev_events": [], "room_id": "!r:example.org",
            "sender": "@a:example.org", "type": "m.room.message",
        })
    }

    #[test]
    fn header_round_trips() {
        let mut headered = event_json();
        headered["room_version"] = json!("4");
        let parsed: HeaderedEvent = serde_json::from_value(headered.clone()).unwrap();
        assert_eq!(parsed.room_version().as_str(), "4");
        assert!(!parsed.event().redacted());
        assert!(!parsed.event().json().windows(12).any(|w| w == b"room_version"));
        assert_eq!(serde_json::to_value(&parsed).unwrap(), headered);

        let event = parsed.clone().unwrap();
        assert_eq!(event.headered(), parsed);
    }

    #[test]
    fn unknown_or_missing_header_fails() {
        let mut unknown = event_json();
        unknown["room_version"] = json!("not-a-version");
        let bytes = serde_json::to_vec(&unknown).unwrap();
        assert!(matches!(
            HeaderedEvent::from_json(&bytes),
            Err(EventError::UnsupportedRoomVersion(_))
        ));

        let bytes = serde_json::to_vec(&event_json()).unwrap();
        assert!(matches!(
            HeaderedEvent::from_json(&bytes),
            Err(EventError::MalformedInput(_))
        ));
    }
}
