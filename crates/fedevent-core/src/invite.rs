use fedevent_canonical::{canonicalize_value, parse_object};
use serde::de::{self, Deserializer};
use serde::ser::{Error as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::errors::EventError;
use crate::event::Event;
use crate::headered::HeaderedEvent;
use crate::room_version::RoomVersion;

/// Key the federation `/invite` v2 body carries the stripped state under.
const INVITE_ROOM_STATE: &str = "invite_room_state";
/// Key some older peers send instead; accepted on read, never written.
const INVITE_STRIPPED_STATE: &str = "invite_stripped_state";

/// Stripped copy of a room state event sent along with an invite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrippedState {
    /// Event content.
    pub content: Value,
    /// State key.
    pub state_key: Option<String>,
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Sender of the original event.
    pub sender: String,
}

impl StrippedState {
    /// Strips a state event; `None` for non-state events.
    pub fn from_event(event: &Event) -> Option<Self> {
        let state_key = event.state_key()?;
        Some(Self {
            content: event.content().clone(),
            state_key: Some(state_key.to_string()),
            event_type: event.event_type().to_string(),
            sender: event.sender().to_string(),
        })
    }
}

/// Body of a version 2 federation invite request.
///
/// `{"room_version": ..., "invite_room_state": [...], "event": {...}}`
#[derive(Debug, Clone, PartialEq)]
pub struct InviteV2Request {
    room_version: RoomVersion,
    invite_room_state: Vec<StrippedState>,
    event: Event,
}

impl InviteV2Request {
    /// Creates a request for a headered invite event.
    pub fn new(
        event: HeaderedEvent,
        invite_room_state: Vec<StrippedState>,
    ) -> Result<Self, EventError> {
        if event.room_version().as_str().is_empty() {
            return Err(EventError::MalformedInput(
                "invite event has no room version".to_string(),
            ));
        }
        Ok(Self {
            room_version: event.room_version().clone(),
            invite_room_state,
            event: event.unwrap(),
        })
    }

    /// Room version of the invited room.
    pub fn room_version(&self) -> &RoomVersion {
        &self.room_version
    }

    /// The invite membership event.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// State of the room shared with the invitee.
    pub fn invite_room_state(&self) -> &[StrippedState] {
        &self.invite_room_state
    }

    /// Parses a request body, ingesting `event` as untrusted input.
    pub fn from_json(bytes: &[u8]) -> Result<Self, EventError> {
        Self::from_object(parse_object(bytes)?)
    }

    fn from_object(mut object: Map<String, Value>) -> Result<Self, EventError> {
        let room_version = match object.remove("room_version") {
            Some(Value::String(version)) => RoomVersion::new(version),
            _ => {
                return Err(EventError::MalformedInput(
                    "invite request needs a string room_version".to_string(),
                ))
            }
        };
        let stripped_state = object.remove(INVITE_STRIPPED_STATE);
        let invite_room_state = match object.remove(INVITE_ROOM_STATE).or(stripped_state) {
            None | Some(Value::Null) => Vec::new(),
            Some(state) => serde_json::from_value(state)
                .map_err(|err| EventError::MalformedInput(err.to_string()))?,
        };
        let event = match object.remove("event") {
            Some(event @ Value::Object(_)) => canonicalize_value(&event)?,
            _ => {
                return Err(EventError::MalformedInput(
                    "invite request didn't contain an event".to_string(),
                ))
            }
        };
        let event = Event::from_untrusted(&event, &room_version)?;
        Ok(Self {
            room_version,
            invite_room_state,
            event,
        })
    }

    fn to_value(&self) -> Result<Value, EventError> {
        let event: Value = serde_json::from_slice(self.event.json())
            .map_err(|err| EventError::MalformedInput(err.to_string()))?;
        let mut object = Map::new();
        object.insert("room_version".to_string(), json!(self.room_version));
        object.insert(INVITE_ROOM_STATE.to_string(), json!(self.invite_room_state));
        object.insert("event".to_string(), event);
        Ok(Value::Object(object))
    }

    /// Canonical request body.
    pub fn to_json(&self) -> Result<Vec<u8>, EventError> {
        Ok(canonicalize_value(&self.to_value()?)?)
    }
}

impl Serialize for InviteV2Request {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().map_err(S::Error::custom)?.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InviteV2Request {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_object(object).map_err(de::Error::custom)
    }
}
