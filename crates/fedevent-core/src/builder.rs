use chrono::{DateTime, Utc};
use fedevent_canonical::{canonicalize_value, KeyId, ServerName, SigningKey, EVENT_SIGIL};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::errors::EventError;
use crate::event::Event;
use crate::hashes::add_content_hash;
use crate::reference::EventReference;
use crate::room_version::{EventFormat, EventIdFormat, RoomVersion};
use crate::signatures::sign_event;
use crate::timestamp::Timestamp;

const RANDOM_ID_LENGTH: usize = 16;

/// Mutable staging record for a new event.
///
/// Reference lists accept either `[event_id, {"sha256": ...}]` pairs or bare
/// event ids when deserialized. The draft may be reused; the caller is
/// responsible for `depth` and for fresh references on each build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    /// User id of the sender.
    pub sender: String,
    /// Room id.
    pub room_id: String,
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: String,
    /// State key, for state events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_key: Option<String>,
    /// Previous events in the room DAG.
    #[serde(default, deserialize_with = "draft_references")]
    pub prev_events: Vec<EventReference>,
    /// Events authorising this one.
    #[serde(default, deserialize_with = "draft_references")]
    pub auth_events: Vec<EventReference>,
    /// Event id being redacted, for redaction events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redacts: Option<String>,
    /// Depth in the room DAG.
    #[serde(default)]
    pub depth: i64,
    /// Event content.
    #[serde(default = "empty_object")]
    pub content: Value,
    /// Unsigned data to attach.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unsigned: Option<Value>,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DraftReference {
    Pair(EventReference),
    Id(String),
}

fn draft_references<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<EventReference>, D::Error> {
    let references = Vec::<DraftReference>::deserialize(deserializer)?;
    Ok(references
        .into_iter()
        .map(|reference| match reference {
            DraftReference::Pair(pair) => pair,
            DraftReference::Id(id) => EventReference::from_event_id(id),
        })
        .collect())
}

impl EventDraft {
    /// Starts a draft with empty content and no references.
    pub fn new(
        sender: impl Into<String>,
        room_id: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            room_id: room_id.into(),
            event_type: event_type.into(),
            state_key: None,
            prev_events: Vec::new(),
            auth_events: Vec::new(),
            redacts: None,
            depth: 0,
            content: empty_object(),
            unsigned: None,
        }
    }

    /// Serializes `content` into the draft.
    pub fn set_content<T: Serialize>(&mut self, content: T) -> Result<(), EventError> {
        self.content =
            serde_json::to_value(content).map_err(|err| EventError::MalformedInput(err.to_string()))?;
        Ok(())
    }

    /// Serializes `unsigned` into the draft.
    pub fn set_unsigned<T: Serialize>(&mut self, unsigned: T) -> Result<(), EventError> {
        self.unsigned = Some(
            serde_json::to_value(unsigned)
                .map_err(|err| EventError::MalformedInput(err.to_string()))?,
        );
        Ok(())
    }

    /// Turns the draft into a hashed, signed and validated event.
    pub fn build(
        &self,
        now: DateTime<Utc>,
        origin: &ServerName,
        key_id: &KeyId,
        signing_key: &SigningKey,
        room_version: &RoomVersion,
    ) -> Result<Event, EventError> {
        let descriptor = room_version.describe()?;

        let mut object = Map::new();
        object.insert("sender".to_string(), json!(self.sender));
        object.insert("room_id".to_string(), json!(self.room_id));
        object.insert("type".to_string(), json!(self.event_type));
        object.insert("depth".to_string(), json!(self.depth));
        object.insert("content".to_string(), self.content.clone());
        if let Some(state_key) = &self.state_key {
            object.insert("state_key".to_string(), json!(state_key));
        }
        if let Some(redacts) = &self.redacts {
            object.insert("redacts".to_string(), json!(redacts));
        }
        if let Some(unsigned) = &self.unsigned {
            object.insert("unsigned".to_string(), unsigned.clone());
        }

        object.insert("origin".to_string(), json!(origin.as_str()));
        object.insert(
            "origin_server_ts".to_string(),
            json!(Timestamp::from_datetime(now).0),
        );
        if descriptor.event_id_format == EventIdFormat::Random {
            object.insert("event_id".to_string(), json!(random_event_id(origin)));
        }

        match descriptor.event_format {
            EventFormat::Legacy => {
                object.insert("prev_events".to_string(), json!(self.prev_events));
                object.insert("auth_events".to_string(), json!(self.auth_events));
            }
            EventFormat::Compact => {
                object.insert("prev_events".to_string(), json!(ids(&self.prev_events)));
                object.insert("auth_events".to_string(), json!(ids(&self.auth_events)));
            }
        }

        if self.state_key.is_some() {
            object.insert("prev_state".to_string(), json!([]));
        }

        let hashed = add_content_hash(object)?;
        let signed = sign_event(origin.as_str(), key_id, signing_key, &hashed)?;
        let json = canonicalize_value(&Value::Object(signed))?;

        let event = Event::assemble(json, false, room_version.clone())?;
        event.check_fields()?;
        debug!(
            event_id = %event.event_id(),
            room_version = %room_version,
            event_type = %event.event_type(),
            "built event"
        );
        Ok(event)
    }
}

fn ids(references: &[EventReference]) -> Vec<&str> {
    references
        .iter()
        .map(|reference| reference.event_id.as_str())
        .collect()
}

fn random_event_id(origin: &ServerName) -> String {
    let local: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_ID_LENGTH)
        .map(char::from)
        .collect();
    format!("{EVENT_SIGIL}{local}:{origin}")
}
