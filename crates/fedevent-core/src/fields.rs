//! Versioned field projection over an event's canonical bytes.

use fedevent_canonical::ServerName;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::EventError;
use crate::reference::EventReference;
use crate::timestamp::Timestamp;

/// Fields shared by every event format.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CommonFields {
    pub room_id: String,
    pub sender: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub state_key: Option<String>,
    pub content: Value,
    #[serde(default)]
    pub redacts: Option<String>,
    #[serde(default)]
    pub depth: i64,
    #[serde(default)]
    pub unsigned: Option<Value>,
    #[serde(default)]
    pub origin_server_ts: Timestamp,
    #[serde(default)]
    pub origin: ServerName,
}

#[derive(Debug, Clone, Deserialize)]
struct LegacyRefs {
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    prev_events: Option<Vec<EventReference>>,
    #[serde(default)]
    auth_events: Option<Vec<EventReference>>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompactRefs {
    #[serde(default)]
    prev_events: Option<Vec<String>>,
    #[serde(default)]
    auth_events: Option<Vec<String>>,
}

/// Reference pairs with a stored id.
#[derive(Debug, Clone)]
pub(crate) struct LegacyFields {
    common: CommonFields,
    event_id: String,
    prev_events: Option<Vec<EventReference>>,
    auth_events: Option<Vec<EventReference>>,
}

/// Bare ids with an id derived from the reference hash.
#[derive(Debug, Clone)]
pub(crate) struct CompactFields {
    common: CommonFields,
    event_id: String,
    prev_events: Option<Vec<String>>,
    auth_events: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub(crate) enum EventFields {
    Legacy(LegacyFields),
    Compact(CompactFields),
}

fn malformed(err: serde_json::Error) -> EventError {
    EventError::MalformedInput(err.to_string())
}

impl EventFields {
    pub(crate) fn parse_legacy(value: &Value) -> Result<Self, EventError> {
        let common = CommonFields::deserialize(value).map_err(malformed)?;
        let refs = LegacyRefs::deserialize(value).map_err(malformed)?;
        Ok(EventFields::Legacy(LegacyFields {
            common,
            event_id: refs.event_id,
            prev_events: refs.prev_events,
            auth_events: refs.auth_events,
        }))
    }

    pub(crate) fn parse_compact(value: &Value, event_id: String) -> Result<Self, EventError> {
        let common = CommonFields::deserialize(value).map_err(malformed)?;
        let refs = CompactRefs::deserialize(value).map_err(malformed)?;
        Ok(EventFields::Compact(CompactFields {
            common,
            event_id,
            prev_events: refs.prev_events,
            auth_events: refs.auth_events,
        }))
    }

    pub(crate) fn common(&self) -> &CommonFields {
        match self {
            EventFields::Legacy(fields) => &fields.common,
            EventFields::Compact(fields) => &fields.common,
        }
    }

    pub(crate) fn event_id(&self) -> &str {
        match self {
            EventFields::Legacy(fields) => &fields.event_id,
            EventFields::Compact(fields) => &fields.event_id,
        }
    }

    pub(crate) fn has_prev_events(&self) -> bool {
        match self {
            EventFields::Legacy(fields) => fields.prev_events.is_some(),
            EventFields::Compact(fields) => fields.prev_events.is_some(),
        }
    }

    pub(crate) fn has_auth_events(&self) -> bool {
        match self {
            EventFields::Legacy(fields) => fields.auth_events.is_some(),
            EventFields::Compact(fields) => fields.auth_events.is_some(),
        }
    }

    pub(crate) fn prev_events(&self) -> Vec<EventReference> {
        match self {
            EventFields::Legacy(fields) => fields.prev_events.clone().unwrap_or_default(),
            EventFields::Compact(fields) => to_references(&fields.prev_events),
        }
    }

    pub(crate) fn auth_events(&self) -> Vec<EventReference> {
        match self {
            EventFields::Legacy(fields) => fields.auth_events.clone().unwrap_or_default(),
            EventFields::Compact(fields) => to_references(&fields.auth_events),
        }
    }

    pub(crate) fn prev_event_ids(&self) -> Vec<String> {
        match self {
            EventFields::Legacy(fields) => to_ids(&fields.prev_events),
            EventFields::Compact(fields) => fields.prev_events.clone().unwrap_or_default(),
        }
    }

    pub(crate) fn auth_event_ids(&self) -> Vec<String> {
        match self {
            EventFields::Legacy(fields) => to_ids(&fields.auth_events),
            EventFields::Compact(fields) => fields.auth_events.clone().unwrap_or_default(),
        }
    }
}

fn to_references(ids: &Option<Vec<String>>) -> Vec<EventReference> {
    ids.iter()
        .flatten()
        .map(|id| EventReference::from_event_id(id.as_str()))
        .collect()
}

fn to_ids(references: &Option<Vec<EventReference>>) -> Vec<String> {
    references
        .iter()
        .flatten()
        .map(|reference| reference.event_id.clone())
        .collect()
}
