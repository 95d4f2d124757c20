//! The immutable event value.
//!
//! An [`Event`] owns its canonical JSON bytes and a projection parsed from
//! them. The projection is only ever built from the final bytes, inside a
//! single constructor, so the two cannot drift apart. Every transformation
//! returns a new `Event`.

use std::sync::Arc;

use fedevent_canonical::{
    canonicalize, canonicalize_value, check_signatures_shape, list_key_ids_in_object,
    parse_object, KeyId, ServerName, SigningKey, VerifyingKey,
};
use serde::ser::{Error as _, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{invariant_violated, EventError};
use crate::fields::EventFields;
use crate::hashes::{check_content_hash, reference_hash};
use crate::headered::HeaderedEvent;
use crate::redaction::{redact_object, M_ROOM_MEMBER};
use crate::reference::EventReference;
use crate::room_version::{EventFormat, EventIdFormat, RoomVersion};
use crate::signatures::{sign_event, verify_event_signature};
use crate::timestamp::Timestamp;

/// Keys some peers inject into events they relay. Removed on ingestion.
const STRIPPED_ON_INGEST: [&str; 3] = ["outlier", "destinations", "age_ts"];

/// A federated room event.
#[derive(Debug, Clone)]
pub struct Event {
    json: Arc<[u8]>,
    room_version: RoomVersion,
    redacted: bool,
    fields: Arc<EventFields>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.json == other.json
            && self.room_version == other.room_version
            && self.redacted == other.redacted
    }
}

impl Eq for Event {}

impl Event {
    /// Ingests event JSON received from another server.
    ///
    /// Malformed input is rejected with a typed error. A content hash
    /// mismatch is not an error: the event is redacted and returned with
    /// [`Event::redacted`] set.
    pub fn from_untrusted(bytes: &[u8], room_version: &RoomVersion) -> Result<Event, EventError> {
        let format = room_version.event_format()?;
        let mut object = parse_object(bytes)?;
        if format == EventFormat::Compact {
            object.remove("event_id");
        }

        let shape = Value::Object(object.clone());
        match format {
            EventFormat::Legacy => EventFields::parse_legacy(&shape)?,
            EventFormat::Compact => EventFields::parse_compact(&shape, String::new())?,
        };

        for key in STRIPPED_ON_INGEST {
            object.remove(key);
        }

        let (json, redacted) = match check_content_hash(&object) {
            Ok(()) => (canonicalize_value(&Value::Object(object))?, false),
            Err(err) => {
                warn!(
                    room_version = %room_version,
                    error = %err,
                    "content hash check failed, redacting event"
                );
                (
                    canonicalize_value(&Value::Object(redact_object(&object)))?,
                    true,
                )
            }
        };

        let event = Event::assemble(json, redacted, room_version.clone())?;
        event.check_fields()?;
        debug!(event_id = %event.event_id(), redacted, "ingested event");
        Ok(event)
    }

    /// Loads event JSON that was already ingested and stored locally.
    ///
    /// Skips the hash check and format normalisation, which happened when the
    /// bytes were first ingested. The bytes are still re-canonicalized.
    pub fn from_trusted(
        bytes: &[u8],
        redacted: bool,
        room_version: &RoomVersion,
    ) -> Result<Event, EventError> {
        Event::assemble(canonicalize(bytes)?, redacted, room_version.clone())
    }

    /// Builds the event from its final canonical bytes.
    pub(crate) fn assemble(
        json: Vec<u8>,
        redacted: bool,
        room_version: RoomVersion,
    ) -> Result<Event, EventError> {
        let descriptor = room_version.describe()?;
        let object = parse_object(&json)?;
        check_signatures_shape(&object)
            .map_err(|err| EventError::MalformedInput(err.to_string()))?;
        let fields = match descriptor.event_format {
            EventFormat::Legacy => EventFields::parse_legacy(&Value::Object(object))?,
            EventFormat::Compact => {
                let hash = reference_hash(&object, EventFormat::Compact)?;
                let event_id = match descriptor.event_id_format {
                    EventIdFormat::HashedBase64 => format!("${}", hash.to_base64()),
                    EventIdFormat::HashedUrlSafeBase64 => {
                        format!("${}", hash.to_url_safe_base64())
                    }
                    EventIdFormat::Random => {
                        return Err(EventError::UnsupportedRoomVersion(room_version))
                    }
                };
                EventFields::parse_compact(&Value::Object(object), event_id)?
            }
        };
        Ok(Event {
            json: json.into(),
            room_version,
            redacted,
            fields: Arc::new(fields),
        })
    }

    fn object(&self) -> Map<String, Value> {
        parse_object(&self.json).unwrap_or_else(|err| invariant_violated("reparsing event", err))
    }

    fn rederive(&self, object: Map<String, Value>, redacted: bool, context: &str) -> Event {
        let json = canonicalize_value(&Value::Object(object))
            .unwrap_or_else(|err| invariant_violated(context, err));
        Event::assemble(json, redacted, self.room_version.clone())
            .unwrap_or_else(|err| invariant_violated(context, err))
    }

    /// Event id. Stored for legacy rooms, derived from the reference hash otherwise.
    pub fn event_id(&self) -> &str {
        self.fields.event_id()
    }

    /// User id of the sender.
    pub fn sender(&self) -> &str {
        &self.fields.common().sender
    }

    /// Room id.
    pub fn room_id(&self) -> &str {
        &self.fields.common().room_id
    }

    /// Event type.
    pub fn event_type(&self) -> &str {
        &self.fields.common().event_type
    }

    /// State key, for state events.
    pub fn state_key(&self) -> Option<&str> {
        self.fields.common().state_key.as_deref()
    }

    /// True if this is a state event with the given state key.
    pub fn state_key_equals(&self, state_key: &str) -> bool {
        self.state_key() == Some(state_key)
    }

    /// Depth in the room DAG, as given by the creator.
    pub fn depth(&self) -> i64 {
        self.fields.common().depth
    }

    /// Server that created the event.
    pub fn origin(&self) -> &ServerName {
        &self.fields.common().origin
    }

    /// Creation time reported by the origin server.
    pub fn origin_server_ts(&self) -> Timestamp {
        self.fields.common().origin_server_ts
    }

    /// Event content.
    pub fn content(&self) -> &Value {
        &self.fields.common().content
    }

    /// Canonical bytes of the content.
    pub fn content_bytes(&self) -> Vec<u8> {
        canonicalize_value(self.content())
            .unwrap_or_else(|err| invariant_violated("encoding content", err))
    }

    /// Unsigned data, if any.
    pub fn unsigned(&self) -> Option<&Value> {
        self.fields.common().unsigned.as_ref()
    }

    /// Canonical bytes of the unsigned data, if any.
    pub fn unsigned_bytes(&self) -> Option<Vec<u8>> {
        self.unsigned().map(|unsigned| {
            canonicalize_value(unsigned)
                .unwrap_or_else(|err| invariant_violated("encoding unsigned", err))
        })
    }

    /// Event id this event redacts, for redaction events.
    pub fn redacts(&self) -> Option<&str> {
        self.fields.common().redacts.as_deref()
    }

    /// References to the previous events.
    pub fn prev_events(&self) -> Vec<EventReference> {
        self.fields.prev_events()
    }

    /// Ids of the previous events.
    pub fn prev_event_ids(&self) -> Vec<String> {
        self.fields.prev_event_ids()
    }

    /// References to the auth events.
    pub fn auth_events(&self) -> Vec<EventReference> {
        self.fields.auth_events()
    }

    /// Ids of the auth events.
    pub fn auth_event_ids(&self) -> Vec<String> {
        self.fields.auth_event_ids()
    }

    pub(crate) fn has_prev_events(&self) -> bool {
        self.fields.has_prev_events()
    }

    pub(crate) fn has_auth_events(&self) -> bool {
        self.fields.has_auth_events()
    }

    /// Whether the event was redacted.
    pub fn redacted(&self) -> bool {
        self.redacted
    }

    /// Canonical JSON bytes.
    pub fn json(&self) -> &[u8] {
        &self.json
    }

    /// Room version this event belongs to.
    pub fn room_version(&self) -> &RoomVersion {
        &self.room_version
    }

    /// Content `membership` of a membership event.
    pub fn membership(&self) -> Result<&str, EventError> {
        if self.event_type() != M_ROOM_MEMBER {
            return Err(EventError::WrongEventType {
                expected: M_ROOM_MEMBER,
                found: self.event_type().to_string(),
            });
        }
        self.content()
            .get("membership")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                EventError::MalformedInput("membership event without a membership".to_string())
            })
    }

    /// Reference to this event for use in another event's prev/auth lists.
    pub fn event_reference(&self) -> EventReference {
        let format = self
            .room_version
            .event_format()
            .unwrap_or_else(|err| invariant_violated("resolving event format", err));
        let hash = reference_hash(&self.object(), format)
            .unwrap_or_else(|err| invariant_violated("computing reference hash", err));
        EventReference::new(self.event_id(), hash.into())
    }

    /// Key ids `signer` has signed this event with.
    pub fn key_ids(&self, signer: &str) -> Result<Vec<KeyId>, EventError> {
        Ok(list_key_ids_in_object(signer, &self.object())?)
    }

    /// Checks `signer`'s signature under `key_id`.
    pub fn verify(
        &self,
        signer: &str,
        key_id: &KeyId,
        verifying_key: &VerifyingKey,
    ) -> Result<(), EventError> {
        verify_event_signature(signer, key_id, verifying_key, &self.object())
    }

    /// Returns a copy carrying an additional signature.
    pub fn sign(&self, signer: &str, key_id: &KeyId, signing_key: &SigningKey) -> Event {
        let signed = sign_event(signer, key_id, signing_key, &self.object())
            .unwrap_or_else(|err| invariant_violated("signing event", err));
        self.rederive(signed, self.redacted, "signing event")
    }

    /// Returns the redacted copy of this event.
    pub fn redact(&self) -> Event {
        let redacted = redact_object(&self.object());
        self.rederive(redacted, true, "redacting event")
    }

    /// Returns a copy with `unsigned` replaced by `unsigned`.
    pub fn set_unsigned<T: Serialize>(&self, unsigned: T) -> Result<Event, EventError> {
        let unsigned = serde_json::to_value(unsigned)
            .map_err(|err| EventError::MalformedInput(err.to_string()))?;
        let mut object = self.object();
        object.insert("unsigned".to_string(), unsigned);
        self.replace_json(object)
    }

    /// Returns a copy with one key set inside `unsigned`.
    ///
    /// `path` is dot separated; `\.` escapes a literal dot. Missing
    /// intermediate objects are created.
    pub fn set_unsigned_field<T: Serialize>(
        &self,
        path: &str,
        value: T,
    ) -> Result<Event, EventError> {
        let value = serde_json::to_value(value)
            .map_err(|err| EventError::MalformedInput(err.to_string()))?;
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            return Err(EventError::MalformedInput("empty unsigned path".to_string()));
        };

        let mut object = self.object();
        let mut target = object
            .entry("unsigned".to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        for segment in parents {
            target = as_object_mut(target, path)?
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()));
        }
        as_object_mut(target, path)?.insert(last.clone(), value);
        self.replace_json(object)
    }

    fn replace_json(&self, object: Map<String, Value>) -> Result<Event, EventError> {
        let json = canonicalize_value(&Value::Object(object))?;
        Event::assemble(json, self.redacted, self.room_version.clone())
    }

    /// Wraps the event with its room version header.
    pub fn headered(&self) -> HeaderedEvent {
        HeaderedEvent::new(self.clone())
    }

    /// Runs the protocol field checks.
    pub fn check_fields(&self) -> Result<(), EventError> {
        crate::validation::check_fields(self)
    }
}

fn as_object_mut<'a>(
    value: &'a mut Value,
    path: &str,
) -> Result<&'a mut Map<String, Value>, EventError> {
    value.as_object_mut().ok_or_else(|| {
        EventError::MalformedInput(format!("unsigned path {path:?} crosses a non-object"))
    })
}

fn split_path(path: &str) -> Vec<String> {
    if path.is_empty() {
        return Vec::new();
    }
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => current.push(chars.next().unwrap_or('\\')),
            '.' => segments.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    segments.push(current);
    segments
}

impl Serialize for Event {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let value: Value = serde_json::from_slice(&self.json).map_err(S::Error::custom)?;
        value.serialize(serializer)
    }
}
