use fedevent_canonical::{Base64Bytes, EVENT_SIGIL};
use serde::de::{self, Deserializer};
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reference to another event: its id plus the SHA-256 of its redacted form.
///
/// Serialized as the legacy `[event_id, {"sha256": hash}]` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventReference {
    /// Id of the referenced event.
    pub event_id: String,
    /// Reference hash of the referenced event.
    pub event_sha256: Base64Bytes,
}

impl EventReference {
    /// Creates a reference from its parts.
    pub fn new(event_id: impl Into<String>, event_sha256: Base64Bytes) -> Self {
        Self {
            event_id: event_id.into(),
            event_sha256,
        }
    }

    /// Reference for an id alone.
    ///
    /// Hash-derived ids already carry the hash after the sigil; for
    /// random ids the hash is left empty.
    pub fn from_event_id(event_id: impl Into<String>) -> Self {
        let event_id = event_id.into();
        let event_sha256 = event_id
            .strip_prefix(EVENT_SIGIL)
            .and_then(|hash| Base64Bytes::decode(hash).ok())
            .unwrap_or_default();
        Self {
            event_id,
            event_sha256,
        }
    }
}

#[derive(Serialize, Deserialize)]
struct ReferenceHashes {
    sha256: Base64Bytes,
}

impl Serialize for EventReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&self.event_id)?;
        seq.serialize_element(&ReferenceHashes {
            sha256: self.event_sha256.clone(),
        })?;
        seq.end()
    }
}

impl<'de> Deserialize<'de> for EventReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tuple = Vec::<Value>::deserialize(deserializer)?;
        let [event_id, hashes]: [Value; 2] = tuple.try_into().map_err(|tuple: Vec<Value>| {
            de::Error::custom(format!(
                "invalid event reference, invalid length: {} != 2",
                tuple.len()
            ))
        })?;
        let Value::String(event_id) = event_id else {
            return Err(de::Error::custom(format!(
                "invalid event reference, first element is invalid: {event_id}"
            )));
        };
        let hashes = ReferenceHashes::deserialize(&hashes).map_err(|err| {
            de::Error::custom(format!(
                "invalid event reference, second element is invalid: {hashes} {err}"
            ))
        })?;
        Ok(Self {
            event_id,
            event_sha256: hashes.sha256,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_wire_shape() {
        let reference = EventReference::new("$abc:example.org", Base64Bytes::new(b"hi".to_vec()));
        assert_eq!(
            serde_json::to_value(&reference).unwrap(),
            json!(["$abc:example.org", {"sha256": "aGk"}])
        );
        let back: EventReference =
            serde_json::from_value(json!(["$abc:example.org", {"sha256": "aGk="}])).unwrap();
        assert_eq!(back, reference);
    }

    #[test]
    fn malformed_references_are_rejected() {
        for bad in [
            json!(["$abc:example.org"]),
            json!(["$abc:example.org", {"sha256": "aGk"}, 3]),
            json!([1, {"sha256": "aGk"}]),
            json!(["$abc:example.org", "aGk"]),
            json!("$abc:example.org"),
        ] {
            assert!(serde_json::from_value::<EventReference>(bad).is_err());
        }
    }

    #[test]
    fn reference_from_hashed_id() {
        let hash = fedevent_canonical::Sha256Hash::of(b"event");
        let id = format!("${}", hash.to_url_safe_base64());
        let reference = EventReference::from_event_id(id.clone());
        assert_eq!(reference.event_id, id);
        assert_eq!(reference.event_sha256.as_bytes(), hash.as_bytes());

        let legacy = EventReference::from_event_id("$abc:example.org");
        assert!(legacy.event_sha256.as_bytes().is_empty());
    }
}
