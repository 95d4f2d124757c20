//! Batch signature verification against a key directory.
//!
//! Key fetching and caching live outside this crate; callers hand in a
//! [`KeyRing`] that already knows the keys it can vouch for.

use std::collections::{BTreeMap, BTreeSet};

use fedevent_canonical::{KeyId, ServerName, VerifyingKey, EVENT_SIGIL, USER_SIGIL};
use tracing::debug;

use crate::errors::EventError;
use crate::event::Event;
use crate::headered::HeaderedEvent;
use crate::room_version::{EventIdFormat, RoomVersion};
use crate::timestamp::Timestamp;

/// A server's public key and the time it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyKey {
    /// ed25519 public key.
    pub public_key: VerifyingKey,
    /// Expiry reported by the server.
    pub valid_until_ts: Timestamp,
}

/// Source of server verify keys.
pub trait KeyRing {
    /// Looks up `server`'s key under `key_id`.
    fn verify_key(&self, server: &ServerName, key_id: &KeyId) -> Option<VerifyKey>;
}

/// In-memory [`KeyRing`].
#[derive(Debug, Clone, Default)]
pub struct StaticKeyRing {
    keys: BTreeMap<(ServerName, KeyId), VerifyKey>,
}

impl StaticKeyRing {
    /// Empty key ring.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a key.
    pub fn insert(&mut self, server: ServerName, key_id: KeyId, key: VerifyKey) {
        self.keys.insert((server, key_id), key);
    }
}

impl KeyRing for StaticKeyRing {
    fn verify_key(&self, server: &ServerName, key_id: &KeyId) -> Option<VerifyKey> {
        self.keys.get(&(server.clone(), key_id.clone())).cloned()
    }
}

fn domain(field: &'static str, sigil: char, id: &str) -> Result<ServerName, EventError> {
    fedevent_canonical::split_id(sigil, id)
        .map(|(_, domain)| domain)
        .map_err(|err| EventError::InvalidIdGrammar {
            field,
            id: id.to_string(),
            reason: err.to_string(),
        })
}

/// Servers whose signatures an event must carry.
///
/// Always the sender's server; for random-id rooms also the server named in
/// the event id.
pub fn required_signers(event: &Event) -> Result<BTreeSet<ServerName>, EventError> {
    let mut signers = BTreeSet::new();
    signers.insert(domain("sender", USER_SIGIL, event.sender())?);
    if event.room_version().event_id_format()? == EventIdFormat::Random {
        signers.insert(domain("event_id", EVENT_SIGIL, event.event_id())?);
    }
    Ok(signers)
}

fn verify_one<K: KeyRing>(event: &Event, keyring: &K) -> Result<(), EventError> {
    let strict = event.room_version().strict_validity_checking()?;
    for server in required_signers(event)? {
        let key_ids = event.key_ids(server.as_str())?;
        if key_ids.is_empty() {
            return Err(EventError::MissingSignature {
                server: server.to_string(),
            });
        }
        let usable = key_ids.iter().find_map(|key_id| {
            keyring
                .verify_key(&server, key_id)
                .filter(|key| !strict || key.valid_until_ts >= event.origin_server_ts())
                .map(|key| (key_id, key))
        });
        let Some((key_id, key)) = usable else {
            return Err(EventError::UnknownKey {
                server: server.to_string(),
                key_ids: key_ids.iter().map(ToString::to_string).collect(),
            });
        };
        event.verify(server.as_str(), key_id, &key.public_key)?;
    }
    Ok(())
}

/// Verifies every event's required signatures.
///
/// The output has one entry per input event, in the same order.
pub fn verify_event_signatures<K: KeyRing>(
    events: &[Event],
    keyring: &K,
) -> Vec<Result<(), EventError>> {
    events
        .iter()
        .map(|event| {
            let outcome = verify_one(event, keyring);
            if let Err(err) = &outcome {
                debug!(event_id = %event.event_id(), error = %err, "event failed signature checks");
            }
            outcome
        })
        .collect()
}

/// Ingests untrusted PDUs and keeps the ones whose signatures check out.
///
/// PDUs that fail ingestion or verification are dropped; the rest are
/// returned headered, in input order.
pub fn verified_events<K, I>(pdus: I, room_version: &RoomVersion, keyring: &K) -> Vec<HeaderedEvent>
where
    K: KeyRing,
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
{
    let events: Vec<Event> = pdus
        .into_iter()
        .filter_map(|pdu| match Event::from_untrusted(pdu.as_ref(), room_version) {
            Ok(event) => Some(event),
            Err(err) => {
                debug!(room_version = %room_version, error = %err, "dropping unusable event");
                None
            }
        })
        .collect();
    let outcomes = verify_event_signatures(&events, keyring);
    events
        .into_iter()
        .zip(outcomes)
        .filter_map(|(event, outcome)| outcome.ok().map(|()| event.headered()))
        .collect()
}
