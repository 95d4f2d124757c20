use fedevent_canonical::{CanonicalizationError, SigningError};
use thiserror::Error;

use crate::room_version::RoomVersion;

/// Errors returned by event construction, ingestion, validation and verification.
#[derive(Error, Debug)]
pub enum EventError {
    /// The room version is not in the registry.
    #[error("unsupported room version '{0}'")]
    UnsupportedRoomVersion(RoomVersion),
    /// Missing mandatory fields, wrong field types, bad reference tuples.
    #[error("malformed event: {0}")]
    MalformedInput(String),
    /// Input was not valid JSON or not canonicalizable.
    #[error("malformed event JSON: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// A field exceeds its length limit.
    #[error("{field} is too long, length {length} > maximum {max}")]
    FieldTooLong {
        /// Offending field.
        field: &'static str,
        /// Actual length in bytes.
        length: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// An id does not follow the `SIGIL localpart:domain` grammar.
    #[error("invalid {field} {id:?}: {reason}")]
    InvalidIdGrammar {
        /// Offending field.
        field: &'static str,
        /// Offending id.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
    /// An id's domain does not match the event origin.
    #[error("{field} domain doesn't match origin: {domain:?} != {origin:?}")]
    DomainMismatch {
        /// Field whose domain was compared.
        field: &'static str,
        /// Domain found in the field.
        domain: String,
        /// Declared origin of the event.
        origin: String,
    },
    /// `prev_events` or `auth_events` is absent or null.
    #[error("{field} must be present")]
    MissingReferences {
        /// Missing field.
        field: &'static str,
    },
    /// The whole event exceeds the size limit.
    #[error("event is too long, length {length} > maximum {max}")]
    OversizedEvent {
        /// Canonical length in bytes.
        length: usize,
        /// Allowed maximum.
        max: usize,
    },
    /// The declared content hash does not match. Ingestion recovers from this by redacting.
    #[error("content hash mismatch: {0}")]
    ContentHashMismatch(String),
    /// A signature check failed.
    #[error("signature check failed: {0}")]
    SignatureInvalid(#[from] SigningError),
    /// A server that must sign the event has not.
    #[error("event is not signed by {server}")]
    MissingSignature {
        /// Required signer.
        server: String,
    },
    /// None of a required server's key ids resolve to a usable key.
    #[error("no usable key from {server} among {key_ids:?}")]
    UnknownKey {
        /// Required signer.
        server: String,
        /// Key ids present on the event.
        key_ids: Vec<String>,
    },
    /// An accessor was used on an event of the wrong type.
    #[error("expected a {expected} event, found {found:?}")]
    WrongEventType {
        /// Type the accessor applies to.
        expected: &'static str,
        /// Actual type.
        found: String,
    },
}

impl EventError {
    /// True for errors that mean the input itself was unusable.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            EventError::MalformedInput(_) | EventError::Canonicalization(_)
        )
    }
}

/// Signals a broken internal invariant on an event that was already valid.
///
/// Only reached when re-deriving a transformed copy of a constructed or
/// ingested event fails, which cannot happen for events produced by this crate.
#[cold]
pub(crate) fn invariant_violated(context: &str, err: impl std::fmt::Display) -> ! {
    panic!("event invariant violated while {context}: {err}")
}
