//! Canonical data primitives shared by every federated room event.
//!
//! Everything that participates in hashing or signing lives in this crate:
//! the canonical JSON encoding, SHA-256/base64 helpers, the identifier
//! grammar, and detached JSON signatures. None of it knows about events.
//!
#![deny(missing_docs)]

/// Canonical JSON encoding.
pub mod canonicalizer;
/// Digest and base64 primitives.
pub mod digest;
/// Server names, key ids and sigil-prefixed ids.
pub mod identifiers;
/// Detached JSON signatures.
pub mod signing;
/// Validation helpers used by canonical types.
pub mod validation;

pub use canonicalizer::{
    canonicalize, canonicalize_value, parse, parse_object, CanonicalizationError,
    MAX_SAFE_INTEGER,
};
pub use digest::{Base64Bytes, Sha256Hash};
pub use identifiers::{split_id, KeyId, ServerName, EVENT_SIGIL, ROOM_SIGIL, USER_SIGIL};
pub use signing::{
    check_signatures_shape, decode_verifying_key, encode_verifying_key, list_key_ids,
    list_key_ids_in_object, sign_json, sign_json_object, verify_json, verify_json_object,
    SigningError, SigningKey, VerifyingKey,
};
pub use validation::ValidationError;
