//! Federated room events: room versions, redaction, hashing, signing,
//! construction, ingestion and validation.
//!
//! This crate provides:
//! - The room version registry and the formats each version selects
//! - Allow-list redaction, content hashes and reference hashes
//! - Signing and verifying events through their redacted form
//! - Building events from drafts and ingesting untrusted event JSON
//! - Protocol field validation
//! - Headered events, v2 invite requests and batch signature verification
//!
//! Core invariants:
//! - An [`Event`] is immutable; its canonical bytes are the source of truth
//! - Reference hashes (and compact event ids) survive redaction
//! - Content hash mismatches on ingestion redact the event instead of failing
//! - Batch verification reports one outcome per input, in input order
//!
#![deny(missing_docs)]

/// Draft to event construction.
pub mod builder;
/// Error types for event operations.
pub mod errors;
/// The immutable event type.
pub mod event;
/// Versioned field projection.
mod fields;
/// Content and reference hashing.
pub mod hashes;
/// Events with a room version header.
pub mod headered;
/// Version 2 invite requests.
pub mod invite;
/// Key rings and batch signature verification.
pub mod keyring;
/// Allow-list redaction.
pub mod redaction;
/// Event references.
pub mod reference;
/// Room version registry.
pub mod room_version;
/// Signing and verifying events via their redacted form.
pub mod signatures;
/// Origin server timestamps.
pub mod timestamp;
/// Field validation.
pub mod validation;

pub use builder::EventDraft;
pub use errors::EventError;
pub use event::Event;
pub use hashes::{add_content_hash, check_content_hash, content_hash, reference_hash};
pub use headered::HeaderedEvent;
pub use invite::{InviteV2Request, StrippedState};
pub use keyring::{
    required_signers, verified_events, verify_event_signatures, KeyRing, StaticKeyRing, VerifyKey,
};
pub use redaction::{
    redact_json, redact_object, M_ROOM_ALIASES, M_ROOM_CREATE, M_ROOM_HISTORY_VISIBILITY,
    M_ROOM_JOIN_RULES, M_ROOM_MEMBER, M_ROOM_POWER_LEVELS,
};
pub use reference::EventReference;
pub use room_version::{
    room_versions, stable_room_versions, supported_room_versions, EventFormat, EventIdFormat,
    RoomVersion, RoomVersionDescriptor, StateResAlgorithm,
};
pub use signatures::{sign_event, verify_event_signature};
pub use timestamp::Timestamp;
pub use validation::{MAX_EVENT_LENGTH, MAX_ID_LENGTH};
