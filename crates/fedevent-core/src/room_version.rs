//! Room version registry.
//!
//! Each room version pins the algorithms and wire formats used by every event
//! in a room. The table is built once and never mutated; unknown versions are
//! rejected here, before any format-specific code runs.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::EventError;

/// Room version identifier. Kept as a string since the grammar allows future versions.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomVersion(String);

/// State resolution algorithm selected by a room version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateResAlgorithm {
    /// Original state resolution.
    V1,
    /// Auth-chain based state resolution.
    V2,
}

/// Shape of the `prev_events` / `auth_events` fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventFormat {
    /// Explicit `[event_id, {"sha256": hash}]` reference pairs.
    Legacy,
    /// Bare event id strings.
    Compact,
}

/// How event ids are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventIdFormat {
    /// `$random:origin`, chosen at creation and stored in the event.
    Random,
    /// `$` + standard unpadded base64 of the reference hash.
    HashedBase64,
    /// `$` + URL-safe unpadded base64 of the reference hash.
    HashedUrlSafeBase64,
}

/// Capabilities of a room version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomVersionDescriptor {
    /// The server has some support for rooms of this version.
    pub supported: bool,
    /// Safe to advertise to clients.
    pub stable: bool,
    /// State resolution algorithm.
    pub state_res: StateResAlgorithm,
    /// Reference field format.
    pub event_format: EventFormat,
    /// Event id format.
    pub event_id_format: EventIdFormat,
    /// Enforce origin matching and key validity even where it was historically relaxed.
    pub strict_validity_checking: bool,
}

static REGISTRY: Lazy<BTreeMap<RoomVersion, RoomVersionDescriptor>> = Lazy::new(|| {
    use EventFormat::*;
    use EventIdFormat::*;
    use StateResAlgorithm::*;

    let entry = |state_res, event_format, event_id_format, strict| RoomVersionDescriptor {
        supported: true,
        stable: true,
        state_res,
        event_format,
        event_id_format,
        strict_validity_checking: strict,
    };
    BTreeMap::from([
        (RoomVersion::new("1"), entry(V1, Legacy, Random, false)),
        (RoomVersion::new("2"), entry(V2, Legacy, Random, false)),
        (RoomVersion::new("3"), entry(V2, Compact, HashedBase64, false)),
        (RoomVersion::new("4"), entry(V2, Compact, HashedUrlSafeBase64, false)),
        (RoomVersion::new("5"), entry(V2, Compact, HashedUrlSafeBase64, true)),
    ])
});

impl RoomVersion {
    /// Wraps a version identifier; no lookup happens until it is used.
    pub fn new(version: impl Into<String>) -> Self {
        Self(version.into())
    }

    /// Version identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Looks the version up in the registry.
    pub fn describe(&self) -> Result<&'static RoomVersionDescriptor, EventError> {
        REGISTRY
            .get(self)
            .ok_or_else(|| EventError::UnsupportedRoomVersion(self.clone()))
    }

    /// State resolution algorithm for this version.
    pub fn state_resolution_algorithm(&self) -> Result<StateResAlgorithm, EventError> {
        Ok(self.describe()?.state_res)
    }

    /// Reference field format for this version.
    pub fn event_format(&self) -> Result<EventFormat, EventError> {
        Ok(self.describe()?.event_format)
    }

    /// Event id format for this version.
    pub fn event_id_format(&self) -> Result<EventIdFormat, EventError> {
        Ok(self.describe()?.event_id_format)
    }

    /// Whether strict validity checking applies.
    pub fn strict_validity_checking(&self) -> Result<bool, EventError> {
        Ok(self.describe()?.strict_validity_checking)
    }
}

impl fmt::Display for RoomVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomVersion {
    fn from(version: &str) -> Self {
        Self::new(version)
    }
}

/// Every registered room version.
pub fn room_versions() -> &'static BTreeMap<RoomVersion, RoomVersionDescriptor> {
    &REGISTRY
}

/// Room versions this server supports.
pub fn supported_room_versions() -> BTreeMap<RoomVersion, RoomVersionDescriptor> {
    filter_versions(|desc| desc.supported)
}

/// Supported room versions that are also stable.
pub fn stable_room_versions() -> BTreeMap<RoomVersion, RoomVersionDescriptor> {
    filter_versions(|desc| desc.supported && desc.stable)
}

fn filter_versions(
    keep: impl Fn(&RoomVersionDescriptor) -> bool,
) -> BTreeMap<RoomVersion, RoomVersionDescriptor> {
    REGISTRY
        .iter()
        .filter(|(_, desc)| keep(desc))
        .map(|(version, desc)| (version.clone(), *desc))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_versions_resolve() {
        let v1 = RoomVersion::new("1").describe().unwrap();
        assert_eq!(v1.state_res, StateResAlgorithm::V1);
        assert_eq!(v1.event_format, EventFormat::Legacy);
        assert_eq!(v1.event_id_format, EventIdFormat::Random);

        let v3 = RoomVersion::new("3").describe().unwrap();
        assert_eq!(v3.event_format, EventFormat::Compact);
        assert_eq!(v3.event_id_format, EventIdFormat::HashedBase64);

        assert!(RoomVersion::new("5").strict_validity_checking().unwrap());
        assert!(!RoomVersion::new("4").strict_validity_checking().unwrap());
        assert_eq!(
            RoomVersion::new("4").event_id_format().unwrap(),
            EventIdFormat::HashedUrlSafeBase64
        );
    }

    #[test]
    fn unknown_version_is_rejected() {
        let err = RoomVersion::new("org.example.custom").describe().unwrap_err();
        assert!(matches!(err, EventError::UnsupportedRoomVersion(v) if v.as_str() == "org.example.custom"));
        assert!(RoomVersion::new("").event_format().is_err());
    }

    #[test]
    fn filtered_views_do_not_touch_the_table() {
        assert_eq!(supported_room_versions().len(), 5);
        assert_eq!(stable_room_versions().len(), 5);
        assert_eq!(room_versions().len(), 5);
        for version in ["1", "2", "3", "4", "5"] {
            assert!(stable_room_versions().contains_key(&RoomVersion::new(version)));
        }
    }

    #[test]
    fn state_res_selection() {
        assert_eq!(
            RoomVersion::new("1").state_resolution_algorithm().unwrap(),
            StateResAlgorithm::V1
        );
        for version in ["2", "3", "4", "5"] {
            assert_eq!(
                RoomVersion::new(version).state_resolution_algorithm().unwrap(),
                StateResAlgorithm::V2
            );
        }
    }
}
