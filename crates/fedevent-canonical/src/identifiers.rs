use crate::validation::ValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                static PATTERN: Lazy<Regex> =
                    Lazy::new(|| Regex::new($pattern).expect("invalid regex"));
                let s = value.into();
                if !PATTERN.is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// Borrows the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    ServerName,
    "DNS name or IP literal of a homeserver, with an optional port (`example.org:8448`).",
    r"^(\[[0-9A-Fa-f:.]+\]|[A-Za-z0-9.-]+)(:[0-9]{1,5})?$"
);
newtype!(
    KeyId,
    "Signing key identifier of the form `ed25519:<version>`.",
    r"^ed25519:[A-Za-z0-9_]+$"
);

/// Sigil prefixing user ids.
pub const USER_SIGIL: char = '@';
/// Sigil prefixing room ids.
pub const ROOM_SIGIL: char = '!';
/// Sigil prefixing event ids.
pub const EVENT_SIGIL: char = '$';

/// Splits `SIGIL localpart ":" domain` into its localpart and server name.
///
/// The split happens on the first `:` so the domain may carry a port.
pub fn split_id(sigil: char, id: &str) -> Result<(&str, ServerName), ValidationError> {
    let rest = id
        .strip_prefix(sigil)
        .ok_or_else(|| ValidationError::PatternMismatch {
            field: "sigil",
            value: id.to_string(),
        })?;
    let (local, domain) = rest
        .split_once(':')
        .ok_or_else(|| ValidationError::PatternMismatch {
            field: "domain",
            value: id.to_string(),
        })?;
    Ok((local, ServerName::new(domain)))
}
