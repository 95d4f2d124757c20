use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256};
use std::fmt;

use crate::validation::ValidationError;

static BASE64_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9+/_-]*={0,2}$").expect("invalid regex"));

/// SHA-256 output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash([u8; 32]);

impl Sha256Hash {
    /// Hashes the given bytes.
    pub fn of(bytes: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Unpadded standard base64.
    pub fn to_base64(&self) -> String {
        STANDARD_NO_PAD.encode(self.0)
    }

    /// Unpadded URL-safe base64.
    pub fn to_url_safe_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl From<Sha256Hash> for Base64Bytes {
    fn from(hash: Sha256Hash) -> Self {
        Base64Bytes(hash.0.to_vec())
    }
}

/// Binary data carried in JSON as unpadded standard base64.
///
/// Decoding accepts padded or unpadded input in either the standard or the
/// URL-safe alphabet, since peers are not consistent about either.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Base64Bytes(pub Vec<u8>);

impl Base64Bytes {
    /// Wraps raw bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Decodes a base64 string in any of the accepted forms.
    pub fn decode(encoded: &str) -> Result<Self, ValidationError> {
        if !BASE64_PATTERN.is_match(encoded) {
            return Err(ValidationError::PatternMismatch {
                field: "base64",
                value: encoded.to_string(),
            });
        }
        let trimmed = encoded.trim_end_matches('=');
        let decoded = if trimmed.contains(&['-', '_'][..]) {
            URL_SAFE_NO_PAD.decode(trimmed)
        } else {
            STANDARD_NO_PAD.decode(trimmed)
        };
        decoded.map(Self).map_err(|_| ValidationError::PatternMismatch {
            field: "base64",
            value: encoded.to_string(),
        })
    }

    /// Unpadded standard base64 encoding.
    pub fn encode(&self) -> String {
        STANDARD_NO_PAD.encode(&self.0)
    }

    /// Underlying bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Base64Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl Serialize for Base64Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Base64Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64Bytes::decode(&encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            Sha256Hash::of(b"").to_base64(),
            "47DEQpj8HBSa+/TImW+5JCeuQeRkm5NMpJWZG3hSuFU"
        );
        assert_eq!(
            Sha256Hash::of(b"").to_url_safe_base64(),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn decode_accepts_every_variant() {
        let expected = vec![0xfb, 0xff, 0xbf];
        for encoded in ["+/+/", "-_-_"] {
            assert_eq!(Base64Bytes::decode(encoded).unwrap().0, expected);
        }
        assert_eq!(Base64Bytes::decode("aGk=").unwrap().0, b"hi".to_vec());
        assert_eq!(Base64Bytes::decode("aGk").unwrap().0, b"hi".to_vec());
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(Base64Bytes::decode("not base64!").is_err());
        assert!(Base64Bytes::decode("a").is_err());
    }

    #[test]
    fn serializes_unpadded() {
        let bytes = Base64Bytes::new(b"hi".to_vec());
        assert_eq!(serde_json::to_string(&bytes).unwrap(), r#""aGk""#);
    }
}
