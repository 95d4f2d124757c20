//! Detached ed25519 signatures over canonical JSON objects.
//!
//! A signature covers the canonical bytes of the object with its
//! `signatures` and `unsigned` keys removed, and is stored back under
//! `signatures.<signer>.<key id>` as unpadded base64.

use ed25519_dalek::{Signature, Signer, Verifier};
use serde_json::{Map, Value};

use crate::canonicalizer::{canonicalize_value, parse_object, CanonicalizationError};
use crate::digest::Base64Bytes;
use crate::identifiers::KeyId;

pub use ed25519_dalek::{SigningKey, VerifyingKey};

/// Errors produced while signing or verifying JSON.
#[derive(thiserror::Error, Debug)]
pub enum SigningError {
    /// Input could not be parsed or canonicalized.
    #[error("canonicalization failed: {0}")]
    Canonicalization(#[from] CanonicalizationError),
    /// The object has no signature for the requested signer and key.
    #[error("no signature from {signer} with key {key_id}")]
    MissingSignature {
        /// Signing entity.
        signer: String,
        /// Key identifier that was looked up.
        key_id: String,
    },
    /// The signature is present but does not verify.
    #[error("signature from {signer} with key {key_id} is invalid")]
    InvalidSignature {
        /// Signing entity.
        signer: String,
        /// Key identifier of the bad signature.
        key_id: String,
    },
    /// The `signatures` key does not have the `{signer: {key_id: sig}}` shape.
    #[error("malformed signatures object: {0}")]
    MalformedSignatures(String),
    /// A public key could not be decoded.
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),
}

/// Signs a JSON object, returning its canonical bytes with the new signature merged in.
pub fn sign_json(
    signer: &str,
    key_id: &KeyId,
    signing_key: &SigningKey,
    bytes: &[u8],
) -> Result<Vec<u8>, SigningError> {
    let object = parse_object(bytes)?;
    let signed = sign_json_object(signer, key_id, signing_key, object)?;
    Ok(canonicalize_value(&Value::Object(signed))?)
}

/// Object-level form of [`sign_json`].
pub fn sign_json_object(
    signer: &str,
    key_id: &KeyId,
    signing_key: &SigningKey,
    mut object: Map<String, Value>,
) -> Result<Map<String, Value>, SigningError> {
    let existing = object.remove("signatures");
    let unsigned = object.remove("unsigned");

    let canonical = canonicalize_value(&Value::Object(object.clone()))?;
    let signature = signing_key.sign(&canonical);

    let mut signatures = match existing {
        None => Map::new(),
        Some(Value::Object(map)) => map,
        Some(_) => {
            return Err(SigningError::MalformedSignatures(
                "signatures must be an object".to_string(),
            ))
        }
    };
    let by_signer = signatures
        .entry(signer.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    let Value::Object(by_signer) = by_signer else {
        return Err(SigningError::MalformedSignatures(format!(
            "signatures for {signer} must be an object"
        )));
    };
    by_signer.insert(
        key_id.to_string(),
        Value::String(Base64Bytes::new(signature.to_bytes().to_vec()).encode()),
    );

    object.insert("signatures".to_string(), Value::Object(signatures));
    if let Some(unsigned) = unsigned {
        object.insert("unsigned".to_string(), unsigned);
    }
    Ok(object)
}

/// Checks that `bytes` carries a valid signature from `signer` under `key_id`.
pub fn verify_json(
    signer: &str,
    key_id: &KeyId,
    verifying_key: &VerifyingKey,
    bytes: &[u8],
) -> Result<(), SigningError> {
    let object = parse_object(bytes)?;
    verify_json_object(signer, key_id, verifying_key, &object)
}

/// Object-level form of [`verify_json`].
pub fn verify_json_object(
    signer: &str,
    key_id: &KeyId,
    verifying_key: &VerifyingKey,
    object: &Map<String, Value>,
) -> Result<(), SigningError> {
    let missing = || SigningError::MissingSignature {
        signer: signer.to_string(),
        key_id: key_id.to_string(),
    };
    let invalid = || SigningError::InvalidSignature {
        signer: signer.to_string(),
        key_id: key_id.to_string(),
    };

    let encoded = object
        .get("signatures")
        .and_then(|sigs| sigs.get(signer))
        .and_then(|by_signer| by_signer.get(key_id.as_str()))
        .and_then(Value::as_str)
        .ok_or_else(missing)?;
    let raw = Base64Bytes::decode(encoded).map_err(|_| invalid())?;
    let raw: [u8; 64] = raw.0.as_slice().try_into().map_err(|_| invalid())?;
    let signature = Signature::from_bytes(&raw);

    let mut stripped = object.clone();
    stripped.remove("signatures");
    stripped.remove("unsigned");
    let canonical = canonicalize_value(&Value::Object(stripped))?;

    verifying_key
        .verify(&canonical, &signature)
        .map_err(|_| invalid())
}

/// Checks that `signatures`, when present, has the
/// `{server: {key_id: string}}` shape.
pub fn check_signatures_shape(object: &Map<String, Value>) -> Result<(), SigningError> {
    let signatures = match object.get("signatures") {
        None => return Ok(()),
        Some(Value::Object(signatures)) => signatures,
        Some(_) => {
            return Err(SigningError::MalformedSignatures(
                "signatures must be an object".to_string(),
            ))
        }
    };
    for (signer, by_signer) in signatures {
        let Value::Object(keys) = by_signer else {
            return Err(SigningError::MalformedSignatures(format!(
                "signatures for {signer} must be an object"
            )));
        };
        if let Some((key_id, _)) = keys.iter().find(|(_, sig)| !sig.is_string()) {
            return Err(SigningError::MalformedSignatures(format!(
                "signature {signer}/{key_id} must be a string"
            )));
        }
    }
    Ok(())
}

/// Key ids that `signer` has signed `bytes` with, sorted.
pub fn list_key_ids(signer: &str, bytes: &[u8]) -> Result<Vec<KeyId>, SigningError> {
    let object = parse_object(bytes)?;
    list_key_ids_in_object(signer, &object)
}

/// Object-level form of [`list_key_ids`].
pub fn list_key_ids_in_object(
    signer: &str,
    object: &Map<String, Value>,
) -> Result<Vec<KeyId>, SigningError> {
    let by_signer = match object.get("signatures") {
        None => return Ok(Vec::new()),
        Some(Value::Object(signatures)) => signatures.get(signer),
        Some(_) => {
            return Err(SigningError::MalformedSignatures(
                "signatures must be an object".to_string(),
            ))
        }
    };
    let mut ids = match by_signer {
        None => Vec::new(),
        Some(Value::Object(keys)) => keys.keys().map(|k| KeyId::new(k.as_str())).collect(),
        Some(_) => {
            return Err(SigningError::MalformedSignatures(format!(
                "signatures for {signer} must be an object"
            )))
        }
    };
    ids.sort();
    Ok(ids)
}

/// Unpadded base64 form of a public key, as published in key documents.
pub fn encode_verifying_key(key: &VerifyingKey) -> String {
    Base64Bytes::new(key.to_bytes().to_vec()).encode()
}

/// Parses an unpadded (or padded) base64 public key.
pub fn decode_verifying_key(encoded: &str) -> Result<VerifyingKey, SigningError> {
    let raw = Base64Bytes::decode(encoded)
        .map_err(|err| SigningError::InvalidPublicKey(err.to_string()))?;
    let raw: [u8; 32] = raw
        .0
        .as_slice()
        .try_into()
        .map_err(|_| SigningError::InvalidPublicKey(format!("expected 32 bytes, got {}", raw.0.len())))?;
    VerifyingKey::from_bytes(&raw).map_err(|err| SigningError::InvalidPublicKey(err.to_string()))
}
