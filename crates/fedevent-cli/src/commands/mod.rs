//! Command implementations and the input helpers they share.

pub mod build;
pub mod canonicalize;
pub mod inspect;
pub mod pubkey;
pub mod redact;
pub mod verify;
pub mod versions;

use fedevent_canonical::SigningKey;
use std::io::{self, Read};

/// Errors raised while preparing command input.
#[derive(thiserror::Error, Debug)]
pub enum InputError {
    #[error("Failed to read file {path}: {source}")]
    File { path: String, source: io::Error },
    #[error("Failed to read stdin: {0}")]
    Stdin(#[from] io::Error),
    #[error("Invalid seed: {0}")]
    Seed(String),
}

/// Reads the whole input file, or stdin when no path is given.
pub fn read_input(input: Option<String>) -> Result<Vec<u8>, InputError> {
    match input {
        Some(path) => std::fs::read(&path).map_err(|source| InputError::File { path, source }),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Decodes a hex-encoded 32-byte ed25519 seed.
pub fn signing_key_from_seed(seed: &str) -> Result<SigningKey, InputError> {
    let bytes = hex::decode(seed.trim()).map_err(|e| InputError::Seed(e.to_string()))?;
    let seed: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| InputError::Seed(format!("expected 32 bytes, got {}", bytes.len())))?;
    Ok(SigningKey::from_bytes(&seed))
}
