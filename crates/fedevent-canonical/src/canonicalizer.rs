use serde_json::Value;

use std::fmt;

/// Largest integer magnitude that survives a round trip through an IEEE-754 double.
pub const MAX_SAFE_INTEGER: i64 = (1 << 53) - 1;

/// Error returned when canonicalization fails.
#[derive(thiserror::Error, Debug)]
pub enum CanonicalizationError {
    /// Input bytes are not valid JSON.
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    /// Provided JSON could not be canonicalized.
    #[error("invalid JSON structure: {0}")]
    InvalidStructure(String),
    /// A fractional or non-finite number was found.
    #[error("non-integer number at {0}")]
    NonIntegerNumber(String),
    /// An integer outside the interoperable range was found.
    #[error("integer out of range at {path}: {value}")]
    IntegerOutOfRange {
        /// JSON path of the offending number.
        path: String,
        /// Offending value as written.
        value: String,
    },
    /// Generic failure.
    #[error("other error: {0}")]
    Other(String),
}

/// Helper for building JSON paths during validation.
#[derive(Debug, Clone)]
struct Path {
    segments: Vec<String>,
}

impl Path {
    fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    fn push_field(&self, field: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(field.to_string());
        Self { segments }
    }

    fn push_index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(format!("[{}]", index));
        Self { segments }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "root")
        } else {
            write!(f, "{}", self.segments.join("."))
        }
    }
}

/// Parses raw bytes and returns their canonical encoding.
///
/// Keys are sorted, insignificant whitespace is removed and strings are
/// emitted as UTF-8. Numbers must be integers within
/// `[-MAX_SAFE_INTEGER, MAX_SAFE_INTEGER]`.
pub fn canonicalize(bytes: &[u8]) -> Result<Vec<u8>, CanonicalizationError> {
    let value = parse(bytes)?;
    canonicalize_value(&value)
}

/// Canonical bytes for an already-parsed value.
pub fn canonicalize_value(value: &Value) -> Result<Vec<u8>, CanonicalizationError> {
    validate(value, Path::root())?;
    // `Map` is ordered by key bytes, which for UTF-8 is code point order.
    serde_json::to_vec(value).map_err(|err| CanonicalizationError::Other(err.to_string()))
}

/// Parses bytes into a JSON value, mapping parse failures to [`CanonicalizationError::InvalidJson`].
pub fn parse(bytes: &[u8]) -> Result<Value, CanonicalizationError> {
    serde_json::from_slice(bytes).map_err(|err| CanonicalizationError::InvalidJson(err.to_string()))
}

/// Parses bytes that must hold a JSON object.
pub fn parse_object(
    bytes: &[u8],
) -> Result<serde_json::Map<String, Value>, CanonicalizationError> {
    match parse(bytes)? {
        Value::Object(map) => Ok(map),
        other => Err(CanonicalizationError::InvalidStructure(format!(
            "expected an object, found {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn validate(value: &Value, path: Path) -> Result<(), CanonicalizationError> {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                validate(child, path.push_field(key))?;
            }
            Ok(())
        }
        Value::Array(items) => {
            for (idx, item) in items.iter().enumerate() {
                validate(item, path.push_index(idx))?;
            }
            Ok(())
        }
        Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                if !(-MAX_SAFE_INTEGER..=MAX_SAFE_INTEGER).contains(&i) {
                    return Err(CanonicalizationError::IntegerOutOfRange {
                        path: path.to_string(),
                        value: num.to_string(),
                    });
                }
                return Ok(());
            }
            if num.is_u64() {
                // Anything representable only as u64 is already above i64::MAX.
                return Err(CanonicalizationError::IntegerOutOfRange {
                    path: path.to_string(),
                    value: num.to_string(),
                });
            }
            Err(CanonicalizationError::NonIntegerNumber(path.to_string()))
        }
        Value::String(_) | Value::Bool(_) | Value::Null => Ok(()),
    }
}
