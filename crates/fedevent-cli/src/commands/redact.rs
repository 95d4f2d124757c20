//! Redact command implementation.

use fedevent_core::redact_json;

use super::read_input;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input)?;
    let redacted = redact_json(&bytes).map_err(|e| format!("Redaction failed: {}", e))?;
    println!("{}", String::from_utf8_lossy(&redacted));
    Ok(())
}
