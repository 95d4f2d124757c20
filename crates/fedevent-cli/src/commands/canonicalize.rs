//! Canonicalize command implementation.

use fedevent_canonical::canonicalize;

use super::read_input;

pub fn run(input: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = read_input(input)?;
    let canonical =
        canonicalize(&bytes).map_err(|e| format!("Canonicalization failed: {}", e))?;
    println!("{}", String::from_utf8_lossy(&canonical));
    Ok(())
}
