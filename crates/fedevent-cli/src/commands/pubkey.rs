//! Pubkey command implementation.

use fedevent_canonical::encode_verifying_key;

use super::signing_key_from_seed;

pub fn run(seed: String) -> Result<(), Box<dyn std::error::Error>> {
    let signing_key = signing_key_from_seed(&seed)?;
    println!("{}", encode_verifying_key(&signing_key.verifying_key()));
    Ok(())
}
