//! Password hashing via bcrypt.

use std::sync::OnceLock;

use super::StoreError;

/// bcrypt cost factor for stored credentials.
pub const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt at the given cost.
pub fn hash_password(password: &str, cost: u32) -> Result<String, StoreError> {
    bcrypt::hash(password, cost).map_err(|e| StoreError::Hash(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, StoreError> {
    bcrypt::verify(password, hash).map_err(|e| StoreError::Hash(format!("bcrypt verify: {e}")))
}

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

/// A throwaway hash at [`BCRYPT_COST`], verified against when a login names
/// an unknown email so both failure paths pay for one bcrypt verify.
pub fn dummy_hash() -> Result<&'static str, StoreError> {
    if let Some(hash) = DUMMY_HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("agora-unknown-account", BCRYPT_COST)?;
    Ok(DUMMY_HASH.get_or_init(|| hash))
}
