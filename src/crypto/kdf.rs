//! Passcode hashing using Argon2id.
//!
//! The app passcode is never stored.  The key store keeps an Argon2id PHC
//! string (`$argon2id$v=19$m=..,t=..,p=..$salt$hash`), so the cost
//! parameters travel with the hash: verification always uses the
//! parameters the hash was made with, and `Argon2Params` only applies to
//! new hashes.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;

use crate::errors::{PocketVaultError, Result};

/// Length of the derived hash in bytes (256 bits).
const HASH_LEN: usize = 32;

/// Minimum safe memory cost in KiB (8 MB).
const MIN_MEMORY_KIB: u32 = 8_192;

/// Configurable Argon2id parameters.
///
/// These map 1:1 to the fields in `Settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Params {
    /// Memory cost in KiB (default: 19 456 = 19 MB).
    pub memory_kib: u32,
    /// Number of iterations (default: 2).
    pub iterations: u32,
    /// Parallelism lanes (default: 1).
    pub parallelism: u32,
}

impl Default for Argon2Params {
    fn default() -> Self {
        Self {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash `passcode` with a fresh random salt into a PHC string.
pub fn hash_passcode(passcode: &str, params: &Argon2Params) -> Result<String> {
    let argon2 = hasher(params)?;
    let salt = SaltString::generate(&mut OsRng);

    let hash = argon2
        .hash_password(passcode.as_bytes(), &salt)
        .map_err(|e| PocketVaultError::KeyDerivationFailed(format!("Argon2id hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Check `passcode` against a value produced by `hash_passcode`.
///
/// Returns `Ok(false)` for a wrong passcode and an error only when the
/// stored value itself is malformed.
pub fn verify_passcode(passcode: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored)
        .map_err(|e| PocketVaultError::KeyStore(format!("malformed passcode hash: {e}")))?;

    match Argon2::default().verify_password(passcode.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PocketVaultError::KeyStore(format!("passcode hash: {e}"))),
    }
}

fn hasher(argon2_params: &Argon2Params) -> Result<Argon2<'static>> {
    if argon2_params.memory_kib < MIN_MEMORY_KIB {
        return Err(PocketVaultError::KeyDerivationFailed(format!(
            "Argon2 memory_kib must be at least {MIN_MEMORY_KIB} (got {})",
            argon2_params.memory_kib
        )));
    }
    if argon2_params.iterations < 1 || argon2_params.parallelism < 1 {
        return Err(PocketVaultError::KeyDerivationFailed(
            "Argon2 iterations and parallelism must be at least 1".into(),
        ));
    }

    let params = Params::new(
        argon2_params.memory_kib,
        argon2_params.iterations,
        argon2_params.parallelism,
        Some(HASH_LEN),
    )
    .map_err(|e| PocketVaultError::KeyDerivationFailed(format!("invalid Argon2 params: {e}")))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}
