//! Random password generation for new and edited secrets.

use rand::Rng;
use zeroize::Zeroizing;

use crate::errors::{PocketVaultError, Result};

/// Characters a generated password draws from.
const ALPHABET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+[]{};:,.?";

/// Shortest password `generate_password` will produce.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Longest password `generate_password` will produce.
pub const MAX_PASSWORD_LEN: usize = 256;

/// Generate a random password of `length` characters using the OS RNG.
pub fn generate_password(length: usize) -> Result<Zeroizing<String>> {
    if !(MIN_PASSWORD_LEN..=MAX_PASSWORD_LEN).contains(&length) {
        return Err(PocketVaultError::CommandFailed(format!(
            "password length must be between {MIN_PASSWORD_LEN} and {MAX_PASSWORD_LEN}"
        )));
    }

    let mut rng = rand::rngs::OsRng;
    let password: String = (0..length)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    Ok(Zeroizing::new(password))
}
