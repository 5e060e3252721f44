//! The vault's secret identity.
//!
//! Every record in a vault is encrypted under one identity string of the
//! form `POCKETVAULT-SECRET-KEY-<64 hex digits>`.  The string itself is what
//! users back up and what the key store persists; the AES-256 key used by
//! the codec is derived from its 32 random bytes with HKDF-SHA256.

use std::fmt;

use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, Zeroizing};

use crate::errors::{PocketVaultError, Result};

/// Prefix every identity string starts with.
pub const KEY_PREFIX: &str = "POCKETVAULT-SECRET-KEY-";

/// Length of the random identity material and of derived keys (256 bits).
const KEY_LEN: usize = 32;

/// HKDF context string binding derived keys to record encryption.
const RECORD_KEY_INFO: &[u8] = b"pocketvault-record-key";

/// The vault's single secret identity.
///
/// Holds the raw identity bytes and zeroes them on drop.  `Debug` never
/// prints the key material.
#[derive(Clone, Zeroize)]
#[zeroize(drop)]
pub struct VaultKey {
    bytes: [u8; KEY_LEN],
}

impl VaultKey {
    /// Generate a fresh identity from the OS random number generator.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Parse an identity string.
    ///
    /// Surrounding whitespace is ignored and the hex part is accepted in
    /// either case, so keys pasted from a backup still work.
    pub fn parse(identity: &str) -> Result<Self> {
        let trimmed = identity.trim();
        let hex_part = trimmed
            .strip_prefix(KEY_PREFIX)
            .ok_or_else(|| PocketVaultError::InvalidKey(format!("missing '{KEY_PREFIX}' prefix")))?;

        if hex_part.len() != KEY_LEN * 2 {
            return Err(PocketVaultError::InvalidKey(format!(
                "expected {} hex digits, got {}",
                KEY_LEN * 2,
                hex_part.len()
            )));
        }

        let mut decoded = Zeroizing::new(
            hex::decode(hex_part)
                .map_err(|e| PocketVaultError::InvalidKey(format!("bad hex: {e}")))?,
        );

        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self { bytes })
    }

    /// Render the identity string (`POCKETVAULT-SECRET-KEY-...`).
    pub fn to_identity_string(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("{KEY_PREFIX}{}", hex::encode_upper(self.bytes)))
    }

    /// Derive the 32-byte AES key used to encrypt records.
    pub fn record_key(&self) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let hk = Hkdf::<Sha256>::new(None, &self.bytes);
        let mut okm = Zeroizing::new([0u8; KEY_LEN]);
        hk.expand(RECORD_KEY_INFO, &mut okm[..])
            .map_err(|e| PocketVaultError::KeyDerivationFailed(format!("HKDF expand failed: {e}")))?;
        Ok(okm)
    }
}

impl PartialEq for VaultKey {
    fn eq(&self, other: &Self) -> bool {
        use subtle::ConstantTimeEq;
        self.bytes.ct_eq(&other.bytes).into()
    }
}

impl Eq for VaultKey {}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_key_round_trips_through_identity_string() {
        let key = VaultKey::generate();
        let identity = key.to_identity_string();
        assert!(identity.starts_with(KEY_PREFIX));
        assert_eq!(identity.len(), KEY_PREFIX.len() + 64);

        let parsed = VaultKey::parse(&identity).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn parse_accepts_lowercase_and_whitespace() {
        let key = VaultKey::generate();
        let identity = key.to_identity_string();
        let hex_part = identity.strip_prefix(KEY_PREFIX).unwrap().to_lowercase();
        let messy = format!("  {KEY_PREFIX}{hex_part}\n");
        assert_eq!(VaultKey::parse(&messy).unwrap(), key);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(VaultKey::parse("").is_err());
        assert!(VaultKey::parse("AGE-SECRET-KEY-1QQQQ").is_err());
        assert!(VaultKey::parse(&format!("{KEY_PREFIX}ABCD")).is_err());
        assert!(VaultKey::parse(&format!("{KEY_PREFIX}{}", "ZZ".repeat(32))).is_err());
    }

    #[test]
    fn record_key_is_deterministic_and_distinct() {
        let a = VaultKey::generate();
        let b = VaultKey::generate();
        assert_eq!(*a.record_key().unwrap(), *a.record_key().unwrap());
        assert_ne!(*a.record_key().unwrap(), *b.record_key().unwrap());
    }

    #[test]
    fn debug_does_not_leak_key() {
        let key = VaultKey::generate();
        let dbg = format!("{key:?}");
        assert_eq!(dbg, "VaultKey(<redacted>)");
    }
}
