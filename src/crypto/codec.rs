//! Record codec: AES-256-GCM under the vault key, hex on the outside.
//!
//! Each call to `encode` generates a fresh random 12-byte nonce and
//! prepends it to the ciphertext, then hex-encodes the whole blob so it
//! can sit inside a JSON envelope.  `decode` reverses both steps.
//!
//! Layout of the bytes behind the hex string:
//!   [ 12-byte nonce | ciphertext + 16-byte auth tag ]

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use zeroize::Zeroize;

use super::identity::VaultKey;
use crate::errors::{PocketVaultError, Result};

/// Size of the AES-256-GCM nonce in bytes.
const NONCE_LEN: usize = 12;

/// Size of the GCM authentication tag in bytes.
const TAG_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and return the hex-encoded blob.
pub fn encode(plaintext: &str, key: &VaultKey) -> Result<String> {
    let record_key = key.record_key()?;
    let cipher = Aes256Gcm::new_from_slice(record_key.as_slice())
        .map_err(|e| PocketVaultError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|e| PocketVaultError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(hex::encode(blob))
}

/// Decrypt a blob produced by `encode`.
///
/// Every failure, whether bad hex, truncation, a tag mismatch or invalid
/// UTF-8, collapses into `DecryptionFailed` so callers cannot tell a wrong
/// key from a damaged record.
pub fn decode(ciphertext_hex: &str, key: &VaultKey) -> Result<String> {
    let blob = hex::decode(ciphertext_hex.trim()).map_err(|_| PocketVaultError::DecryptionFailed)?;
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(PocketVaultError::DecryptionFailed);
    }

    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let record_key = key.record_key()?;
    let cipher = Aes256Gcm::new_from_slice(record_key.as_slice())
        .map_err(|_| PocketVaultError::DecryptionFailed)?;

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| PocketVaultError::DecryptionFailed)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        PocketVaultError::DecryptionFailed
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrip() {
        let key = VaultKey::generate();
        let plaintext = r#"{"password":"hunter2","notes":"shared with nobody"}"#;

        let hex_blob = encode(plaintext, &key).unwrap();
        assert!(hex_blob.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(decode(&hex_blob, &key).unwrap(), plaintext);
    }

    #[test]
    fn empty_and_unicode_plaintexts_survive() {
        let key = VaultKey::generate();
        for text in ["", "pässwörd ✓", "line1\nline2"] {
            let blob = encode(text, &key).unwrap();
            assert_eq!(decode(&blob, &key).unwrap(), text);
        }
    }

    #[test]
    fn each_encoding_uses_a_fresh_nonce() {
        let key = VaultKey::generate();
        let a = encode("same", &key).unwrap();
        let b = encode("same", &key).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn wrong_key_is_rejected() {
        let key = VaultKey::generate();
        let other = VaultKey::generate();
        let blob = encode("secret", &key).unwrap();
        assert!(matches!(
            decode(&blob, &other),
            Err(PocketVaultError::DecryptionFailed)
        ));
    }

    #[test]
    fn malformed_blobs_are_rejected() {
        let key = VaultKey::generate();
        assert!(decode("not hex at all", &key).is_err());
        assert!(decode("abcd", &key).is_err());

        let mut blob = encode("secret", &key).unwrap();
        let last = blob.pop().unwrap();
        blob.push(if last == '0' { '1' } else { '0' });
        assert!(matches!(
            decode(&blob, &key),
            Err(PocketVaultError::DecryptionFailed)
        ));
    }
}
