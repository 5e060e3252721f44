//! Cryptographic primitives for PocketVault.
//!
//! This module provides:
//! - The vault's secret identity and its HKDF-derived record key (`identity`)
//! - The record codec: AES-256-GCM, hex-encoded (`codec`)
//! - Argon2id passcode hashing (`kdf`)
//! - Random password generation (`password`)

pub mod codec;
pub mod identity;
pub mod kdf;
pub mod password;

pub use codec::{decode, encode};
pub use identity::VaultKey;
pub use kdf::{hash_passcode, verify_passcode, Argon2Params};
pub use password::generate_password;
