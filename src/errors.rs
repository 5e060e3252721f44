use std::path::PathBuf;
use thiserror::Error;

/// All errors that can occur in PocketVault.
#[derive(Debug, Error)]
pub enum PocketVaultError {
    // --- Crypto errors ---
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed — wrong key or corrupted record")]
    DecryptionFailed,

    #[error("Key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("Invalid vault key: {0}")]
    InvalidKey(String),

    // --- Vault errors ---
    #[error("Invalid secret name '{0}' — only letters, digits, '-', '_' and '/' are allowed")]
    InvalidName(String),

    #[error("Secret '{0}' not found")]
    SecretNotFound(String),

    #[error("Secret '{0}' already exists (use --force to overwrite or `edit` to update)")]
    SecretAlreadyExists(String),

    #[error("Invalid record at {path}: {reason}")]
    InvalidRecord { path: PathBuf, reason: String },

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),

    // --- Sync errors ---
    #[error("Merge conflict in {} — resolve manually in the vault directory", .0.join(", "))]
    MergeConflict(Vec<String>),

    #[error("git {command} failed: {stderr}")]
    Git { command: String, stderr: String },

    // --- State errors ---
    #[error("Vault not initialized — run `pocketvault init` first")]
    NotInitialized,

    #[error("Incorrect passcode")]
    IncorrectPasscode,

    #[error("Key store error: {0}")]
    KeyStore(String),

    // --- Config errors ---
    #[error("Config file error: {0}")]
    ConfigError(String),

    // --- IO errors ---
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // --- Serialization errors ---
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // --- CLI errors ---
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Convenience type alias for PocketVault results.
pub type Result<T> = std::result::Result<T, PocketVaultError>;
