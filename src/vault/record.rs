//! Record types stored in the vault.
//!
//! A record file holds a `RecordEnvelope`: the hex ciphertext of a
//! JSON-serialized `SecretPayload`, plus plaintext metadata and
//! timestamps.  The payload itself only ever exists in memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::name::RecordName;
use crate::crypto::{codec, VaultKey};
use crate::errors::{PocketVaultError, Result};

/// The secret part of a record.  Never written to disk unencrypted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SecretPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SecretPayload {
    pub fn new(password: Option<String>, notes: Option<String>) -> Self {
        Self { password, notes }
    }

    /// Serialize and encrypt under `key`.
    pub fn seal(&self, key: &VaultKey) -> Result<String> {
        let mut json = serde_json::to_string(self)
            .map_err(|e| PocketVaultError::SerializationError(format!("payload: {e}")))?;
        let sealed = codec::encode(&json, key);
        json.zeroize();
        sealed
    }

    /// Decrypt and deserialize a payload sealed with `seal`.
    pub fn open(encrypted_data: &str, key: &VaultKey) -> Result<Self> {
        let mut json = codec::decode(encrypted_data, key)?;
        let payload = serde_json::from_str(&json)
            .map_err(|e| PocketVaultError::SerializationError(format!("payload: {e}")));
        json.zeroize();
        payload
    }
}

impl std::fmt::Debug for SecretPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretPayload")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("notes", &self.notes.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The JSON document persisted for each secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEnvelope {
    /// Hex-encoded ciphertext of the payload.
    pub encrypted_data: String,

    /// Name at the time of writing.  Informational only: `list` derives
    /// names from file paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Free-text description used for search and display.
    #[serde(default)]
    pub metadata: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl RecordEnvelope {
    /// `createdAt` must never be later than `updatedAt`.
    pub fn timestamps_valid(&self) -> bool {
        timestamps_ordered(self.created_at, self.updated_at)
    }
}

/// Shared by stored envelopes and incoming snapshot entries.
pub(crate) fn timestamps_ordered(created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> bool {
    created_at <= updated_at
}

/// A decrypted record returned by `VaultStore::get`.
#[derive(Debug, Clone)]
pub struct Record {
    pub name: RecordName,
    pub payload: SecretPayload,
    pub envelope: RecordEnvelope,
}

/// A record as seen by `VaultStore::list`: envelope only, no decryption.
#[derive(Debug, Clone)]
pub struct ListedRecord {
    pub name: RecordName,
    pub envelope: RecordEnvelope,
}

impl ListedRecord {
    /// Case-insensitive substring match on name and metadata.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.as_str().to_lowercase().contains(&query)
            || self.envelope.metadata.to_lowercase().contains(&query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_uses_camel_case_keys() {
        let now = Utc::now();
        let envelope = RecordEnvelope {
            encrypted_data: "abcd".into(),
            name: Some("work/email".into()),
            metadata: "work account".into(),
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json.get("encryptedData").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
        assert_eq!(json["metadata"], "work account");
    }

    #[test]
    fn envelope_without_name_parses() {
        let json = r#"{
            "encryptedData": "00",
            "metadata": "m",
            "createdAt": "2024-05-01T10:00:00.000Z",
            "updatedAt": "2024-05-02T10:00:00Z"
        }"#;
        let envelope: RecordEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.name, None);
        assert!(envelope.timestamps_valid());
    }

    #[test]
    fn payload_seal_open_roundtrip() {
        let key = VaultKey::generate();
        let payload = SecretPayload::new(Some("abc".into()), Some("n".into()));
        let sealed = payload.seal(&key).unwrap();
        assert!(!sealed.contains("abc"));
        assert_eq!(SecretPayload::open(&sealed, &key).unwrap(), payload);
    }

    #[test]
    fn payload_debug_redacts() {
        let payload = SecretPayload::new(Some("hunter2".into()), None);
        let dbg = format!("{payload:?}");
        assert!(!dbg.contains("hunter2"));
    }

    #[test]
    fn listed_record_matches_name_or_metadata() {
        let now = Utc::now();
        let listed = ListedRecord {
            name: RecordName::parse("work/email").unwrap(),
            envelope: RecordEnvelope {
                encrypted_data: String::new(),
                name: None,
                metadata: "Corporate Account".into(),
                created_at: now,
                updated_at: now,
            },
        };
        assert!(listed.matches("EMAIL"));
        assert!(listed.matches("corporate"));
        assert!(!listed.matches("bank"));
    }
}
