//! Backup snapshot format.
//!
//! A snapshot is a JSON object keyed by secret name.  Each value takes
//! one of two shapes:
//!
//! ```text
//! plain:     { "password"?, "notes"?, "metadata", "createdAt", "updatedAt" }
//! encrypted: { "encryptedData", "name"?, "metadata", "createdAt", "updatedAt" }
//! ```
//!
//! Parsing is strict: an entry with unknown fields, missing timestamps or
//! the wrong value types rejects the whole snapshot before anything is
//! imported.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::name::RECORD_EXTENSION;
use super::record::{RecordEnvelope, SecretPayload};
use crate::errors::{PocketVaultError, Result};

/// A decrypted entry.
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlainEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default)]
    pub metadata: String,

    #[zeroize(skip)]
    pub created_at: DateTime<Utc>,

    #[zeroize(skip)]
    pub updated_at: DateTime<Utc>,
}

impl PlainEntry {
    pub fn payload(&self) -> SecretPayload {
        SecretPayload::new(self.password.clone(), self.notes.clone())
    }
}

/// An entry still encrypted under the vault key: the record envelope as
/// stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EncryptedEntry {
    pub encrypted_data: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub metadata: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl From<RecordEnvelope> for EncryptedEntry {
    fn from(envelope: RecordEnvelope) -> Self {
        Self {
            encrypted_data: envelope.encrypted_data,
            name: envelope.name,
            metadata: envelope.metadata,
            created_at: envelope.created_at,
            updated_at: envelope.updated_at,
        }
    }
}

/// One value of the snapshot object.
#[derive(Clone, Serialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    Encrypted(EncryptedEntry),
    Plain(PlainEntry),
}

impl SnapshotEntry {
    /// Classify and validate one raw JSON value.
    ///
    /// The presence of `encryptedData` selects the encrypted shape;
    /// everything else must be a valid plain entry.
    fn from_value(value: serde_json::Value) -> std::result::Result<Self, String> {
        let serde_json::Value::Object(ref fields) = value else {
            return Err("expected an object".into());
        };

        if fields.contains_key("encryptedData") {
            serde_json::from_value(value)
                .map(Self::Encrypted)
                .map_err(|e| e.to_string())
        } else {
            serde_json::from_value(value)
                .map(Self::Plain)
                .map_err(|e| e.to_string())
        }
    }

    pub fn metadata(&self) -> &str {
        match self {
            Self::Encrypted(e) => &e.metadata,
            Self::Plain(p) => &p.metadata,
        }
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Encrypted(e) => e.created_at,
            Self::Plain(p) => p.created_at,
        }
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        match self {
            Self::Encrypted(e) => e.updated_at,
            Self::Plain(p) => p.updated_at,
        }
    }
}

/// A full backup: secret name -> entry, ordered by name.
#[derive(Clone, Default)]
pub struct Snapshot {
    entries: BTreeMap<String, SnapshotEntry>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: SnapshotEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&SnapshotEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SnapshotEntry)> {
        self.entries.iter()
    }

    /// Parse and validate a snapshot document.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| PocketVaultError::InvalidSnapshot(format!("not a JSON object: {e}")))?;

        let mut entries = BTreeMap::new();
        for (name, value) in raw {
            let entry = SnapshotEntry::from_value(value)
                .map_err(|e| PocketVaultError::InvalidSnapshot(format!("entry '{name}': {e}")))?;
            entries.insert(name, entry);
        }
        Ok(Self { entries })
    }

    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries)
            .map_err(|e| PocketVaultError::SerializationError(format!("snapshot: {e}")))
    }
}

/// Read and parse a snapshot file.
pub fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let content = fs::read_to_string(path).map_err(|e| {
        PocketVaultError::InvalidSnapshot(format!("cannot read {}: {e}", path.display()))
    })?;
    Snapshot::from_json(&content)
}

/// Write `snapshot` to `dest` with owner-only permissions.
///
/// Refuses destinations inside `vault_root` (they would be picked up by
/// sync) and anything named like a record file.
pub fn write_snapshot(dest: &Path, snapshot: &Snapshot, vault_root: &Path) -> Result<()> {
    if dest
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(RECORD_EXTENSION))
    {
        return Err(PocketVaultError::CommandFailed(format!(
            "refusing to export over a .{RECORD_EXTENSION} record file"
        )));
    }
    if is_inside(dest, vault_root) {
        return Err(PocketVaultError::CommandFailed(format!(
            "refusing to export into the vault directory {}",
            vault_root.display()
        )));
    }

    let json = snapshot.to_json()?;

    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(dest)?;
        file.write_all(json.as_bytes())?;
    }

    #[cfg(not(unix))]
    fs::write(dest, json)?;

    Ok(())
}

/// Whether `path` would land inside `root`, resolving symlinks where the
/// paths exist.
fn is_inside(path: &Path, root: &Path) -> bool {
    let Ok(root) = root.canonicalize() else {
        return false;
    };
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    parent
        .canonicalize()
        .map(|p| p.starts_with(&root))
        .unwrap_or(false)
}
