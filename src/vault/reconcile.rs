//! Export and import of whole vaults.
//!
//! Import merges a snapshot into the local store with last-write-wins on
//! `updatedAt`: an incoming entry replaces a local record only when it is
//! strictly newer.  Equal timestamps are resolved by `TieBreak`.  Each
//! entry is handled independently; one bad entry never aborts the batch.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::name::RecordName;
use super::record::{timestamps_ordered, RecordEnvelope, SecretPayload};
use super::snapshot::{self, EncryptedEntry, PlainEntry, Snapshot, SnapshotEntry};
use super::store::VaultStore;
use crate::crypto::VaultKey;
use crate::errors::{PocketVaultError, Result};

/// Which shape `export_all` produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    /// Decrypted payloads next to metadata and timestamps.
    Plain,
    /// Record envelopes as stored; still encrypted under the vault key.
    Encrypted,
}

impl std::str::FromStr for ExportMode {
    type Err = PocketVaultError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "plain" => Ok(Self::Plain),
            "encrypted" => Ok(Self::Encrypted),
            other => Err(PocketVaultError::CommandFailed(format!(
                "unknown export mode '{other}' — use 'plain' or 'encrypted'"
            ))),
        }
    }
}

/// How to resolve an incoming entry whose `updatedAt` equals the local one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TieBreak {
    /// Keep the local record; the incoming entry is skipped.
    #[default]
    KeepLocal,
    /// Replace the local record with the incoming entry.
    TakeIncoming,
}

/// Result of `export_all`.
pub struct Export {
    pub snapshot: Snapshot,
    /// Records left out because they could not be decrypted.
    pub skipped: Vec<String>,
}

/// An entry that could not be imported.
#[derive(Debug, Clone)]
pub struct ImportFailure {
    pub name: String,
    pub reason: String,
}

/// What `import_all` did with each entry.
#[derive(Debug, Default)]
pub struct ImportReport {
    pub created: Vec<String>,
    pub updated: Vec<String>,
    pub skipped: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

impl ImportReport {
    /// Number of records written.
    pub fn written(&self) -> usize {
        self.created.len() + self.updated.len()
    }
}

/// Build a snapshot of every record in `store`.
///
/// In plain mode each record is decrypted; records that fail are logged
/// and reported in `skipped` instead of failing the export.
pub fn export_all(store: &VaultStore, key: &VaultKey, mode: ExportMode) -> Result<Export> {
    let mut snapshot = Snapshot::new();
    let mut skipped = Vec::new();

    for listed in store.list()? {
        let name = listed.name.to_string();
        let envelope = listed.envelope;

        let entry = match mode {
            ExportMode::Encrypted => SnapshotEntry::Encrypted(EncryptedEntry::from(envelope)),
            ExportMode::Plain => match SecretPayload::open(&envelope.encrypted_data, key) {
                Ok(payload) => SnapshotEntry::Plain(PlainEntry {
                    password: payload.password.clone(),
                    notes: payload.notes.clone(),
                    metadata: envelope.metadata,
                    created_at: envelope.created_at,
                    updated_at: envelope.updated_at,
                }),
                Err(e) => {
                    warn!(secret = %name, error = %e, "skipping secret during export");
                    skipped.push(name);
                    continue;
                }
            },
        };
        snapshot.insert(name, entry);
    }

    info!(count = snapshot.len(), skipped = skipped.len(), "exported vault");
    Ok(Export { snapshot, skipped })
}

/// Read a snapshot file and import it.
///
/// Failing to read or parse the file is the only error; everything after
/// that is reported per entry.
pub fn import_file(
    store: &VaultStore,
    path: &Path,
    key: &VaultKey,
    tie_break: TieBreak,
) -> Result<ImportReport> {
    let snapshot = snapshot::read_snapshot(path)?;
    Ok(import_all(store, &snapshot, key, tie_break))
}

/// Merge `snapshot` into `store` using last-write-wins on `updatedAt`.
pub fn import_all(
    store: &VaultStore,
    snapshot: &Snapshot,
    key: &VaultKey,
    tie_break: TieBreak,
) -> ImportReport {
    let mut report = ImportReport::default();

    for (name, entry) in snapshot.iter() {
        match import_entry(store, name, entry, key, tie_break) {
            Ok(Outcome::Created) => report.created.push(name.clone()),
            Ok(Outcome::Updated) => report.updated.push(name.clone()),
            Ok(Outcome::Skipped) => report.skipped.push(name.clone()),
            Err(e) => {
                warn!(secret = %name, error = %e, "failed to import secret");
                report.failed.push(ImportFailure {
                    name: name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    info!(
        created = report.created.len(),
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "import finished"
    );
    report
}

enum Outcome {
    Created,
    Updated,
    Skipped,
}

fn import_entry(
    store: &VaultStore,
    name: &str,
    entry: &SnapshotEntry,
    key: &VaultKey,
    tie_break: TieBreak,
) -> Result<Outcome> {
    let name = RecordName::parse(name)?;

    if !timestamps_ordered(entry.created_at(), entry.updated_at()) {
        return Err(PocketVaultError::InvalidSnapshot(format!(
            "entry '{name}' has createdAt after updatedAt"
        )));
    }

    let outcome = match store.read_envelope(&name)? {
        None => Outcome::Created,
        Some(local) => {
            let incoming = entry.updated_at();
            if incoming > local.updated_at {
                Outcome::Updated
            } else if incoming == local.updated_at && tie_break == TieBreak::TakeIncoming {
                Outcome::Updated
            } else {
                debug!(secret = %name, "local record is as new or newer, keeping it");
                return Ok(Outcome::Skipped);
            }
        }
    };

    let encrypted_data = match entry {
        SnapshotEntry::Plain(plain) => plain.payload().seal(key)?,
        SnapshotEntry::Encrypted(enc) => {
            // Refuse ciphertext this vault could never open again.
            SecretPayload::open(&enc.encrypted_data, key)?;
            enc.encrypted_data.clone()
        }
    };

    let envelope = RecordEnvelope {
        encrypted_data,
        name: Some(name.to_string()),
        metadata: entry.metadata().to_string(),
        created_at: entry.created_at(),
        updated_at: entry.updated_at(),
    };
    store.write_envelope(&name, &envelope)?;
    Ok(outcome)
}
