//! High-level vault operations used by CLI commands.
//!
//! `VaultStore` maps validated secret names to `<root>/<name>.jsop` files
//! and wraps the codec so the rest of the application works with calls
//! like `store.put("work/email", &payload, "work account", &key, mode)`.
//!
//! There is no index and no lock: the file system is the source of truth
//! and concurrent writers to the same name race, last rename wins.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::name::RecordName;
use super::record::{ListedRecord, Record, RecordEnvelope, SecretPayload};
use crate::crypto::VaultKey;
use crate::errors::{PocketVaultError, Result};

/// What `put` does when a record already exists under the name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Fail with `SecretAlreadyExists`.
    Create,
    /// Replace the existing record; timestamps start over.
    Overwrite,
}

/// Handle on a vault directory.
#[derive(Debug, Clone)]
pub struct VaultStore {
    root: PathBuf,
}

impl VaultStore {
    /// Open the vault rooted at `root`.  The directory is created lazily
    /// on the first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the vault root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    // ------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------

    /// Encrypt `payload` and write a new envelope for `name`.
    pub fn put(
        &self,
        name: &str,
        payload: &SecretPayload,
        metadata: &str,
        key: &VaultKey,
        mode: WriteMode,
    ) -> Result<RecordEnvelope> {
        let name = RecordName::parse(name)?;
        let path = name.file_path(&self.root);

        if mode == WriteMode::Create && path.exists() {
            return Err(PocketVaultError::SecretAlreadyExists(name.to_string()));
        }

        let now = Utc::now();
        let envelope = RecordEnvelope {
            encrypted_data: payload.seal(key)?,
            name: Some(name.to_string()),
            metadata: metadata.to_string(),
            created_at: now,
            updated_at: now,
        };

        self.write_envelope(&name, &envelope)?;
        debug!(secret = %name, ?mode, "saved secret");
        Ok(envelope)
    }

    /// Read and decrypt the record stored under `name`.
    ///
    /// Returns `Ok(None)` if there is no such record.
    pub fn get(&self, name: &str, key: &VaultKey) -> Result<Option<Record>> {
        let name = RecordName::parse(name)?;
        let Some(envelope) = self.read_envelope(&name)? else {
            return Ok(None);
        };

        let payload = SecretPayload::open(&envelope.encrypted_data, key)?;
        Ok(Some(Record {
            name,
            payload,
            envelope,
        }))
    }

    /// Replace the payload and metadata of an existing record.
    ///
    /// The original `createdAt` is kept.  The existing record must decrypt
    /// under `key`, so an edit cannot silently re-key a foreign record.
    pub fn edit(
        &self,
        name: &str,
        payload: &SecretPayload,
        metadata: &str,
        key: &VaultKey,
    ) -> Result<RecordEnvelope> {
        let existing = self
            .get(name, key)?
            .ok_or_else(|| PocketVaultError::SecretNotFound(name.to_string()))?;

        let created_at = existing.envelope.created_at;
        let envelope = RecordEnvelope {
            encrypted_data: payload.seal(key)?,
            name: Some(existing.name.to_string()),
            metadata: metadata.to_string(),
            created_at,
            updated_at: Utc::now().max(created_at),
        };

        self.write_envelope(&existing.name, &envelope)?;
        debug!(secret = %existing.name, "updated secret");
        Ok(envelope)
    }

    /// Remove the record stored under `name`.
    ///
    /// Returns whether a file was removed; a missing record is not an
    /// error.  Directories emptied by the removal are pruned up to the root.
    pub fn delete(&self, name: &str) -> Result<bool> {
        let name = RecordName::parse(name)?;
        let path = name.file_path(&self.root);

        match fs::remove_file(&path) {
            Ok(()) => {
                self.prune_empty_dirs(&path);
                debug!(secret = %name, "deleted secret");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(secret = %name, "delete: no such secret");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List every record in the vault, sorted by name.
    ///
    /// Names come from the file paths, not from the stored `name` field,
    /// so moved or renamed files show up under their new name.  Files that
    /// cannot be read or parsed are skipped with a warning.
    pub fn list(&self) -> Result<Vec<ListedRecord>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| entry.file_name() != ".git");

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable vault entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let Some(name) = RecordName::from_relative_path(relative) else {
                if relative.extension().is_some_and(|ext| ext == super::RECORD_EXTENSION) {
                    warn!(path = %relative.display(), "skipping record file with invalid name");
                }
                continue;
            };

            match read_envelope_file(entry.path()) {
                Ok(envelope) => records.push(ListedRecord { name, envelope }),
                Err(e) => warn!(path = %entry.path().display(), error = %e, "skipping unparseable record"),
            }
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    /// Records whose name or metadata contains `query` (case-insensitive).
    pub fn search(&self, query: &str) -> Result<Vec<ListedRecord>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|record| record.matches(query))
            .collect())
    }

    /// Returns `true` if a record file exists for `name`.
    pub fn contains(&self, name: &str) -> Result<bool> {
        let name = RecordName::parse(name)?;
        Ok(name.file_path(&self.root).is_file())
    }

    // ------------------------------------------------------------------
    // Envelope-level access (used by the reconciler)
    // ------------------------------------------------------------------

    /// Read the envelope for `name` without decrypting it.
    pub fn read_envelope(&self, name: &RecordName) -> Result<Option<RecordEnvelope>> {
        let path = name.file_path(&self.root);
        match read_envelope_file(&path) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(PocketVaultError::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Write `envelope` for `name` **atomically**.
    ///
    /// 1. Create intermediate directories.
    /// 2. Write pretty-printed JSON to a temp file in the same directory.
    /// 3. Rename the temp file over the target path.
    ///
    /// Record files are owner-only (0600) on Unix.
    pub fn write_envelope(&self, name: &RecordName, envelope: &RecordEnvelope) -> Result<()> {
        let path = name.file_path(&self.root);
        let parent = path.parent().unwrap_or(self.root.as_path());
        fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(envelope)
            .map_err(|e| PocketVaultError::SerializationError(format!("envelope: {e}")))?;

        let tmp_path = parent.join(format!(
            ".{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy()
        ));
        write_owner_only(&tmp_path, json.as_bytes())?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        Ok(())
    }

    /// Remove now-empty directories between `file` and the vault root.
    fn prune_empty_dirs(&self, file: &Path) {
        let mut dir = file.parent();
        while let Some(current) = dir {
            if current == self.root || !current.starts_with(&self.root) {
                break;
            }
            // `remove_dir` refuses non-empty directories, which ends the walk.
            if fs::remove_dir(current).is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

fn write_owner_only(path: &Path, bytes: &[u8]) -> Result<()> {
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)?;
        file.write_all(bytes)?;
    }

    #[cfg(not(unix))]
    fs::write(path, bytes)?;

    Ok(())
}

fn read_envelope_file(path: &Path) -> Result<RecordEnvelope> {
    let invalid = |reason: String| PocketVaultError::InvalidRecord {
        path: path.to_path_buf(),
        reason,
    };

    let content = fs::read_to_string(path)?;
    let envelope: RecordEnvelope =
        serde_json::from_str(&content).map_err(|e| invalid(e.to_string()))?;
    if !envelope.timestamps_valid() {
        return Err(invalid("createdAt is after updatedAt".into()));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn payload(password: &str) -> SecretPayload {
        SecretPayload::new(Some(password.to_string()), None)
    }

    #[test]
    fn put_creates_nested_file() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();

        store
            .put("work/email", &payload("abc"), "work account", &key, WriteMode::Create)
            .unwrap();

        let path = dir.path().join("work").join("email.jsop");
        assert!(path.is_file());
        let raw = fs::read_to_string(path).unwrap();
        assert!(raw.contains("encryptedData"));
        assert!(!raw.contains("\"abc\""));
    }

    #[test]
    fn create_mode_refuses_existing_name() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();

        store.put("a", &payload("1"), "", &key, WriteMode::Create).unwrap();
        let err = store
            .put("a", &payload("2"), "", &key, WriteMode::Create)
            .unwrap_err();
        assert!(matches!(err, PocketVaultError::SecretAlreadyExists(_)));

        store.put("a", &payload("2"), "", &key, WriteMode::Overwrite).unwrap();
        let record = store.get("a", &key).unwrap().unwrap();
        assert_eq!(record.payload.password.as_deref(), Some("2"));
    }

    #[test]
    fn no_temp_files_left_behind() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();
        store.put("x", &payload("1"), "", &key, WriteMode::Create).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["x.jsop".to_string()]);
    }

    #[test]
    fn delete_prunes_empty_namespaces() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();

        store.put("a/b/c", &payload("1"), "", &key, WriteMode::Create).unwrap();
        assert!(store.delete("a/b/c").unwrap());
        assert!(!dir.path().join("a").exists());
        assert!(dir.path().exists());
    }

    #[test]
    fn list_skips_git_dir_and_garbage() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();

        store.put("good", &payload("1"), "", &key, WriteMode::Create).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("hidden.jsop"), "{}").unwrap();
        fs::write(dir.path().join("broken.jsop"), "not json").unwrap();
        fs::write(dir.path().join("README.md"), "hello").unwrap();

        let names: Vec<_> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|r| r.name.to_string())
            .collect();
        assert_eq!(names, vec!["good"]);
    }

    #[cfg(unix)]
    #[test]
    fn record_files_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();

        store.put("a", &payload("x"), "", &key, WriteMode::Create).unwrap();
        store.edit("a", &payload("y"), "meta", &key).unwrap();

        let mode = fs::metadata(dir.path().join("a.jsop")).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn reversed_timestamps_make_a_record_invalid() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path());
        let key = VaultKey::generate();
        let mut envelope = store.put("a", &payload("x"), "", &key, WriteMode::Create).unwrap();
        store.put("b", &payload("y"), "", &key, WriteMode::Create).unwrap();

        envelope.created_at = envelope.updated_at + chrono::Duration::days(1);
        let name = RecordName::parse("a").unwrap();
        store.write_envelope(&name, &envelope).unwrap();

        assert!(matches!(store.get("a", &key), Err(PocketVaultError::InvalidRecord { .. })));
        let names: Vec<String> = store.list().unwrap().iter().map(|r| r.name.to_string()).collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn list_on_missing_root_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = VaultStore::new(dir.path().join("nope"));
        assert!(store.list().unwrap().is_empty());
    }
}
