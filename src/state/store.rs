//! Key-value stores for application state.
//!
//! `AppState` persists through the `KeyValueStore` trait so it does not
//! care where values live:
//! - `FileKeyStore`: a JSON map in `<home>/state.json`, owner-only on Unix
//! - `MemoryKeyStore`: in-process map, for tests and dry runs
//! - `KeyringStore`: the OS credential store (feature `keyring-store`)
//! - `SplitStore`: secrets in one store, flags in another

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::errors::{PocketVaultError, Result};

/// String-keyed secure storage.
pub trait KeyValueStore {
    /// Returns `None` if no value is stored (rather than an error).
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deleting a missing key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        (**self).delete(key)
    }
}

/// JSON-file backed store.
///
/// Every `set`/`delete` rewrites the file through a temp file + rename.
pub struct FileKeyStore {
    path: PathBuf,
}

impl FileKeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            PocketVaultError::KeyStore(format!("failed to parse {}: {e}", self.path.display()))
        })
    }

    fn persist(&self, map: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| PocketVaultError::SerializationError(format!("key store: {e}")))?;

        let parent = self.path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)?;
        let tmp_path = parent.join(format!(
            ".{}.tmp",
            self.path.file_name().unwrap_or_default().to_string_lossy()
        ));

        #[cfg(unix)]
        {
            use std::io::Write;
            use std::os::unix::fs::OpenOptionsExt;
            let mut file = fs::OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .mode(0o600)
                .open(&tmp_path)?;
            file.write_all(json.as_bytes())?;
        }

        #[cfg(not(unix))]
        fs::write(&tmp_path, json)?;

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.persist(&map)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.persist(&map)?;
        }
        Ok(())
    }
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryKeyStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| PocketVaultError::KeyStore("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryKeyStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Sends the keys in `secret_keys` to `secure` and everything else to
/// `plain`.
pub struct SplitStore<P, S> {
    plain: P,
    secure: S,
    secret_keys: &'static [&'static str],
}

impl<P: KeyValueStore, S: KeyValueStore> SplitStore<P, S> {
    pub fn new(plain: P, secure: S, secret_keys: &'static [&'static str]) -> Self {
        Self {
            plain,
            secure,
            secret_keys,
        }
    }

    fn route(&self, key: &str) -> &dyn KeyValueStore {
        if self.secret_keys.iter().any(|k| *k == key) {
            &self.secure
        } else {
            &self.plain
        }
    }
}

impl<P: KeyValueStore, S: KeyValueStore> KeyValueStore for SplitStore<P, S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.route(key).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.route(key).set(key, value)
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.route(key).delete(key)
    }
}

/// Copy each of `keys` from `from` into `to`, then delete it from `from`.
///
/// Returns how many values were moved.
pub fn move_keys(from: &dyn KeyValueStore, to: &dyn KeyValueStore, keys: &[&str]) -> Result<usize> {
    let mut moved = 0;
    for key in keys {
        if let Some(value) = from.get(key)? {
            to.set(key, &value)?;
            from.delete(key)?;
            moved += 1;
        }
    }
    Ok(moved)
}

/// OS keyring backed store:
/// - macOS: Keychain
/// - Windows: Credential Manager
/// - Linux: Secret Service (GNOME Keyring / KDE Wallet)
#[cfg(feature = "keyring-store")]
pub struct KeyringStore {
    service: String,
}

#[cfg(feature = "keyring-store")]
impl KeyringStore {
    /// Service name used in the OS keyring.
    pub const DEFAULT_SERVICE: &'static str = "pocketvault";

    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<keyring::Entry> {
        keyring::Entry::new(&self.service, key).map_err(|e| {
            PocketVaultError::KeyStore(format!("failed to create keyring entry: {e}"))
        })
    }
}

#[cfg(feature = "keyring-store")]
impl KeyValueStore for KeyringStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(PocketVaultError::KeyStore(format!(
                "failed to read from keyring: {e}"
            ))),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?.set_password(value).map_err(|e| {
            PocketVaultError::KeyStore(format!("failed to store value in keyring: {e}"))
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(PocketVaultError::KeyStore(format!(
                "failed to delete from keyring: {e}"
            ))),
        }
    }
}
