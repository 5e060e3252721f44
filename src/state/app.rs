//! Application state: setup flags, the unlocked vault key and sync
//! credentials.
//!
//! State is loaded once from a `KeyValueStore` and passed explicitly to
//! whatever needs it.  Every setter writes through to the store first and
//! only updates the in-memory copy once the write succeeded.

use zeroize::Zeroizing;

use super::store::KeyValueStore;
use crate::crypto::{self, Argon2Params, VaultKey};
use crate::errors::{PocketVaultError, Result};

/// Fixed key names in the store.
pub mod keys {
    pub const SETUP_COMPLETE: &str = "setupComplete";
    pub const PASSCODE_ENABLED: &str = "passcodeEnabled";
    pub const PASSCODE_HASH: &str = "passcodeHash";
    pub const BIOMETRIC_ENABLED: &str = "biometricEnabled";
    pub const GIT_SYNC_ENABLED: &str = "gitSyncEnabled";
    pub const LOGGED_IN: &str = "isLoggedIn";
    pub const USERNAME: &str = "username";
    pub const VAULT_KEY: &str = "ageSecretKey";
    pub const GIT_TOKEN: &str = "github_pat";
    pub const GIT_REPO_URL: &str = "gitRepoUrl";

    /// Keys holding secret material; these go to the OS keyring when
    /// `use_keyring` is set.
    pub const SECRET: &[&str] = &[VAULT_KEY, GIT_TOKEN, PASSCODE_HASH];

    /// Every key `AppState::reset` clears.
    pub const ALL: &[&str] = &[
        SETUP_COMPLETE,
        PASSCODE_ENABLED,
        PASSCODE_HASH,
        BIOMETRIC_ENABLED,
        GIT_SYNC_ENABLED,
        LOGGED_IN,
        USERNAME,
        VAULT_KEY,
        GIT_TOKEN,
        GIT_REPO_URL,
    ];
}

/// Explicit replacement for a process-wide auth context.
pub struct AppState<S: KeyValueStore> {
    store: S,
    setup_complete: bool,
    passcode_enabled: bool,
    biometric_enabled: bool,
    git_sync_enabled: bool,
    logged_in: bool,
    username: String,
    vault_key: Option<VaultKey>,
    git_token: Option<Zeroizing<String>>,
    git_repo_url: Option<String>,
}

impl<S: KeyValueStore> AppState<S> {
    /// Load every field from `store`.  Missing keys fall back to
    /// false / empty.
    pub fn load(store: S) -> Result<Self> {
        let flag = |key: &str| -> Result<bool> { Ok(store.get(key)?.as_deref() == Some("true")) };

        let vault_key = match store.get(keys::VAULT_KEY)? {
            Some(identity) if !identity.is_empty() => {
                let identity = Zeroizing::new(identity);
                Some(VaultKey::parse(&identity)?)
            }
            _ => None,
        };

        Ok(Self {
            setup_complete: flag(keys::SETUP_COMPLETE)?,
            passcode_enabled: flag(keys::PASSCODE_ENABLED)?,
            biometric_enabled: flag(keys::BIOMETRIC_ENABLED)?,
            git_sync_enabled: flag(keys::GIT_SYNC_ENABLED)?,
            logged_in: flag(keys::LOGGED_IN)?,
            username: store.get(keys::USERNAME)?.unwrap_or_default(),
            vault_key,
            git_token: store
                .get(keys::GIT_TOKEN)?
                .filter(|t| !t.is_empty())
                .map(Zeroizing::new),
            git_repo_url: store.get(keys::GIT_REPO_URL)?.filter(|u| !u.is_empty()),
            store,
        })
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn setup_complete(&self) -> bool {
        self.setup_complete
    }

    pub fn passcode_enabled(&self) -> bool {
        self.passcode_enabled
    }

    pub fn biometric_enabled(&self) -> bool {
        self.biometric_enabled
    }

    pub fn git_sync_enabled(&self) -> bool {
        self.git_sync_enabled
    }

    pub fn logged_in(&self) -> bool {
        self.logged_in
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// The unlocked vault key, or `NotInitialized` before `init`.
    pub fn vault_key(&self) -> Result<&VaultKey> {
        self.vault_key.as_ref().ok_or(PocketVaultError::NotInitialized)
    }

    pub fn has_vault_key(&self) -> bool {
        self.vault_key.is_some()
    }

    pub fn git_token(&self) -> Option<&str> {
        self.git_token.as_ref().map(|t| t.as_str())
    }

    pub fn git_repo_url(&self) -> Option<&str> {
        self.git_repo_url.as_deref()
    }

    // ------------------------------------------------------------------
    // Setters (write-through)
    // ------------------------------------------------------------------

    pub fn set_setup_complete(&mut self, value: bool) -> Result<()> {
        self.store.set(keys::SETUP_COMPLETE, bool_str(value))?;
        self.setup_complete = value;
        Ok(())
    }

    pub fn set_passcode_enabled(&mut self, value: bool) -> Result<()> {
        self.store.set(keys::PASSCODE_ENABLED, bool_str(value))?;
        self.passcode_enabled = value;
        Ok(())
    }

    pub fn set_biometric_enabled(&mut self, value: bool) -> Result<()> {
        self.store.set(keys::BIOMETRIC_ENABLED, bool_str(value))?;
        self.biometric_enabled = value;
        Ok(())
    }

    pub fn set_git_sync_enabled(&mut self, value: bool) -> Result<()> {
        self.store.set(keys::GIT_SYNC_ENABLED, bool_str(value))?;
        self.git_sync_enabled = value;
        Ok(())
    }

    pub fn set_logged_in(&mut self, value: bool) -> Result<()> {
        self.store.set(keys::LOGGED_IN, bool_str(value))?;
        self.logged_in = value;
        Ok(())
    }

    pub fn set_username(&mut self, value: &str) -> Result<()> {
        self.store.set(keys::USERNAME, value)?;
        self.username = value.to_string();
        Ok(())
    }

    pub fn set_vault_key(&mut self, key: VaultKey) -> Result<()> {
        self.store.set(keys::VAULT_KEY, &key.to_identity_string())?;
        self.vault_key = Some(key);
        Ok(())
    }

    /// Store the remote URL and, optionally, a personal access token.
    /// Passing `None` for the token removes a previously stored one.
    pub fn set_git_credentials(&mut self, repo_url: &str, token: Option<&str>) -> Result<()> {
        self.store.set(keys::GIT_REPO_URL, repo_url)?;
        self.git_repo_url = Some(repo_url.to_string());
        self.set_git_token(token)
    }

    /// Store or remove the personal access token alone.
    pub fn set_git_token(&mut self, token: Option<&str>) -> Result<()> {
        match token.filter(|t| !t.is_empty()) {
            Some(t) => {
                self.store.set(keys::GIT_TOKEN, t)?;
                self.git_token = Some(Zeroizing::new(t.to_string()));
            }
            None => {
                self.store.delete(keys::GIT_TOKEN)?;
                self.git_token = None;
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Passcode
    // ------------------------------------------------------------------

    /// Hash and store a new passcode, enabling passcode protection.
    pub fn set_passcode(&mut self, passcode: &str, params: &Argon2Params) -> Result<()> {
        let hash = crypto::hash_passcode(passcode, params)?;
        self.store.set(keys::PASSCODE_HASH, &hash)?;
        self.set_passcode_enabled(true)
    }

    /// Check `passcode` against the stored hash, using the Argon2 params
    /// recorded in the hash rather than the current settings.
    ///
    /// Returns `false` when no passcode has been set.
    pub fn verify_passcode(&self, passcode: &str) -> Result<bool> {
        match self.store.get(keys::PASSCODE_HASH)? {
            Some(stored) => crypto::verify_passcode(passcode, &stored),
            None => Ok(false),
        }
    }

    pub fn clear_passcode(&mut self) -> Result<()> {
        self.store.delete(keys::PASSCODE_HASH)?;
        self.set_passcode_enabled(false)
    }

    /// Forget everything: flags, key, credentials.
    pub fn reset(&mut self) -> Result<()> {
        for key in keys::ALL {
            self.store.delete(key)?;
        }
        self.setup_complete = false;
        self.passcode_enabled = false;
        self.biometric_enabled = false;
        self.git_sync_enabled = false;
        self.logged_in = false;
        self.username.clear();
        self.vault_key = None;
        self.git_token = None;
        self.git_repo_url = None;
        Ok(())
    }
}

fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryKeyStore;
    use std::sync::Arc;

    /// Lets a test keep a handle on the store it passed into `AppState`.
    struct Shared(Arc<MemoryKeyStore>);

    impl KeyValueStore for Shared {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.0.set(key, value)
        }
        fn delete(&self, key: &str) -> Result<()> {
            self.0.delete(key)
        }
    }

    fn fast() -> Argon2Params {
        Argon2Params {
            memory_kib: 8_192,
            iterations: 1,
            parallelism: 1,
        }
    }

    #[test]
    fn fresh_state_is_empty() {
        let state = AppState::load(MemoryKeyStore::new()).unwrap();
        assert!(!state.setup_complete());
        assert!(!state.git_sync_enabled());
        assert!(matches!(state.vault_key(), Err(PocketVaultError::NotInitialized)));
        assert_eq!(state.username(), "");
    }

    #[test]
    fn setters_persist_through_reload() {
        let backing = Arc::new(MemoryKeyStore::new());
        let key = VaultKey::generate();
        {
            let mut state = AppState::load(Shared(backing.clone())).unwrap();
            state.set_setup_complete(true).unwrap();
            state.set_git_sync_enabled(true).unwrap();
            state.set_username("ada").unwrap();
            state.set_vault_key(key.clone()).unwrap();
            state
                .set_git_credentials("https://example.com/vault.git", Some("tok"))
                .unwrap();
        }

        let state = AppState::load(Shared(backing)).unwrap();
        assert!(state.setup_complete());
        assert!(state.git_sync_enabled());
        assert_eq!(state.username(), "ada");
        assert_eq!(state.vault_key().unwrap(), &key);
        assert_eq!(state.git_token(), Some("tok"));
        assert_eq!(state.git_repo_url(), Some("https://example.com/vault.git"));
    }

    #[test]
    fn token_can_be_stored_without_remote() {
        let backing = Arc::new(MemoryKeyStore::new());
        {
            let mut state = AppState::load(Shared(backing.clone())).unwrap();
            state.set_git_token(Some("tok")).unwrap();
            assert_eq!(state.git_token(), Some("tok"));
            assert_eq!(state.git_repo_url(), None);
        }

        let mut state = AppState::load(Shared(backing.clone())).unwrap();
        assert_eq!(state.git_token(), Some("tok"));

        state.set_git_token(None).unwrap();
        assert_eq!(state.git_token(), None);
        assert_eq!(backing.get(keys::GIT_TOKEN).unwrap(), None);
    }

    #[test]
    fn passcode_lifecycle() {
        let mut state = AppState::load(MemoryKeyStore::new()).unwrap();
        assert!(!state.verify_passcode("1234").unwrap());

        state.set_passcode("1234", &fast()).unwrap();
        assert!(state.passcode_enabled());
        assert!(state.verify_passcode("1234").unwrap());
        assert!(!state.verify_passcode("4321").unwrap());

        state.clear_passcode().unwrap();
        assert!(!state.passcode_enabled());
        assert!(!state.verify_passcode("1234").unwrap());
    }

    #[test]
    fn passcode_survives_argon2_settings_change() {
        let backing = Arc::new(MemoryKeyStore::new());
        {
            let mut state = AppState::load(Shared(backing.clone())).unwrap();
            state.set_passcode("1234", &fast()).unwrap();
        }

        // config.toml now asks for stronger params; the stored hash still
        // verifies and new hashes pick up the new cost.
        let stronger = Argon2Params {
            memory_kib: 16_384,
            iterations: 2,
            parallelism: 1,
        };
        let mut state = AppState::load(Shared(backing.clone())).unwrap();
        assert!(state.verify_passcode("1234").unwrap());
        assert!(!state.verify_passcode("0000").unwrap());

        state.set_passcode("5678", &stronger).unwrap();
        let stored = backing.get(keys::PASSCODE_HASH).unwrap().unwrap();
        assert!(stored.contains("m=16384,t=2,p=1"), "unexpected hash: {stored}");
        assert!(state.verify_passcode("5678").unwrap());
    }

    #[test]
    fn reset_clears_store_and_memory() {
        let backing = Arc::new(MemoryKeyStore::new());
        let mut state = AppState::load(Shared(backing.clone())).unwrap();
        state.set_vault_key(VaultKey::generate()).unwrap();
        state.set_biometric_enabled(true).unwrap();
        state.reset().unwrap();

        assert!(!state.has_vault_key());
        assert!(!state.biometric_enabled());
        assert_eq!(backing.get(keys::VAULT_KEY).unwrap(), None);
    }

    #[test]
    fn corrupt_stored_key_is_an_error() {
        let store = MemoryKeyStore::new();
        store.set(keys::VAULT_KEY, "garbage").unwrap();
        assert!(AppState::load(store).is_err());
    }
}
