use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{PocketVaultError, Result};
use crate::vault::TieBreak;

/// Per-home configuration, loaded from `<home>/config.toml`.
///
/// Every field has a default so PocketVault works without any config
/// file at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory (relative to the home) holding the record files.
    #[serde(default = "default_vault_dir")]
    pub vault_dir: String,

    /// History depth for `sync clone`.
    #[serde(default = "default_clone_depth")]
    pub clone_depth: u32,

    /// Author identity on sync commits.
    #[serde(default = "default_git_author_name")]
    pub git_author_name: String,

    #[serde(default = "default_git_author_email")]
    pub git_author_email: String,

    /// What import does when both sides carry the same `updatedAt`.
    #[serde(default)]
    pub import_tie_break: TieBreak,

    /// Length of passwords produced by `generate` and `add --generate`.
    #[serde(default = "default_password_length")]
    pub password_length: usize,

    /// Keep the vault key, token and passcode hash in the OS keyring
    /// instead of `state.json` (needs the `keyring-store` feature).
    #[serde(default)]
    pub use_keyring: bool,

    /// Argon2 memory cost in KiB for passcode hashing (default: 19 MiB).
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,

    /// Argon2 iteration count (default: 2).
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,

    /// Argon2 parallelism degree (default: 1).
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

// ── Serde default helpers ────────────────────────────────────────────

fn default_vault_dir() -> String {
    "vault".to_string()
}

fn default_clone_depth() -> u32 {
    10
}

fn default_git_author_name() -> String {
    "PocketVault".to_string()
}

fn default_git_author_email() -> String {
    "pocketvault@localhost".to_string()
}

fn default_password_length() -> usize {
    20
}

fn default_argon2_memory_kib() -> u32 {
    19_456
}

fn default_argon2_iterations() -> u32 {
    2
}

fn default_argon2_parallelism() -> u32 {
    1
}

// ── Implementation ───────────────────────────────────────────────────

impl Default for Settings {
    fn default() -> Self {
        Self {
            vault_dir: default_vault_dir(),
            clone_depth: default_clone_depth(),
            git_author_name: default_git_author_name(),
            git_author_email: default_git_author_email(),
            import_tie_break: TieBreak::default(),
            password_length: default_password_length(),
            use_keyring: false,
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

impl Settings {
    /// Name of the config file inside the home directory.
    pub const FILE_NAME: &'static str = "config.toml";

    /// Name of the key-value state file inside the home directory.
    pub const STATE_FILE_NAME: &'static str = "state.json";

    /// Load settings from `<home>/config.toml`.
    ///
    /// If the file does not exist, defaults are returned.
    /// If the file exists but cannot be parsed, an error is returned.
    pub fn load(home: &Path) -> Result<Self> {
        let config_path = home.join(Self::FILE_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(&config_path)?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| {
            PocketVaultError::ConfigError(format!("Failed to parse {}: {e}", config_path.display()))
        })?;

        if settings.clone_depth == 0 {
            return Err(PocketVaultError::ConfigError(
                "clone_depth must be at least 1".into(),
            ));
        }

        Ok(settings)
    }

    /// Directory holding the record files.
    ///
    /// Example: `<home>/vault`
    pub fn vault_path(&self, home: &Path) -> PathBuf {
        home.join(&self.vault_dir)
    }

    /// Path of the file-backed key-value store.
    pub fn state_path(&self, home: &Path) -> PathBuf {
        home.join(Self::STATE_FILE_NAME)
    }

    /// Convert the Argon2 settings into crypto-layer params.
    pub fn argon2_params(&self) -> crate::crypto::kdf::Argon2Params {
        crate::crypto::kdf::Argon2Params {
            memory_kib: self.argon2_memory_kib,
            iterations: self.argon2_iterations,
            parallelism: self.argon2_parallelism,
        }
    }

    /// Settings for the sync adapter.
    pub fn sync_settings(&self) -> crate::sync::SyncSettings {
        crate::sync::SyncSettings {
            clone_depth: self.clone_depth,
            author_name: self.git_author_name.clone(),
            author_email: self.git_author_email.clone(),
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings_are_sensible() {
        let s = Settings::default();
        assert_eq!(s.vault_dir, "vault");
        assert_eq!(s.clone_depth, 10);
        assert_eq!(s.import_tie_break, TieBreak::KeepLocal);
        assert_eq!(s.password_length, 20);
        assert!(!s.use_keyring);
        assert_eq!(s.argon2_memory_kib, 19_456);
    }

    #[test]
    fn load_returns_defaults_when_no_config_file() {
        let tmp = TempDir::new().unwrap();
        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "vault");
    }

    #[test]
    fn load_parses_toml_file() {
        let tmp = TempDir::new().unwrap();
        let config = r#"
vault_dir = "secrets"
clone_depth = 3
git_author_name = "Ada"
import_tie_break = "take-incoming"
password_length = 32
"#;
        fs::write(tmp.path().join("config.toml"), config).unwrap();

        let settings = Settings::load(tmp.path()).unwrap();
        assert_eq!(settings.vault_dir, "secrets");
        assert_eq!(settings.clone_depth, 3);
        assert_eq!(settings.git_author_name, "Ada");
        assert_eq!(settings.import_tie_break, TieBreak::TakeIncoming);
        assert_eq!(settings.password_length, 32);
        // Rest should be defaults
        assert_eq!(settings.git_author_email, "pocketvault@localhost");
        assert_eq!(settings.argon2_iterations, 2);
    }

    #[test]
    fn load_errors_on_invalid_toml() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "not valid {{toml").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn load_rejects_unknown_tie_break_and_zero_depth() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("config.toml"), "import_tie_break = \"coin-flip\"\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());

        fs::write(tmp.path().join("config.toml"), "clone_depth = 0\n").unwrap();
        assert!(Settings::load(tmp.path()).is_err());
    }

    #[test]
    fn paths_respect_home_and_vault_dir() {
        let s = Settings {
            vault_dir: "secrets".to_string(),
            ..Settings::default()
        };
        let home = Path::new("/home/user/.pocketvault");
        assert_eq!(
            s.vault_path(home),
            PathBuf::from("/home/user/.pocketvault/secrets")
        );
        assert_eq!(
            s.state_path(home),
            PathBuf::from("/home/user/.pocketvault/state.json")
        );
    }
}
