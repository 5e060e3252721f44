//! CLI module — Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};

use clap::Parser;
use zeroize::Zeroizing;

use crate::config::Settings;
use crate::crypto::VaultKey;
use crate::errors::{PocketVaultError, Result};
use crate::state::{AppState, FileKeyStore, KeyValueStore};
use crate::sync::GitSync;
use crate::vault::VaultStore;

/// Minimum passcode length.
const MIN_PASSCODE_LEN: usize = 4;

/// Environment variable checked before prompting for the passcode.
pub const PASSCODE_ENV: &str = "POCKETVAULT_PASSCODE";

/// PocketVault CLI: encrypted personal secrets vault.
#[derive(Parser)]
#[command(
    name = "pocketvault",
    about = "Encrypted personal secrets vault with Git sync",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Home directory holding config.toml, state.json and the vault
    #[arg(
        long,
        env = "POCKETVAULT_HOME",
        default_value = ".pocketvault",
        global = true
    )]
    pub home: PathBuf,

    /// Print debug logs to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Create the vault key and set up the home directory
    Init {
        /// Display name stored with the local state
        #[arg(long)]
        username: Option<String>,

        /// Restore an existing vault key instead of generating one
        #[arg(long)]
        restore: bool,
    },

    /// Add a secret
    Add {
        /// Secret name (e.g. work/email)
        name: String,
        /// Password (omit for interactive prompt or piped stdin)
        password: Option<String>,
        /// Free-text description shown in `list`
        #[arg(short, long, default_value = "")]
        metadata: String,
        /// Notes stored encrypted alongside the password
        #[arg(short, long)]
        notes: Option<String>,
        /// Generate a random password instead of reading one
        #[arg(short, long, conflicts_with = "password")]
        generate: bool,
        /// Replace an existing secret with the same name
        #[arg(short, long)]
        force: bool,
    },

    /// Change an existing secret
    Edit {
        /// Secret name
        name: String,
        /// New metadata
        #[arg(short, long)]
        metadata: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
        /// Read a new password (prompt or piped stdin)
        #[arg(short, long)]
        password: bool,
        /// Replace the password with a generated one
        #[arg(short, long, conflicts_with = "password")]
        generate: bool,
    },

    /// Print a secret's password
    Get {
        /// Secret name
        name: String,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
        /// Print the notes as well
        #[arg(short, long)]
        notes: bool,
    },

    /// List secrets, optionally filtered by name or metadata
    List {
        /// Case-insensitive search text
        query: Option<String>,
    },

    /// Delete a secret
    Delete {
        /// Secret name
        name: String,
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Export every secret to a JSON snapshot
    Export {
        /// Snapshot shape: plain (decrypted) or encrypted
        #[arg(short, long, default_value = "plain")]
        mode: String,

        /// Output file path (prints to stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Merge a JSON snapshot into the vault (newest updatedAt wins)
    Import {
        /// Path to the snapshot file
        file: PathBuf,

        /// On equal timestamps, replace the local secret
        #[arg(long)]
        take_incoming: bool,
    },

    /// Generate a random password
    Generate {
        /// Password length (default from config)
        #[arg(short, long)]
        length: Option<usize>,
        /// Copy to the clipboard instead of printing
        #[arg(short, long)]
        copy: bool,
    },

    /// Git sync for the vault directory
    Sync {
        #[command(subcommand)]
        action: SyncAction,
    },

    /// Passcode, key and credential management
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Sync subcommands.
#[derive(clap::Subcommand)]
pub enum SyncAction {
    /// Clone a remote into an empty vault directory and enable sync
    Clone {
        /// Remote URL
        url: String,
        /// Personal access token (sent as the HTTP username)
        #[arg(long, env = "POCKETVAULT_GIT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Turn the existing vault directory into a repository
    Init {
        /// Remote URL to use as `origin`
        #[arg(long)]
        remote: Option<String>,
        /// Personal access token (sent as the HTTP username)
        #[arg(long, env = "POCKETVAULT_GIT_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },

    /// Fetch and merge from the remote
    Pull,

    /// Commit pending changes and push
    Push,

    /// Show changed files and sync settings
    Status,

    /// Commit and push automatically after every change
    Enable,

    /// Stop committing and pushing automatically
    Disable,
}

/// Auth subcommands.
#[derive(clap::Subcommand)]
pub enum AuthAction {
    /// Show what is configured
    Status,

    /// Set or clear the passcode
    Passcode {
        /// Remove the passcode instead of setting one
        #[arg(long)]
        clear: bool,
    },

    /// Print the vault key for backup
    ShowKey,

    /// Move secret state into the OS keyring
    Keyring {
        /// Move it back out of the keyring instead
        #[arg(long)]
        delete: bool,
    },

    /// Forget the vault key, credentials and settings (records stay on disk)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Everything a command needs: settings, state and the vault.
pub struct Context {
    pub home: PathBuf,
    pub settings: Settings,
    pub state: AppState<Box<dyn KeyValueStore>>,
    pub store: VaultStore,
}

impl Context {
    /// Load settings and state from the home directory.
    pub fn load(cli: &Cli) -> Result<Self> {
        let home = cli.home.clone();
        let settings = Settings::load(&home)?;
        let state = AppState::load(open_key_store(&settings, &home)?)?;
        let store = VaultStore::new(settings.vault_path(&home));
        Ok(Self {
            home,
            settings,
            state,
            store,
        })
    }

    /// The vault key, after checking the passcode if one is set.
    pub fn unlock(&self) -> Result<&VaultKey> {
        let key = self.state.vault_key()?;
        if self.state.passcode_enabled() {
            let passcode = read_passcode("Enter passcode")?;
            if !self.state.verify_passcode(&passcode)? {
                return Err(PocketVaultError::IncorrectPasscode);
            }
        }
        Ok(key)
    }

    /// Sync adapter for the vault directory.
    pub fn sync(&self) -> GitSync {
        GitSync::new(
            self.store.root(),
            self.settings.sync_settings(),
            self.state.git_token(),
        )
    }

    /// Commit and push after a local change when sync is enabled.
    ///
    /// A sync failure is reported but does not fail the command: the local
    /// change is already on disk.
    pub fn sync_change(&self, message: &str) {
        match self
            .sync()
            .commit_and_push(message, self.state.git_sync_enabled())
        {
            Ok(true) => output::info("Changes pushed to remote."),
            Ok(false) => {}
            Err(e) => output::warning(&format!("Sync failed: {e}")),
        }
    }
}

/// Open the key-value store selected by `use_keyring`.
pub fn open_key_store(settings: &Settings, home: &Path) -> Result<Box<dyn KeyValueStore>> {
    let file = FileKeyStore::new(settings.state_path(home));
    if settings.use_keyring {
        keyring_backed(file)
    } else {
        Ok(Box::new(file))
    }
}

#[cfg(feature = "keyring-store")]
fn keyring_backed(file: FileKeyStore) -> Result<Box<dyn KeyValueStore>> {
    use crate::state::{keys, KeyringStore, SplitStore};
    Ok(Box::new(SplitStore::new(
        file,
        KeyringStore::new(KeyringStore::DEFAULT_SERVICE),
        keys::SECRET,
    )))
}

#[cfg(not(feature = "keyring-store"))]
fn keyring_backed(_file: FileKeyStore) -> Result<Box<dyn KeyValueStore>> {
    Err(PocketVaultError::ConfigError(
        "use_keyring is set but keyring support is not compiled — rebuild with `cargo build --features keyring-store`"
            .into(),
    ))
}

/// Get the passcode, trying in order:
/// 1. `POCKETVAULT_PASSCODE` env var (scripts)
/// 2. Interactive prompt
///
/// Returns `Zeroizing<String>` so the passcode is wiped from memory on drop.
pub fn read_passcode(prompt: &str) -> Result<Zeroizing<String>> {
    if let Ok(passcode) = std::env::var(PASSCODE_ENV) {
        if !passcode.is_empty() {
            return Ok(Zeroizing::new(passcode));
        }
    }

    let passcode = dialoguer::Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| PocketVaultError::CommandFailed(format!("passcode prompt: {e}")))?;
    Ok(Zeroizing::new(passcode))
}

/// Prompt for a new passcode with confirmation.
///
/// Also respects `POCKETVAULT_PASSCODE` for scripted usage.
/// Enforces a minimum length.
pub fn read_new_passcode() -> Result<Zeroizing<String>> {
    if let Ok(passcode) = std::env::var(PASSCODE_ENV) {
        if !passcode.is_empty() {
            if passcode.len() < MIN_PASSCODE_LEN {
                return Err(PocketVaultError::CommandFailed(format!(
                    "passcode must be at least {MIN_PASSCODE_LEN} characters"
                )));
            }
            return Ok(Zeroizing::new(passcode));
        }
    }

    loop {
        let passcode = dialoguer::Password::new()
            .with_prompt("Choose passcode")
            .with_confirmation("Confirm passcode", "Passcodes do not match, try again")
            .interact()
            .map_err(|e| PocketVaultError::CommandFailed(format!("passcode prompt: {e}")))?;

        if passcode.len() < MIN_PASSCODE_LEN {
            output::warning(&format!(
                "Passcode must be at least {MIN_PASSCODE_LEN} characters. Try again."
            ));
            continue;
        }

        return Ok(Zeroizing::new(passcode));
    }
}

/// Read a secret value from one of three sources:
/// 1. `inline`, a value given on the command line
/// 2. piped stdin (stdin is not a terminal)
/// 3. an interactive hidden prompt
pub fn read_secret(label: &str, inline: Option<&str>) -> Result<Zeroizing<String>> {
    if let Some(v) = inline {
        output::warning("Value provided on command line — it may appear in shell history.");
        return Ok(Zeroizing::new(v.to_string()));
    }

    if !io::stdin().is_terminal() {
        let mut buf = Zeroizing::new(String::new());
        io::stdin().read_to_string(&mut buf)?;
        let trimmed = buf.trim_end_matches(['\r', '\n']).to_string();
        return Ok(Zeroizing::new(trimmed));
    }

    let value = dialoguer::Password::new()
        .with_prompt(format!("Enter {label}"))
        .allow_empty_password(true)
        .interact()
        .map_err(|e| PocketVaultError::CommandFailed(format!("input prompt: {e}")))?;
    Ok(Zeroizing::new(value))
}

/// Ask a yes/no question, defaulting to no.
pub fn confirm(prompt: &str) -> Result<bool> {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(|e| PocketVaultError::CommandFailed(format!("confirm prompt: {e}")))
}

/// Put `text` on the system clipboard.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let mut clipboard =
        arboard::Clipboard::new().map_err(|e| PocketVaultError::Clipboard(e.to_string()))?;
    clipboard
        .set_text(text.to_string())
        .map_err(|e| PocketVaultError::Clipboard(e.to_string()))
}
