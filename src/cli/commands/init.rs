//! `pocketvault init` — create (or restore) the vault key.

use std::fs;

use crate::cli::output;
use crate::cli::{read_secret, Cli, Context};
use crate::crypto::VaultKey;
use crate::errors::{PocketVaultError, Result};

/// Execute the `init` command.
pub fn execute(cli: &Cli, username: Option<&str>, restore: bool) -> Result<()> {
    let mut ctx = Context::load(cli)?;

    // 1. Refuse to replace an existing key: every record depends on it.
    if ctx.state.has_vault_key() {
        output::tip("Use `pocketvault auth reset` first if you really want a new key.");
        return Err(PocketVaultError::CommandFailed(format!(
            "vault already initialized in {}",
            ctx.home.display()
        )));
    }

    // 2. Create the home and vault directories.
    let vault_dir = ctx.store.root().to_path_buf();
    if !vault_dir.exists() {
        fs::create_dir_all(&vault_dir)?;
        output::info(&format!("Created vault directory: {}", vault_dir.display()));
    }

    // 3. Generate a fresh key or take the one from another device.
    let key = if restore {
        let identity = read_secret("vault key", None)?;
        VaultKey::parse(&identity)?
    } else {
        VaultKey::generate()
    };
    ctx.state.set_vault_key(key)?;

    if let Some(name) = username {
        ctx.state.set_username(name)?;
    }
    ctx.state.set_logged_in(true)?;
    ctx.state.set_setup_complete(true)?;

    if restore {
        output::success("Vault key restored.");
    } else {
        output::success(&format!("Vault created at {}", vault_dir.display()));
        output::warning("Losing the vault key means losing every secret.");
        output::tip("Run `pocketvault auth show-key` and store the key somewhere safe.");
    }
    output::tip("Run `pocketvault add <NAME>` to add a secret.");
    output::tip("Run `pocketvault auth passcode` to require a passcode.");

    Ok(())
}
