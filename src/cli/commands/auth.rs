//! `pocketvault auth` — passcode, vault key and credential management.
//!
//! Subcommands:
//! - `pocketvault auth status`            — what is configured
//! - `pocketvault auth passcode [--clear]` — set or remove the passcode
//! - `pocketvault auth show-key`          — print the vault key for backup
//! - `pocketvault auth keyring [--delete]` — move secrets into/out of the OS keyring
//! - `pocketvault auth reset`             — forget all local state
//!
//! When the keyring feature is not compiled in, keyring commands return
//! a helpful error message.

use crate::cli::output;
use crate::cli::{confirm, read_new_passcode, read_passcode, Cli, Context};
use crate::errors::{PocketVaultError, Result};

/// Execute `pocketvault auth status`.
pub fn execute_status(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let state = &ctx.state;

    let username = match state.username() {
        "" => "(not set)".to_string(),
        name => name.to_string(),
    };

    output::print_key_values(&[
        ("Home", ctx.home.display().to_string()),
        ("Setup complete", output::yes_no(state.setup_complete())),
        ("Logged in", output::yes_no(state.logged_in())),
        ("Username", username),
        ("Vault key", output::yes_no(state.has_vault_key())),
        ("Passcode", output::yes_no(state.passcode_enabled())),
        ("Biometric unlock", output::yes_no(state.biometric_enabled())),
        ("Git sync", output::yes_no(state.git_sync_enabled())),
        ("OS keyring", output::yes_no(ctx.settings.use_keyring)),
    ]);

    Ok(())
}

/// Execute `pocketvault auth passcode` — set, change or clear the passcode.
pub fn execute_passcode(cli: &Cli, clear: bool) -> Result<()> {
    let mut ctx = Context::load(cli)?;

    // Changing or clearing an existing passcode needs the current one.
    if ctx.state.passcode_enabled() {
        let current = read_passcode("Current passcode")?;
        if !ctx.state.verify_passcode(&current)? {
            return Err(PocketVaultError::IncorrectPasscode);
        }
    }

    if clear {
        ctx.state.clear_passcode()?;
        output::success("Passcode removed.");
        return Ok(());
    }

    let passcode = read_new_passcode()?;
    ctx.state.set_passcode(&passcode, &ctx.settings.argon2_params())?;
    output::success("Passcode set.");
    Ok(())
}

/// Execute `pocketvault auth show-key` — print the vault key.
pub fn execute_show_key(cli: &Cli) -> Result<()> {
    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    output::warning("Anyone with this key can read every secret in the vault.");
    println!("{}", key.to_identity_string().as_str());
    Ok(())
}

/// Execute `pocketvault auth keyring` — move secret state into the OS keyring.
pub fn execute_keyring(cli: &Cli, delete: bool) -> Result<()> {
    #[cfg(feature = "keyring-store")]
    {
        use crate::state::{keys, move_keys, FileKeyStore, KeyringStore};

        let ctx = Context::load(cli)?;
        let file = FileKeyStore::new(ctx.settings.state_path(&ctx.home));
        let keyring = KeyringStore::new(KeyringStore::DEFAULT_SERVICE);

        if delete {
            let moved = move_keys(&keyring, &file, keys::SECRET)?;
            output::success(&format!("Moved {moved} value(s) from the OS keyring to state.json."));
            output::tip("Set `use_keyring = false` in config.toml.");
        } else {
            let moved = move_keys(&file, &keyring, keys::SECRET)?;
            output::success(&format!("Moved {moved} value(s) into the OS keyring."));
            output::tip("Set `use_keyring = true` in config.toml so PocketVault reads them from there.");
        }

        Ok(())
    }

    #[cfg(not(feature = "keyring-store"))]
    {
        let _ = (cli, delete);
        Err(PocketVaultError::KeyStore(
            "keyring support not compiled — rebuild with `cargo build --features keyring-store`"
                .into(),
        ))
    }
}

/// Execute `pocketvault auth reset` — forget every stored value.
pub fn execute_reset(cli: &Cli, force: bool) -> Result<()> {
    if !force
        && !confirm("Forget the vault key and credentials? Secrets cannot be read without the key")?
    {
        output::info("Cancelled.");
        return Ok(());
    }

    let mut ctx = Context::load(cli)?;
    ctx.state.reset()?;
    output::success("Local state cleared. Record files were left on disk.");
    Ok(())
}
