//! `pocketvault get` — print or copy a single secret.

use crate::cli::output;
use crate::cli::{copy_to_clipboard, Cli, Context};
use crate::errors::{PocketVaultError, Result};
use crate::vault::RecordName;

/// Execute the `get` command.
pub fn execute(cli: &Cli, name: &str, copy: bool, show_notes: bool) -> Result<()> {
    // Reject bad names before the passcode prompt.
    RecordName::parse(name)?;

    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    let record = ctx
        .store
        .get(name, key)?
        .ok_or_else(|| PocketVaultError::SecretNotFound(name.to_string()))?;

    match (&record.payload.password, copy) {
        (Some(password), true) => {
            copy_to_clipboard(password)?;
            output::success(&format!("Password for '{name}' copied to clipboard"));
        }
        (Some(password), false) => println!("{password}"),
        (None, _) => output::warning(&format!("Secret '{name}' has no password")),
    }

    if show_notes {
        match &record.payload.notes {
            Some(notes) => println!("{notes}"),
            None => output::info("No notes."),
        }
    }

    Ok(())
}
