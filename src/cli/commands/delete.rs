//! `pocketvault delete` — remove a secret from the vault.

use crate::cli::output;
use crate::cli::{confirm, Cli, Context};
use crate::errors::Result;
use crate::vault::RecordName;

/// Execute the `delete` command.
pub fn execute(cli: &Cli, name: &str, force: bool) -> Result<()> {
    // Reject bad names before asking anything.
    RecordName::parse(name)?;

    // Unless --force is set, ask for confirmation before deleting.
    if !force && !confirm(&format!("Delete secret '{name}'?"))? {
        output::info("Cancelled.");
        return Ok(());
    }

    let ctx = Context::load(cli)?;

    if ctx.store.delete(name)? {
        output::success(&format!("Deleted secret '{name}'"));
        ctx.sync_change("Delete secret");
    } else {
        output::info(&format!("Secret '{name}' does not exist, nothing to delete"));
    }

    Ok(())
}
