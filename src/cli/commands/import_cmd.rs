//! `pocketvault import` — merge a JSON snapshot into the vault.
//!
//! For each entry the newer `updatedAt` wins; entries that fail are
//! reported and skipped without stopping the rest.

use std::path::Path;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::{PocketVaultError, Result};
use crate::vault::{import_file, TieBreak};

/// Execute the `import` command.
pub fn execute(cli: &Cli, file: &Path, take_incoming: bool) -> Result<()> {
    if !file.exists() {
        return Err(PocketVaultError::CommandFailed(format!(
            "import file not found: {}",
            file.display()
        )));
    }

    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    let tie_break = if take_incoming {
        TieBreak::TakeIncoming
    } else {
        ctx.settings.import_tie_break
    };

    let report = import_file(&ctx.store, file, key, tie_break)?;

    for name in &report.created {
        output::info(&format!("  + {name}"));
    }
    for name in &report.updated {
        output::info(&format!("  ~ {name}"));
    }
    for failure in &report.failed {
        output::warning(&format!("  ! {}: {}", failure.name, failure.reason));
    }

    output::success(&format!(
        "Imported from {}: {} created, {} updated, {} kept local, {} failed",
        file.display(),
        report.created.len(),
        report.updated.len(),
        report.skipped.len(),
        report.failed.len()
    ));

    if report.written() > 0 {
        ctx.sync_change("Import secrets");
    }

    Ok(())
}
