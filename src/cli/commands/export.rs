//! `pocketvault export` — write every secret to a JSON snapshot.
//!
//! Modes:
//! - `plain` (default): decrypted password and notes per secret
//! - `encrypted`: record envelopes as stored, readable only with the vault key

use std::path::Path;

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;
use crate::vault::{export_all, write_snapshot, ExportMode};

/// Execute the `export` command.
pub fn execute(cli: &Cli, mode: &str, output_path: Option<&Path>) -> Result<()> {
    let mode: ExportMode = mode.parse()?;

    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    let export = export_all(&ctx.store, key, mode)?;

    for name in &export.skipped {
        output::warning(&format!("Skipped '{name}': could not be decrypted"));
    }

    match output_path {
        Some(dest) => {
            write_snapshot(dest, &export.snapshot, ctx.store.root())?;
            output::success(&format!(
                "Exported {} secrets to {}",
                export.snapshot.len(),
                dest.display()
            ));
            if mode == ExportMode::Plain {
                output::warning("This file contains your secrets unencrypted. Delete it once done.");
            }
        }
        None => {
            // Write to stdout (no success message, just raw output).
            println!("{}", export.snapshot.to_json()?);
        }
    }

    Ok(())
}
