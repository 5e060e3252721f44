//! `pocketvault list` — display secrets in a table.
//!
//! Listing never decrypts anything, so it works without the passcode.

use crate::cli::output;
use crate::cli::{Cli, Context};
use crate::errors::Result;

/// Execute the `list` command.
pub fn execute(cli: &Cli, query: Option<&str>) -> Result<()> {
    let ctx = Context::load(cli)?;

    let records = match query {
        Some(q) => ctx.store.search(q)?,
        None => ctx.store.list()?,
    };

    output::info(&format!("{} secret(s)", records.len()));
    output::print_records_table(&records);

    Ok(())
}
