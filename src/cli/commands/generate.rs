//! `pocketvault generate` — print or copy a random password.

use crate::cli::output;
use crate::cli::{copy_to_clipboard, Cli};
use crate::config::Settings;
use crate::crypto::generate_password;
use crate::errors::Result;

/// Execute the `generate` command.
pub fn execute(cli: &Cli, length: Option<usize>, copy: bool) -> Result<()> {
    let length = match length {
        Some(n) => n,
        None => Settings::load(&cli.home)?.password_length,
    };

    let password = generate_password(length)?;

    if copy {
        copy_to_clipboard(&password)?;
        output::success(&format!("Generated {length}-character password copied to clipboard"));
    } else {
        println!("{}", password.as_str());
    }

    Ok(())
}
