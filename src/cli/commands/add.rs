//! `pocketvault add` — store a new secret.

use crate::cli::output;
use crate::cli::{read_secret, Cli, Context};
use crate::crypto::generate_password;
use crate::errors::{PocketVaultError, Result};
use crate::vault::{RecordName, SecretPayload, WriteMode};

/// Arguments of the `add` command.
pub struct AddArgs<'a> {
    pub name: &'a str,
    pub password: Option<&'a str>,
    pub metadata: &'a str,
    pub notes: Option<&'a str>,
    pub generate: bool,
    pub force: bool,
}

/// Execute the `add` command.
pub fn execute(cli: &Cli, args: AddArgs<'_>) -> Result<()> {
    RecordName::parse(args.name)?;

    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    let mode = if args.force {
        WriteMode::Overwrite
    } else {
        WriteMode::Create
    };

    // Fail before prompting if the name is taken.
    if mode == WriteMode::Create && ctx.store.contains(args.name)? {
        return Err(PocketVaultError::SecretAlreadyExists(args.name.to_string()));
    }

    let password = if args.generate {
        generate_password(ctx.settings.password_length)?
    } else {
        read_secret(&format!("password for {}", args.name), args.password)?
    };

    let payload = SecretPayload::new(
        Some(password.to_string()).filter(|p| !p.is_empty()),
        args.notes.map(str::to_string),
    );

    ctx.store.put(args.name, &payload, args.metadata, key, mode)?;
    output::success(&format!("Secret '{}' saved", args.name));
    if args.generate {
        output::tip(&format!(
            "Run `pocketvault get {} --copy` to copy the generated password.",
            args.name
        ));
    }

    ctx.sync_change("Add secret");
    Ok(())
}
