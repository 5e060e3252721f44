//! `pocketvault edit` — change the password, notes or metadata of a secret.
//!
//! Fields that are not given keep their current value.

use crate::cli::output;
use crate::cli::{read_secret, Cli, Context};
use crate::crypto::generate_password;
use crate::errors::{PocketVaultError, Result};
use crate::vault::{RecordName, SecretPayload};

/// Arguments of the `edit` command.
pub struct EditArgs<'a> {
    pub name: &'a str,
    pub metadata: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub password: bool,
    pub generate: bool,
}

impl EditArgs<'_> {
    fn changes_anything(&self) -> bool {
        self.metadata.is_some() || self.notes.is_some() || self.password || self.generate
    }
}

/// Execute the `edit` command.
pub fn execute(cli: &Cli, args: EditArgs<'_>) -> Result<()> {
    if !args.changes_anything() {
        return Err(PocketVaultError::CommandFailed(
            "nothing to change — pass --password, --generate, --notes or --metadata".into(),
        ));
    }
    RecordName::parse(args.name)?;

    let ctx = Context::load(cli)?;
    let key = ctx.unlock()?;

    let current = ctx
        .store
        .get(args.name, key)?
        .ok_or_else(|| PocketVaultError::SecretNotFound(args.name.to_string()))?;

    let password = if args.generate {
        Some(generate_password(ctx.settings.password_length)?.to_string())
    } else if args.password {
        let value = read_secret(&format!("new password for {}", args.name), None)?;
        Some(value.to_string()).filter(|p| !p.is_empty())
    } else {
        current.payload.password.clone()
    };

    let notes = match args.notes {
        Some(n) if n.is_empty() => None,
        Some(n) => Some(n.to_string()),
        None => current.payload.notes.clone(),
    };

    let metadata = args.metadata.unwrap_or(current.envelope.metadata.as_str());

    let payload = SecretPayload::new(password, notes);
    if payload == current.payload && metadata == current.envelope.metadata {
        output::info("No changes detected.");
        return Ok(());
    }

    ctx.store.edit(args.name, &payload, metadata, key)?;
    output::success(&format!("Secret '{}' updated", args.name));

    ctx.sync_change("Update secret");
    Ok(())
}
