//! `pocketvault sync` — Git sync for the vault directory.
//!
//! Subcommands:
//! - `sync clone <URL>`  — clone a remote into an empty vault and enable sync
//! - `sync init`         — make the existing vault directory a repository
//! - `sync pull`         — fetch and merge; conflicts stop with an error
//! - `sync push`         — commit pending changes and push
//! - `sync status`       — changed files and settings
//! - `sync enable|disable` — toggle commit-and-push after each change

use crate::cli::output;
use crate::cli::{Cli, Context, SyncAction};
use crate::errors::{PocketVaultError, Result};
use crate::sync::GitSync;

/// Execute a `sync` subcommand.
pub fn execute(cli: &Cli, action: &SyncAction) -> Result<()> {
    let mut ctx = Context::load(cli)?;

    match action {
        SyncAction::Clone { url, token } => {
            let sync = GitSync::new(
                ctx.store.root(),
                ctx.settings.sync_settings(),
                token.as_deref(),
            );
            sync.clone(url)?;
            ctx.state.set_git_credentials(url, token.as_deref())?;
            ctx.state.set_git_sync_enabled(true)?;
            output::success(&format!("Cloned {url} into {}", ctx.store.root().display()));
            if !ctx.state.has_vault_key() {
                output::tip("Run `pocketvault init --restore` to use the vault key from your other device.");
            }
        }

        SyncAction::Init { remote, token } => {
            let sync = GitSync::new(
                ctx.store.root(),
                ctx.settings.sync_settings(),
                token.as_deref().or(ctx.state.git_token()),
            );
            sync.init()?;
            if let Some(url) = remote {
                sync.set_remote(url)?;
                let token = token.as_deref().or(ctx.state.git_token()).map(str::to_string);
                ctx.state.set_git_credentials(url, token.as_deref())?;
            } else if token.is_some() {
                ctx.state.set_git_token(token.as_deref())?;
                output::info("Token saved for later pushes and pulls.");
            }
            output::success(&format!(
                "Initialized repository in {}",
                ctx.store.root().display()
            ));
            output::tip("Run `pocketvault sync enable` to push after every change.");
        }

        SyncAction::Pull => {
            let sync = initialized(&ctx)?;
            sync.pull()?;
            output::success("Pulled latest changes.");
        }

        SyncAction::Push => {
            let sync = initialized(&ctx)?;
            if sync.commit("Update vault")? {
                output::info("Committed pending changes.");
            }
            sync.push()?;
            output::success("Pushed to remote.");
        }

        SyncAction::Status => {
            let sync = ctx.sync();
            output::print_key_values(&[
                ("Repository", output::yes_no(sync.is_initialized())),
                ("Auto sync", output::yes_no(ctx.state.git_sync_enabled())),
                (
                    "Remote",
                    ctx.state.git_repo_url().unwrap_or("(none)").to_string(),
                ),
                ("Token", output::yes_no(ctx.state.git_token().is_some())),
            ]);
            if sync.is_initialized() {
                output::print_status_table(&sync.status()?);
            }
        }

        SyncAction::Enable => {
            ctx.state.set_git_sync_enabled(true)?;
            output::success("Sync enabled.");
            if !ctx.sync().is_initialized() {
                output::warning("The vault is not a repository yet — nothing will be pushed.");
                output::tip("Run `pocketvault sync init --remote <URL>` or `sync clone <URL>`.");
            }
        }

        SyncAction::Disable => {
            ctx.state.set_git_sync_enabled(false)?;
            output::success("Sync disabled.");
        }
    }

    Ok(())
}

/// Sync adapter for a vault that must already be a repository.
fn initialized(ctx: &Context) -> Result<GitSync> {
    let sync = ctx.sync();
    if !sync.is_initialized() {
        return Err(PocketVaultError::CommandFailed(
            "the vault is not a git repository — run `pocketvault sync init` or `sync clone` first"
                .into(),
        ));
    }
    Ok(sync)
}
