//! Git sync for the vault directory.
//!
//! The vault root is treated as a Git working tree and driven through the
//! `git` executable.  Encrypted record files (`*.jsop`) are never staged:
//! they are listed in the vault's `.gitignore` and filtered out of every
//! commit, so only auxiliary files travel through the remote.
//!
//! A personal access token, when configured, is sent as the username of
//! HTTP Basic auth.  It is passed to `git` through `GIT_CONFIG_*`
//! environment variables so it never shows up in argv or `.git/config`.

pub mod gitignore;
pub mod status;

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::{debug, error, info, warn};
use zeroize::Zeroizing;

use crate::errors::{PocketVaultError, Result};
use crate::vault::RECORD_EXTENSION;

pub use status::{parse_porcelain, StatusEntry};

/// Knobs for the sync adapter (see `Settings::sync_settings`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    /// History depth for `clone`.
    pub clone_depth: u32,
    /// Fixed author/committer identity.
    pub author_name: String,
    pub author_email: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            clone_depth: 10,
            author_name: "PocketVault".into(),
            author_email: "pocketvault@localhost".into(),
        }
    }
}

/// Whether a `git` executable can be run at all.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Git operations on one vault directory.
pub struct GitSync {
    root: PathBuf,
    settings: SyncSettings,
    token: Option<Zeroizing<String>>,
}

impl GitSync {
    pub fn new(root: impl Into<PathBuf>, settings: SyncSettings, token: Option<&str>) -> Self {
        Self {
            root: root.into(),
            settings,
            token: token
                .filter(|t| !t.is_empty())
                .map(|t| Zeroizing::new(t.to_string())),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The vault root has a `.git` directory.
    pub fn is_initialized(&self) -> bool {
        self.root.join(".git").is_dir()
    }

    /// `git init` the vault root and make sure record files are ignored.
    pub fn init(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        if self.is_initialized() {
            debug!(root = %self.root.display(), "repository already initialized");
        } else {
            self.run(&["init", "--quiet"])?;
            info!(root = %self.root.display(), "initialized repository");
        }
        self.ensure_gitignore()?;
        Ok(())
    }

    /// Shallow, single-branch clone of `url` into the vault root.
    ///
    /// The vault root must be absent or empty.
    pub fn clone(&self, url: &str) -> Result<()> {
        if self.root.exists() && std::fs::read_dir(&self.root)?.next().is_some() {
            return Err(PocketVaultError::CommandFailed(format!(
                "cannot clone into {}: directory is not empty",
                self.root.display()
            )));
        }
        if let Some(parent) = self.root.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let depth = self.settings.clone_depth.max(1).to_string();
        let root = self.root.to_string_lossy().into_owned();
        let args = [
            "clone",
            "--quiet",
            "--depth",
            depth.as_str(),
            "--single-branch",
            "--",
            url,
            root.as_str(),
        ];

        let output = self.command().args(args).output();
        self.check("clone", output)?;
        info!(url, root = %self.root.display(), "cloned repository");

        self.ensure_gitignore()?;
        Ok(())
    }

    /// Point `origin` at `url`, adding the remote if needed.
    pub fn set_remote(&self, url: &str) -> Result<()> {
        let remotes = self.run(&["remote"])?;
        if remotes.lines().any(|r| r.trim() == "origin") {
            self.run(&["remote", "set-url", "origin", url])?;
        } else {
            self.run(&["remote", "add", "origin", url])?;
        }
        Ok(())
    }

    /// Changed paths in the working tree.
    pub fn status(&self) -> Result<Vec<StatusEntry>> {
        let out = self.run(&["status", "--porcelain=v1", "-z", "--untracked-files=all"])?;
        Ok(parse_porcelain(&out))
    }

    /// Stage every changed path except record files and commit.
    ///
    /// Returns `false` when there was nothing to commit.
    pub fn commit(&self, message: &str) -> Result<bool> {
        let paths: Vec<String> = self
            .status()?
            .into_iter()
            .filter(|entry| !entry.is_record())
            .flat_map(|entry| std::iter::once(entry.path).chain(entry.orig_path))
            .collect();

        if paths.is_empty() {
            debug!("nothing to commit");
            return Ok(false);
        }

        let mut args = vec!["add", "-A", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args)?;

        let staged = self.run(&["diff", "--cached", "--name-only", "-z"])?;
        if staged.is_empty() {
            debug!("nothing staged after add");
            return Ok(false);
        }

        self.run(&["commit", "--quiet", "-m", message])?;
        info!(files = paths.len(), "committed changes");
        Ok(true)
    }

    /// Push the current branch to `origin`.
    pub fn push(&self) -> Result<()> {
        self.run(&["push", "--quiet", "origin", "HEAD"])?;
        info!("pushed to origin");
        Ok(())
    }

    /// Fetch and merge the current branch from `origin`.
    ///
    /// A merge that stops on conflicts becomes `MergeConflict` listing the
    /// unmerged paths; the working tree is left for manual resolution.
    pub fn pull(&self) -> Result<()> {
        let branch = self.current_branch()?;
        match self.run(&["pull", "--quiet", "--no-rebase", "--no-edit", "origin", branch.as_str()]) {
            Ok(_) => {
                info!(branch = %branch, "pulled from origin");
                Ok(())
            }
            Err(err) => {
                let conflicts = self.unmerged_paths().unwrap_or_default();
                if conflicts.is_empty() {
                    Err(err)
                } else {
                    warn!(paths = ?conflicts, "merge conflict, manual resolution required");
                    Err(PocketVaultError::MergeConflict(conflicts))
                }
            }
        }
    }

    /// Commit then push, but only when sync is `enabled` and the vault is
    /// already a repository.  Returns whether a commit was made.
    pub fn commit_and_push(&self, message: &str, enabled: bool) -> Result<bool> {
        if !enabled {
            debug!("sync disabled, skipping commit");
            return Ok(false);
        }
        if !self.is_initialized() {
            debug!(root = %self.root.display(), "vault is not a repository, skipping commit");
            return Ok(false);
        }

        let committed = self.commit(message)?;
        if committed {
            self.push()?;
        }
        Ok(committed)
    }

    /// Keep record files out of version control.
    pub fn ensure_gitignore(&self) -> Result<bool> {
        gitignore::patch_gitignore(&self.root, &format!("*.{RECORD_EXTENSION}"))
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self
            .run(&["symbolic-ref", "--short", "HEAD"])?
            .trim()
            .to_string())
    }

    fn unmerged_paths(&self) -> Result<Vec<String>> {
        Ok(self
            .status()?
            .into_iter()
            .filter(StatusEntry::is_unmerged)
            .map(|entry| entry.path)
            .collect())
    }

    /// `git` with identity, auth and prompts configured.
    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        cmd.env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_AUTHOR_NAME", &self.settings.author_name)
            .env("GIT_AUTHOR_EMAIL", &self.settings.author_email)
            .env("GIT_COMMITTER_NAME", &self.settings.author_name)
            .env("GIT_COMMITTER_EMAIL", &self.settings.author_email);

        if let Some(token) = &self.token {
            let credentials = Zeroizing::new(format!("{}:", token.as_str()));
            let header = Zeroizing::new(format!(
                "Authorization: Basic {}",
                STANDARD.encode(credentials.as_bytes())
            ));
            cmd.env("GIT_CONFIG_COUNT", "1")
                .env("GIT_CONFIG_KEY_0", "http.extraHeader")
                .env("GIT_CONFIG_VALUE_0", header.as_str());
        }
        cmd
    }

    /// Run `git -C <root> <args>` and return stdout.
    fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.command().arg("-C").arg(&self.root).args(args).output();
        let name = args.first().copied().unwrap_or("git");
        self.check(name, output)
    }

    fn check(&self, name: &str, output: std::io::Result<Output>) -> Result<String> {
        let output = output.map_err(|e| {
            error!(command = name, error = %e, "failed to run git");
            PocketVaultError::Git {
                command: name.to_string(),
                stderr: e.to_string(),
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = name, status = %output.status, stderr = %stderr, "git command failed");
            return Err(PocketVaultError::Git {
                command: name.to_string(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
