//! `.gitignore` patching for the vault working tree.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::errors::Result;

/// Append `entry` to `<dir>/.gitignore` if not already present.
///
/// Creates the file if it doesn't exist.  Returns whether the file changed.
pub fn patch_gitignore(dir: &Path, entry: &str) -> Result<bool> {
    let gitignore_path = dir.join(".gitignore");

    let existing = match fs::read_to_string(&gitignore_path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(false);
    }

    let separator = if existing.ends_with('\n') || existing.is_empty() {
        ""
    } else {
        "\n"
    };

    fs::write(&gitignore_path, format!("{existing}{separator}{entry}\n"))?;
    info!(entry, "added entry to .gitignore");
    Ok(true)
}
