//! Validated secret names.
//!
//! A name is the logical key of a record and also its path under the
//! vault root, so validation is what keeps every operation inside the
//! vault directory.  Slashes are allowed and form sub-directories.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{PocketVaultError, Result};

/// File extension of record files (without the dot).
pub const RECORD_EXTENSION: &str = "jsop";

/// Maximum length of a name in bytes.
const MAX_NAME_LEN: usize = 256;

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9/_-]+$").expect("static regex is valid"))
}

/// A secret name that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordName(String);

impl RecordName {
    /// Validate `name`.
    ///
    /// Allowed: ASCII letters, digits, `_`, `-` and `/`.  Slashes may not
    /// lead, trail or repeat, and the name is at most 256 bytes.
    pub fn parse(name: &str) -> Result<Self> {
        let invalid = || PocketVaultError::InvalidName(name.to_string());

        if name.len() > MAX_NAME_LEN || !name_pattern().is_match(name) {
            return Err(invalid());
        }
        if name.split('/').any(str::is_empty) {
            return Err(invalid());
        }
        Ok(Self(name.to_string()))
    }

    /// Recover a name from a record file path relative to the vault root.
    ///
    /// Returns `None` if the path does not carry the record extension or
    /// its stem is not a valid name.
    pub fn from_relative_path(relative: &Path) -> Option<Self> {
        if relative.extension()?.to_str()? != RECORD_EXTENSION {
            return None;
        }
        let stem = relative.with_extension("");
        let parts: Option<Vec<&str>> = stem.components().map(|c| c.as_os_str().to_str()).collect();
        Self::parse(&parts?.join("/")).ok()
    }

    /// Path of this record's file under `root`.
    pub fn file_path(&self, root: &Path) -> PathBuf {
        let mut path = root.to_path_buf();
        for segment in self.0.split('/') {
            path.push(segment);
        }
        path.set_extension(RECORD_EXTENSION);
        path
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for RecordName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_names() {
        for name in ["email", "work/email", "a/b/c", "API_KEY-2", "x"] {
            assert!(RecordName::parse(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_characters_outside_pattern() {
        for name in ["", "has space", "dot.name", "../etc/passwd", "back\\slash", "ünï", "a:b"] {
            assert!(
                matches!(RecordName::parse(name), Err(PocketVaultError::InvalidName(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_degenerate_slashes() {
        for name in ["/abs", "trailing/", "double//slash", "/"] {
            assert!(RecordName::parse(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn rejects_overlong_names() {
        assert!(RecordName::parse(&"a".repeat(MAX_NAME_LEN)).is_ok());
        assert!(RecordName::parse(&"a".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn file_path_nests_namespaces() {
        let name = RecordName::parse("work/email").unwrap();
        let path = name.file_path(Path::new("/vault"));
        assert_eq!(path, PathBuf::from("/vault/work/email.jsop"));
    }

    #[test]
    fn from_relative_path_round_trips() {
        let name = RecordName::parse("work/email").unwrap();
        let relative = name.file_path(Path::new(""));
        assert_eq!(RecordName::from_relative_path(&relative), Some(name));
    }

    #[test]
    fn from_relative_path_ignores_other_files() {
        assert_eq!(RecordName::from_relative_path(Path::new("notes.txt")), None);
        assert_eq!(RecordName::from_relative_path(Path::new("bad name.jsop")), None);
    }
}
