//! Parsing of `git status --porcelain=v1 -z`.

use crate::vault::RECORD_EXTENSION;

/// One changed path in the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Index (staged) state, e.g. `M`, `A`, `D`, `R`, `?`, or space.
    pub index: char,
    /// Work-tree state.
    pub worktree: char,
    /// Path relative to the repository root.
    pub path: String,
    /// Source path of a rename or copy.
    pub orig_path: Option<String>,
}

impl StatusEntry {
    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.worktree == '?'
    }

    /// Both sides modified, or any `U` state.
    pub fn is_unmerged(&self) -> bool {
        matches!(
            (self.index, self.worktree),
            ('U', _) | (_, 'U') | ('A', 'A') | ('D', 'D')
        )
    }

    /// Whether the path is an encrypted record file.
    pub fn is_record(&self) -> bool {
        self.path
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(RECORD_EXTENSION))
    }

    /// Two-letter code as printed by `git status --short`.
    pub fn code(&self) -> String {
        format!("{}{}", self.index, self.worktree)
    }
}

/// Parse NUL-separated porcelain v1 output.
///
/// Malformed trailing fragments are dropped.
pub fn parse_porcelain(output: &str) -> Vec<StatusEntry> {
    let mut entries = Vec::new();
    let mut fields = output.split('\0').filter(|f| !f.is_empty());

    while let Some(field) = fields.next() {
        let mut chars = field.chars();
        let (Some(index), Some(worktree), Some(' ')) = (chars.next(), chars.next(), chars.next())
        else {
            continue;
        };
        let path = chars.as_str().to_string();

        // Renames and copies carry the source path in the next field.
        let orig_path = if matches!(index, 'R' | 'C') {
            fields.next().map(str::to_string)
        } else {
            None
        };

        entries.push(StatusEntry {
            index,
            worktree,
            path,
            orig_path,
        });
    }

    entries
}
