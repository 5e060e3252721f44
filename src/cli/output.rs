//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::sync::StatusEntry;
use crate::vault::ListedRecord;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of records (Name, Metadata, Created, Updated).
pub fn print_records_table(records: &[ListedRecord]) {
    if records.is_empty() {
        info("No secrets found.");
        tip("Run `pocketvault add <NAME>` to add a secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Metadata", "Created", "Updated"]);

    for r in records {
        table.add_row(vec![
            r.name.to_string(),
            r.envelope.metadata.clone(),
            r.envelope.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            r.envelope.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print `git status` entries (State, Path).
pub fn print_status_table(entries: &[StatusEntry]) {
    if entries.is_empty() {
        info("Working tree clean.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["State", "Path"]);

    for e in entries {
        let path = match &e.orig_path {
            Some(orig) => format!("{orig} -> {}", e.path),
            None => e.path.clone(),
        };
        table.add_row(vec![e.code(), path]);
    }

    println!("{table}");
}

/// "yes" / "no" for status tables.
pub fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

/// Print label/value pairs as a two-column table.
pub fn print_key_values(rows: &[(&str, String)]) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value.clone()]);
    }
    println!("{table}");
}
