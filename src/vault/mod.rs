//! Vault module — one encrypted file per secret.
//!
//! This module provides:
//! - Name validation and name <-> path mapping (`name`)
//! - `SecretPayload`, `RecordEnvelope` and friends (`record`)
//! - `VaultStore` for put/get/edit/delete/list (`store`)
//! - The backup snapshot format (`snapshot`)
//! - Export and last-write-wins import (`reconcile`)

pub mod name;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod store;

// Re-export the most commonly used items.
pub use name::{RecordName, RECORD_EXTENSION};
pub use reconcile::{export_all, import_all, import_file, ExportMode, ImportReport, TieBreak};
pub use record::{ListedRecord, Record, RecordEnvelope, SecretPayload};
pub use snapshot::{read_snapshot, write_snapshot, Snapshot, SnapshotEntry};
pub use store::{VaultStore, WriteMode};
