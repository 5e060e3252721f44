//! Integration tests for export and last-write-wins import.

use std::fs;

use chrono::{Duration, Utc};
use pocketvault::crypto::VaultKey;
use pocketvault::errors::PocketVaultError;
use pocketvault::vault::snapshot::PlainEntry;
use pocketvault::vault::{
    export_all, import_all, import_file, read_snapshot, write_snapshot, ExportMode, SecretPayload,
    Snapshot, SnapshotEntry, TieBreak, VaultStore, WriteMode,
};
use tempfile::TempDir;

fn payload(password: &str) -> SecretPayload {
    SecretPayload::new(Some(password.to_string()), None)
}

fn plain_entry(password: &str, updated_at: chrono::DateTime<Utc>) -> SnapshotEntry {
    SnapshotEntry::Plain(PlainEntry {
        password: Some(password.to_string()),
        notes: None,
        metadata: "from backup".to_string(),
        created_at: updated_at - Duration::days(30),
        updated_at,
    })
}

// ---------------------------------------------------------------------------
// Last-write-wins
// ---------------------------------------------------------------------------

#[test]
fn local_survives_unless_incoming_is_newer() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();

    let local = store
        .put("site", &payload("local"), "", &key, WriteMode::Create)
        .unwrap();
    let t1 = local.updated_at;

    // Older and equal incoming entries are skipped.
    for t2 in [t1 - Duration::hours(1), t1] {
        let mut snapshot = Snapshot::new();
        snapshot.insert("site", plain_entry("incoming", t2));
        let report = import_all(&store, &snapshot, &key, TieBreak::KeepLocal);

        assert_eq!(report.skipped, vec!["site".to_string()]);
        let record = store.get("site", &key).unwrap().unwrap();
        assert_eq!(record.payload.password.as_deref(), Some("local"));
    }

    // A strictly newer entry replaces the local record, timestamps included.
    let t2 = t1 + Duration::hours(1);
    let mut snapshot = Snapshot::new();
    snapshot.insert("site", plain_entry("incoming", t2));
    let report = import_all(&store, &snapshot, &key, TieBreak::KeepLocal);

    assert_eq!(report.updated, vec!["site".to_string()]);
    let record = store.get("site", &key).unwrap().unwrap();
    assert_eq!(record.payload.password.as_deref(), Some("incoming"));
    assert_eq!(record.envelope.updated_at, t2);
    assert_eq!(record.envelope.metadata, "from backup");
}

#[test]
fn importing_same_snapshot_twice_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();

    let mut snapshot = Snapshot::new();
    snapshot.insert("a", plain_entry("1", Utc::now()));
    snapshot.insert("b/c", plain_entry("2", Utc::now()));

    let first = import_all(&store, &snapshot, &key, TieBreak::KeepLocal);
    assert_eq!(first.created.len(), 2);

    let second = import_all(&store, &snapshot, &key, TieBreak::KeepLocal);
    assert_eq!(second.written(), 0);
    assert_eq!(second.skipped.len(), 2);
}

#[test]
fn invalid_name_in_snapshot_fails_only_that_entry() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();

    let mut snapshot = Snapshot::new();
    snapshot.insert("../escape", plain_entry("x", Utc::now()));
    snapshot.insert("fine", plain_entry("y", Utc::now()));

    let report = import_all(&store, &snapshot, &key, TieBreak::KeepLocal);
    assert_eq!(report.created, vec!["fine".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "../escape");
    assert!(!dir.path().join("escape.jsop").exists());
}

// ---------------------------------------------------------------------------
// Export -> import between stores
// ---------------------------------------------------------------------------

#[test]
fn plain_export_restores_into_new_store() {
    let dir = TempDir::new().unwrap();
    let source = VaultStore::new(dir.path().join("source"));
    let key = VaultKey::generate();

    source
        .put(
            "work/email",
            &SecretPayload::new(Some("abc".into()), Some("recovery codes".into())),
            "work account",
            &key,
            WriteMode::Create,
        )
        .unwrap();
    source.put("wifi", &payload("hunter2"), "home", &key, WriteMode::Create).unwrap();

    let export = export_all(&source, &key, ExportMode::Plain).unwrap();
    assert!(export.skipped.is_empty());
    assert_eq!(export.snapshot.len(), 2);

    let backup = dir.path().join("backup.json");
    write_snapshot(&backup, &export.snapshot, source.root()).unwrap();

    // A different device with a different key.
    let target = VaultStore::new(dir.path().join("target"));
    let other_key = VaultKey::generate();
    let report = import_file(&target, &backup, &other_key, TieBreak::KeepLocal).unwrap();
    assert_eq!(report.created.len(), 2);
    assert!(report.failed.is_empty());

    let original = source.get("work/email", &key).unwrap().unwrap();
    let restored = target.get("work/email", &other_key).unwrap().unwrap();
    assert_eq!(restored.payload, original.payload);
    assert_eq!(restored.envelope.metadata, "work account");
    assert_eq!(restored.envelope.created_at, original.envelope.created_at);
    assert_eq!(restored.envelope.updated_at, original.envelope.updated_at);
}

#[test]
fn encrypted_export_needs_the_same_key() {
    let dir = TempDir::new().unwrap();
    let source = VaultStore::new(dir.path().join("source"));
    let key = VaultKey::generate();
    source.put("a", &payload("secret-a"), "", &key, WriteMode::Create).unwrap();

    let export = export_all(&source, &key, ExportMode::Encrypted).unwrap();
    let json = export.snapshot.to_json().unwrap();
    assert!(!json.contains("secret-a"), "encrypted export must not leak plaintext");

    // Same key: imports.
    let same = VaultStore::new(dir.path().join("same"));
    let report = import_all(&same, &export.snapshot, &key, TieBreak::KeepLocal);
    assert_eq!(report.created, vec!["a".to_string()]);
    let record = same.get("a", &key).unwrap().unwrap();
    assert_eq!(record.payload.password.as_deref(), Some("secret-a"));

    // Wrong key: that entry fails, a plain sibling still imports.
    let mut mixed = Snapshot::from_json(&json).unwrap();
    mixed.insert("b", plain_entry("secret-b", Utc::now()));

    let other = VaultStore::new(dir.path().join("other"));
    let report = import_all(&other, &mixed, &VaultKey::generate(), TieBreak::KeepLocal);
    assert_eq!(report.created, vec!["b".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "a");
    assert!(!other.contains("a").unwrap());
}

#[test]
fn plain_export_skips_records_under_another_key() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();

    store.put("mine", &payload("1"), "", &key, WriteMode::Create).unwrap();
    store
        .put("foreign", &payload("2"), "", &VaultKey::generate(), WriteMode::Create)
        .unwrap();

    let export = export_all(&store, &key, ExportMode::Plain).unwrap();
    assert_eq!(export.skipped, vec!["foreign".to_string()]);
    assert!(export.snapshot.get("mine").is_some());
    assert!(export.snapshot.get("foreign").is_none());
}

// ---------------------------------------------------------------------------
// Snapshot files
// ---------------------------------------------------------------------------

#[test]
fn malformed_snapshot_is_rejected_before_import() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();

    let cases = [
        "not json at all",
        "[1, 2, 3]",
        r#"{"a": {"password": "x"}}"#,
        r#"{"a": {"password": 5, "metadata": "", "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"}}"#,
    ];

    for (i, content) in cases.iter().enumerate() {
        let path = dir.path().join(format!("bad-{i}.json"));
        fs::write(&path, content).unwrap();
        let result = import_file(&store, &path, &key, TieBreak::KeepLocal);
        assert!(
            matches!(result, Err(PocketVaultError::InvalidSnapshot(_))),
            "case {i} should be rejected"
        );
    }

    assert!(store.list().unwrap().is_empty());
}

#[test]
fn missing_snapshot_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = read_snapshot(&dir.path().join("nope.json"));
    assert!(matches!(result, Err(PocketVaultError::InvalidSnapshot(_))));
}

#[test]
fn export_into_vault_or_over_record_is_refused() {
    let dir = TempDir::new().unwrap();
    let store = VaultStore::new(dir.path().join("vault"));
    let key = VaultKey::generate();
    store.put("a", &payload("x"), "", &key, WriteMode::Create).unwrap();

    let export = export_all(&store, &key, ExportMode::Plain).unwrap();

    let inside = store.root().join("backup.json");
    assert!(write_snapshot(&inside, &export.snapshot, store.root()).is_err());
    assert!(!inside.exists());

    let record_like = dir.path().join("backup.jsop");
    assert!(write_snapshot(&record_like, &export.snapshot, store.root()).is_err());
    assert!(!record_like.exists());
}
