// crates/gift-ledger-core/src/runtime/migrator/tests.rs
// ============================================================================
// Module: Batched Table Migrator Unit Tests
// Description: Unit tests for paging, termination, and source validation.
// Purpose: Validate cursor handling with call-recording fixtures.
// Dependencies: gift-ledger-core
// ============================================================================

//! ## Overview
//! Drives [`BatchMigrator`] over vector-backed sources that record every
//! query and update call.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use super::BatchMigrator;
use super::ConfirmActiveUsers;
use super::DEFAULT_BATCH_SIZE;
use crate::audit::EventWriteAuditEvent;
use crate::audit::LedgerAuditSink;
use crate::audit::MigrationAuditEvent;
use crate::audit::MigrationPageAuditEvent;
use crate::core::Timestamp;
use crate::core::UserAccount;
use crate::core::UserId;
use crate::interfaces::BatchSource;
use crate::interfaces::BatchUpdate;
use crate::interfaces::RowKey;
use crate::interfaces::StoreError;
use crate::interfaces::UserAccountStore;
use crate::runtime::InMemoryUserStore;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Sorted key list that records every cursor it is queried with.
struct VecSource {
    keys: Vec<RowKey>,
    cursors: Mutex<Vec<RowKey>>,
}

impl VecSource {
    fn new(keys: Vec<RowKey>) -> Self {
        Self {
            keys,
            cursors: Mutex::new(Vec::new()),
        }
    }

    fn cursors(&self) -> Vec<RowKey> {
        self.cursors.lock().unwrap().clone()
    }
}

impl BatchSource for VecSource {
    fn keys_after(&self, after: RowKey, limit: usize) -> Result<Vec<RowKey>, StoreError> {
        self.cursors.lock().unwrap().push(after);
        Ok(self.keys.iter().copied().filter(|key| *key > after).take(limit).collect())
    }
}

/// Update that records page sizes and reports every key as changed.
#[derive(Default)]
struct RecordingUpdate {
    pages: Mutex<Vec<Vec<RowKey>>>,
}

impl BatchUpdate for RecordingUpdate {
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError> {
        self.pages.lock().unwrap().push(keys.to_vec());
        Ok(keys.len())
    }
}

/// Source that ignores its cursor and always returns the same page.
struct StuckSource;

impl BatchSource for StuckSource {
    fn keys_after(&self, _after: RowKey, _limit: usize) -> Result<Vec<RowKey>, StoreError> {
        Ok(vec![1, 2, 3])
    }
}

/// Update that fails on the second page.
#[derive(Default)]
struct FailingUpdate {
    calls: Mutex<usize>,
}

impl BatchUpdate for FailingUpdate {
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError> {
        let mut calls = self.calls.lock().unwrap();
        *calls += 1;
        if *calls == 2 {
            return Err(StoreError::Store("lock timeout".to_string()));
        }
        Ok(keys.len())
    }
}

#[derive(Default)]
struct CapturingAudit {
    pages: Mutex<Vec<MigrationPageAuditEvent>>,
    runs: Mutex<Vec<MigrationAuditEvent>>,
}

impl LedgerAuditSink for CapturingAudit {
    fn record_event_write(&self, _event: &EventWriteAuditEvent) {}

    fn record_migration_page(&self, event: &MigrationPageAuditEvent) {
        self.pages.lock().unwrap().push(event.clone());
    }

    fn record_migration(&self, event: &MigrationAuditEvent) {
        self.runs.lock().unwrap().push(event.clone());
    }
}

fn account(id: u64, is_active: bool, is_confirmed: bool, logged_in: bool) -> UserAccount {
    UserAccount {
        id: UserId::from_raw(id).unwrap(),
        email: format!("user{id}@example.com"),
        is_active,
        is_confirmed,
        last_login: logged_in.then(|| Timestamp::from_unix_millis(1_700_000_000_000)),
        jwt_token_key: None,
    }
}

// ============================================================================
// SECTION: Paging
// ============================================================================

#[test]
fn twelve_thousand_rows_page_as_5000_5000_2000() {
    let source = VecSource::new((1..=12_000).collect());
    let update = RecordingUpdate::default();
    let migrator = BatchMigrator::default();

    let report = migrator.run("backfill", &source, &update).unwrap();

    let sizes: Vec<usize> = update.pages.lock().unwrap().iter().map(Vec::len).collect();
    assert_eq!(sizes, vec![5000, 5000, 2000]);
    assert_eq!(source.cursors(), vec![0, 5000, 10_000, 12_000]);
    assert_eq!(report.pages, 3);
    assert_eq!(report.rows, 12_000);
    assert_eq!(report.updated, 12_000);
}

#[test]
fn cursor_follows_sparse_keys() {
    let source = VecSource::new(vec![3, 9, 10, 40, 41, 1000]);
    let migrator = BatchMigrator::new(4).unwrap();

    let pages: Vec<Vec<RowKey>> = migrator.pages(&source).map(Result::unwrap).collect();

    assert_eq!(pages, vec![vec![3, 9, 10, 40], vec![41, 1000]]);
    assert_eq!(source.cursors(), vec![0, 40, 1000]);
}

#[test]
fn empty_source_issues_one_probe() {
    let source = VecSource::new(Vec::new());
    let update = RecordingUpdate::default();

    let report = BatchMigrator::default().run("backfill", &source, &update).unwrap();

    assert_eq!(report.pages, 0);
    assert_eq!(source.cursors(), vec![0]);
    assert!(update.pages.lock().unwrap().is_empty());
}

#[test]
fn default_batch_size_is_5000() {
    assert_eq!(DEFAULT_BATCH_SIZE, 5000);
    assert_eq!(BatchMigrator::default().batch_size(), 5000);
}

#[test]
fn zero_batch_size_is_rejected() {
    assert!(matches!(BatchMigrator::new(0), Err(StoreError::Invalid(_))));
}

// ============================================================================
// SECTION: Failures
// ============================================================================

#[test]
fn source_that_does_not_advance_fails() {
    let migrator = BatchMigrator::new(10).unwrap();
    let mut pages = migrator.pages(&StuckSource);

    assert_eq!(pages.next().unwrap().unwrap(), vec![1, 2, 3]);
    assert!(matches!(pages.next(), Some(Err(StoreError::Invalid(_)))));
    assert!(pages.next().is_none());
}

#[test]
fn oversized_page_fails() {
    let migrator = BatchMigrator::new(2).unwrap();
    let result = migrator.run("backfill", &StuckSource, &RecordingUpdate::default());
    assert!(matches!(result, Err(StoreError::Invalid(_))));
}

#[test]
fn update_failure_stops_run_after_earlier_pages() {
    let source = VecSource::new((1..=30).collect());
    let update = FailingUpdate::default();

    let result = BatchMigrator::new(10).unwrap().run("backfill", &source, &update);

    assert!(matches!(result, Err(StoreError::Store(message)) if message == "lock timeout"));
    assert_eq!(*update.calls.lock().unwrap(), 2);
    assert_eq!(source.cursors(), vec![0, 10]);
}

// ============================================================================
// SECTION: Confirm Active Users
// ============================================================================

#[test]
fn confirm_active_users_touches_only_matching_rows() {
    let store = InMemoryUserStore::new();
    store.upsert(account(1, true, false, true)).unwrap();
    store.upsert(account(2, true, false, false)).unwrap();
    store.upsert(account(3, false, false, true)).unwrap();
    store.upsert(account(4, true, true, true)).unwrap();
    store.upsert(account(5, true, false, true)).unwrap();

    let migrator = BatchMigrator::new(1).unwrap();
    let report = ConfirmActiveUsers::new(&store).run(&migrator, "confirm").unwrap();

    assert_eq!(report.pages, 2);
    assert_eq!(report.updated, 2);
    let confirmed: Vec<bool> = (1..=5)
        .map(|id| store.get(UserId::from_raw(id).unwrap()).unwrap().unwrap().is_confirmed)
        .collect();
    assert_eq!(confirmed, vec![true, false, false, true, true]);
}

#[test]
fn confirm_active_users_is_idempotent() {
    let store = InMemoryUserStore::new();
    for id in 1..=7 {
        store.upsert(account(id, true, false, true)).unwrap();
    }
    let migrator = BatchMigrator::new(3).unwrap();
    let backfill = ConfirmActiveUsers::new(&store);

    let first = backfill.run(&migrator, "confirm").unwrap();
    let second = backfill.run(&migrator, "confirm").unwrap();

    assert_eq!(first.updated, 7);
    assert_eq!(first.pages, 3);
    assert_eq!(second.pages, 0);
    assert_eq!(second.updated, 0);
}

#[test]
fn confirm_users_counts_only_rows_that_flip() {
    let store = InMemoryUserStore::new();
    store.upsert(account(1, true, true, true)).unwrap();
    store.upsert(account(2, true, false, true)).unwrap();
    store.upsert(account(3, false, false, false)).unwrap();

    assert_eq!(store.confirm_users(&[1, 2, 99]).unwrap(), 1);
    assert_eq!(store.confirm_users(&[1, 2]).unwrap(), 0);
}

#[test]
fn audit_receives_page_and_run_records() {
    let audit = Arc::new(CapturingAudit::default());
    let migrator = BatchMigrator::new(4).unwrap().with_audit(audit.clone());
    let source = VecSource::new((1..=6).collect());

    migrator.run("backfill", &source, &RecordingUpdate::default()).unwrap();

    let pages = audit.pages.lock().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!((pages[0].first_key, pages[0].last_key), (1, 4));
    assert_eq!((pages[1].page, pages[1].rows), (1, 2));
    let runs = audit.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].migration, "backfill");
    assert_eq!(runs[0].rows, 6);
}
