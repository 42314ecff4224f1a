// crates/gift-ledger-core/src/runtime/migrator.rs
// ============================================================================
// Module: Batched Table Migrator
// Description: Primary-key ordered paging with per-page idempotent updates.
// Purpose: Apply data backfills to large tables with bounded memory per step.
// Dependencies: crate::{audit, interfaces}, serde
// ============================================================================

//! ## Overview
//! [`BatchPages`] walks a [`BatchSource`] in ascending key order. The cursor
//! starts at the zero sentinel and advances to the last key of each yielded
//! page; an empty page ends iteration. [`BatchMigrator`] feeds every page to
//! a [`BatchUpdate`] that targets exactly the page keys.
//!
//! Security posture: keys returned by a source are checked to be strictly
//! ascending, above the cursor, and within the page size. A misbehaving
//! source fails the run instead of looping.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Serialize;

use crate::audit::LedgerAuditSink;
use crate::audit::MigrationAuditEvent;
use crate::audit::MigrationPageAuditEvent;
use crate::audit::NoopAuditSink;
use crate::interfaces::BatchSource;
use crate::interfaces::BatchUpdate;
use crate::interfaces::RowKey;
use crate::interfaces::StoreError;
use crate::interfaces::UserAccountStore;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default page size; sized for roughly 8MB of row data per page.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

// ============================================================================
// SECTION: Page Iterator
// ============================================================================

/// Iterator over key pages of a [`BatchSource`].
pub struct BatchPages<'a, S: ?Sized> {
    /// Source being walked.
    source: &'a S,
    /// Maximum keys per page.
    batch_size: usize,
    /// Largest key already yielded (0 before the first page).
    start_pk: RowKey,
    /// Set once an empty page or an error has been observed.
    done: bool,
}

impl<'a, S: BatchSource + ?Sized> BatchPages<'a, S> {
    /// Creates a page iterator starting before the first row.
    #[must_use]
    pub const fn new(source: &'a S, batch_size: usize) -> Self {
        Self {
            source,
            batch_size,
            start_pk: 0,
            done: false,
        }
    }

    /// Checks a fetched page against the cursor and page size.
    fn check_page(&self, keys: &[RowKey]) -> Result<(), StoreError> {
        if keys.len() > self.batch_size {
            return Err(StoreError::Invalid(format!(
                "batch source returned {} keys for page size {}",
                keys.len(),
                self.batch_size
            )));
        }
        let mut previous = self.start_pk;
        for key in keys {
            if *key <= previous {
                return Err(StoreError::Invalid(format!(
                    "batch source key {key} does not advance past {previous}"
                )));
            }
            previous = *key;
        }
        Ok(())
    }
}

impl<S: BatchSource + ?Sized> Iterator for BatchPages<'_, S> {
    type Item = Result<Vec<RowKey>, StoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let page = self
            .source
            .keys_after(self.start_pk, self.batch_size)
            .and_then(|keys| self.check_page(&keys).map(|()| keys));
        match page {
            Ok(keys) => match keys.last() {
                Some(last) => {
                    self.start_pk = *last;
                    Some(Ok(keys))
                }
                None => {
                    self.done = true;
                    None
                }
            },
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

// ============================================================================
// SECTION: Migrator
// ============================================================================

/// Summary of one migration run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Non-empty pages processed.
    pub pages: usize,
    /// Keys visited across all pages.
    pub rows: usize,
    /// Rows reported changed by the update.
    pub updated: usize,
}

/// Runs batched updates over a paged source.
pub struct BatchMigrator {
    /// Maximum keys per page.
    batch_size: usize,
    /// Audit sink for page and run records.
    audit: Arc<dyn LedgerAuditSink>,
}

impl BatchMigrator {
    /// Creates a migrator with the given page size.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] when `batch_size` is zero.
    pub fn new(batch_size: usize) -> Result<Self, StoreError> {
        if batch_size == 0 {
            return Err(StoreError::Invalid("batch size must be greater than zero".to_string()));
        }
        Ok(Self {
            batch_size,
            audit: Arc::new(NoopAuditSink),
        })
    }

    /// Replaces the audit sink.
    #[must_use]
    pub fn with_audit(mut self, audit: Arc<dyn LedgerAuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Returns the page size.
    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Returns a page iterator over `source`.
    pub fn pages<'a, S: BatchSource + ?Sized>(&self, source: &'a S) -> BatchPages<'a, S> {
        BatchPages::new(source, self.batch_size)
    }

    /// Applies `update` to every page of `source`.
    ///
    /// Each page is an independent unit of work; a failure stops the run and
    /// leaves earlier pages applied.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] from the source or the update unchanged.
    pub fn run<S, U>(&self, name: &str, source: &S, update: &U) -> Result<MigrationReport, StoreError>
    where
        S: BatchSource + ?Sized,
        U: BatchUpdate + ?Sized,
    {
        let mut report = MigrationReport::default();
        for page in self.pages(source) {
            let keys = page?;
            let updated = update.apply(&keys)?;
            let first = keys.first().copied().unwrap_or_default();
            let last = keys.last().copied().unwrap_or_default();
            self.audit.record_migration_page(&MigrationPageAuditEvent::new(
                name,
                report.pages,
                keys.len(),
                (first, last),
                updated,
            ));
            report.pages += 1;
            report.rows += keys.len();
            report.updated += updated;
        }
        self.audit.record_migration(&MigrationAuditEvent::new(
            name,
            report.pages,
            report.rows,
            report.updated,
        ));
        Ok(report)
    }
}

impl Default for BatchMigrator {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            audit: Arc::new(NoopAuditSink),
        }
    }
}

// ============================================================================
// SECTION: Confirm Active Users
// ============================================================================

/// Backfill that confirms active users who have logged in at least once.
///
/// Acts as both the source (unconfirmed, active, `last_login` set) and the
/// update (set confirmed on exactly the page ids).
pub struct ConfirmActiveUsers<'a, U: ?Sized> {
    /// Account store being migrated.
    store: &'a U,
}

impl<'a, U: UserAccountStore + ?Sized> ConfirmActiveUsers<'a, U> {
    /// Wraps a user account store.
    #[must_use]
    pub const fn new(store: &'a U) -> Self {
        Self {
            store,
        }
    }

    /// Runs the backfill with `migrator`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a query or update fails.
    pub fn run(&self, migrator: &BatchMigrator, name: &str) -> Result<MigrationReport, StoreError> {
        migrator.run(name, self, self)
    }
}

impl<U: UserAccountStore + ?Sized> BatchSource for ConfirmActiveUsers<'_, U> {
    fn keys_after(&self, after: RowKey, limit: usize) -> Result<Vec<RowKey>, StoreError> {
        self.store.confirmation_candidates_after(after, limit)
    }
}

impl<U: UserAccountStore + ?Sized> BatchUpdate for ConfirmActiveUsers<'_, U> {
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError> {
        self.store.confirm_users(keys)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
