// crates/gift-ledger-store-sqlite/src/migrations.rs
// ============================================================================
// Module: SQLite Data Migrations
// Description: Ordered, recorded schema and data migrations for the ledger store.
// Purpose: Apply account backfills in primary-key pages exactly once per database.
// Dependencies: gift-ledger-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! [`MIGRATIONS`] lists every migration in application order. Each applied
//! migration is recorded by name in `applied_migrations`;
//! [`SqliteLedgerStore::migrate`] runs only the pending ones. Data backfills
//! go through [`BatchMigrator`], so each page commits on its own and an
//! interrupted run resumes safely from scratch.

// ============================================================================
// SECTION: Imports
// ============================================================================

use gift_ledger_core::BatchMigrator;
use gift_ledger_core::BatchSource;
use gift_ledger_core::BatchUpdate;
use gift_ledger_core::ConfirmActiveUsers;
use gift_ledger_core::MigrationReport;
use gift_ledger_core::RowKey;
use gift_ledger_core::StoreError;
use gift_ledger_core::Timestamp;
use rusqlite::params;
use serde::Serialize;
use thiserror::Error;

use crate::store::JWT_TOKEN_KEY_COLUMN;
use crate::store::SqliteLedgerStore;
use crate::store::SqliteStoreError;
use crate::store::db_error;
use crate::store::generate_token_key;
use crate::store::has_column;
use crate::store::select_keys;
use crate::store::to_sql_key;
use crate::store::update_each;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while applying migrations.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// Migration bookkeeping failed.
    #[error("migration store error: {0}")]
    Store(String),
    /// A migration step failed; earlier pages of a backfill stay applied.
    #[error("migration {name} failed: {message}")]
    Failed {
        /// Migration name.
        name: String,
        /// Failure message.
        message: String,
    },
}

impl From<SqliteStoreError> for MigrationError {
    fn from(error: SqliteStoreError) -> Self {
        Self::Store(error.to_string())
    }
}

// ============================================================================
// SECTION: Migration Trait
// ============================================================================

/// One named schema or data migration.
pub trait Migration: Send + Sync {
    /// Returns the unique, ordered migration name.
    fn name(&self) -> &'static str;

    /// Applies the migration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when a schema change, query, or page update fails.
    fn apply(
        &self,
        store: &SqliteLedgerStore,
        migrator: &BatchMigrator,
    ) -> Result<MigrationReport, StoreError>;
}

/// Adds the per-user token signing key column and fills it for existing rows.
pub struct AddUserJwtTokenKey;

impl Migration for AddUserJwtTokenKey {
    fn name(&self) -> &'static str {
        "0046_user_jwt_token_key"
    }

    fn apply(
        &self,
        store: &SqliteLedgerStore,
        migrator: &BatchMigrator,
    ) -> Result<MigrationReport, StoreError> {
        store.with_connection(|connection| {
            if !has_column(connection, "users", JWT_TOKEN_KEY_COLUMN)? {
                connection
                    .execute_batch(&format!(
                        "ALTER TABLE users ADD COLUMN {JWT_TOKEN_KEY_COLUMN} TEXT;"
                    ))
                    .map_err(|err| db_error(&err))?;
            }
            Ok(())
        })?;
        let backfill = MissingTokenKeys {
            store,
        };
        migrator.run(self.name(), &backfill, &backfill)
    }
}

/// Marks active users who have logged in as confirmed.
pub struct ConfirmActiveUser;

impl Migration for ConfirmActiveUser {
    fn name(&self) -> &'static str {
        "0083_confirm_active_user"
    }

    fn apply(
        &self,
        store: &SqliteLedgerStore,
        migrator: &BatchMigrator,
    ) -> Result<MigrationReport, StoreError> {
        ConfirmActiveUsers::new(store).run(migrator, self.name())
    }
}

/// Every migration in application order.
pub static MIGRATIONS: &[&dyn Migration] = &[&AddUserJwtTokenKey, &ConfirmActiveUser];

// ============================================================================
// SECTION: Token Key Backfill
// ============================================================================

/// Users without a token key, paged by id.
struct MissingTokenKeys<'a> {
    /// Store being migrated.
    store: &'a SqliteLedgerStore,
}

impl BatchSource for MissingTokenKeys<'_> {
    fn keys_after(&self, after: RowKey, limit: usize) -> Result<Vec<RowKey>, StoreError> {
        let after = to_sql_key(after)?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let keys = self.store.with_connection(|connection| {
            select_keys(
                connection,
                "SELECT id FROM users WHERE jwt_token_key IS NULL AND id > ?1
                 ORDER BY id ASC LIMIT ?2",
                after,
                limit,
            )
        })?;
        Ok(keys)
    }
}

impl BatchUpdate for MissingTokenKeys<'_> {
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError> {
        let changed = self.store.with_connection(|connection| {
            update_each(connection, keys, |tx, id| {
                tx.execute("UPDATE users SET jwt_token_key = ?1 WHERE id = ?2", params![
                    generate_token_key(),
                    id
                ])
                .map_err(|err| db_error(&err))
            })
        })?;
        Ok(changed)
    }
}

// ============================================================================
// SECTION: Runner
// ============================================================================

/// Migration recorded as applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    /// Migration name.
    pub name: String,
    /// Time the migration finished.
    pub applied_at: Timestamp,
}

/// Result of one migration applied during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationOutcome {
    /// Migration name.
    pub name: &'static str,
    /// Backfill summary.
    pub report: MigrationReport,
}

/// Result of [`SqliteLedgerStore::migrate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationRunReport {
    /// Migrations applied by this run, in order.
    pub applied: Vec<MigrationOutcome>,
    /// Migrations skipped because they were already recorded.
    pub skipped: Vec<&'static str>,
}

impl SqliteLedgerStore {
    /// Lists applied migrations in application order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn applied_migrations(&self) -> Result<Vec<AppliedMigration>, SqliteStoreError> {
        self.with_connection(|connection| {
            let mut statement = connection
                .prepare("SELECT name, applied_at FROM applied_migrations ORDER BY rowid ASC")
                .map_err(|err| db_error(&err))?;
            let rows = statement
                .query_map([], |row| {
                    Ok(AppliedMigration {
                        name: row.get(0)?,
                        applied_at: Timestamp::from_unix_millis(row.get(1)?),
                    })
                })
                .map_err(|err| db_error(&err))?
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| db_error(&err))?;
            Ok(rows)
        })
    }

    /// Lists names of migrations not yet applied, in application order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the query fails.
    pub fn pending_migrations(&self) -> Result<Vec<&'static str>, SqliteStoreError> {
        let applied = self.applied_migrations()?;
        Ok(MIGRATIONS
            .iter()
            .map(|migration| migration.name())
            .filter(|name| !applied.iter().any(|record| record.name == *name))
            .collect())
    }

    /// Applies every pending migration in order and records each one.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError`] on the first failing migration; later
    /// migrations are not attempted.
    pub fn migrate(&self, migrator: &BatchMigrator) -> Result<MigrationRunReport, MigrationError> {
        let pending = self.pending_migrations()?;
        let mut run = MigrationRunReport::default();
        for migration in MIGRATIONS {
            let name = migration.name();
            if !pending.contains(&name) {
                run.skipped.push(name);
                continue;
            }
            let report = migration.apply(self, migrator).map_err(|err| MigrationError::Failed {
                name: name.to_string(),
                message: err.to_string(),
            })?;
            self.record_applied(name)?;
            run.applied.push(MigrationOutcome {
                name,
                report,
            });
        }
        Ok(run)
    }

    /// Records a migration as applied.
    fn record_applied(&self, name: &str) -> Result<(), SqliteStoreError> {
        self.with_connection(|connection| {
            connection
                .execute(
                    "INSERT INTO applied_migrations (name, applied_at) VALUES (?1, ?2)",
                    params![name, Timestamp::now().as_unix_millis()],
                )
                .map(|_| ())
                .map_err(|err| db_error(&err))
        })
    }
}
