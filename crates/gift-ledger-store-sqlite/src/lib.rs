// crates/gift-ledger-store-sqlite/src/lib.rs
// ============================================================================
// Module: SQLite Ledger Store
// Description: Durable gift card ledger backend using SQLite WAL.
// Purpose: Provide production persistence for events and account backfills.
// Dependencies: gift-ledger-core, rusqlite
// ============================================================================

//! ## Overview
//! This crate provides a SQLite-backed [`gift_ledger_core::EventStore`] and
//! [`gift_ledger_core::UserAccountStore`], plus an ordered migration runner
//! that records what it has applied. Security posture: storage inputs are
//! untrusted and fail closed on decode errors.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod migrations;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use migrations::AddUserJwtTokenKey;
pub use migrations::AppliedMigration;
pub use migrations::ConfirmActiveUser;
pub use migrations::MIGRATIONS;
pub use migrations::Migration;
pub use migrations::MigrationError;
pub use migrations::MigrationOutcome;
pub use migrations::MigrationRunReport;
pub use store::DEFAULT_BUSY_TIMEOUT_MS;
pub use store::JWT_TOKEN_KEY_LENGTH;
pub use store::NewUserAccount;
pub use store::SqliteLedgerStore;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
