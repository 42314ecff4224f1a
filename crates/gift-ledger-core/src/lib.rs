// crates/gift-ledger-core/src/lib.rs
// ============================================================================
// Module: Gift Ledger Core Library
// Description: Public API surface for the gift ledger core.
// Purpose: Expose core types, interfaces, audit sinks, and runtime helpers.
// Dependencies: crate::{audit, core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Gift ledger core records an append-only history of gift card lifecycle
//! events and runs primary-key paged backfills over large tables. It is
//! backend-agnostic and integrates with storage through explicit interfaces.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use audit::FileAuditSink;
pub use audit::LedgerAuditSink;
pub use audit::NoopAuditSink;
pub use audit::StderrAuditSink;
pub use interfaces::BatchSource;
pub use interfaces::BatchUpdate;
pub use interfaces::EventStore;
pub use interfaces::RowKey;
pub use interfaces::StoreError;
pub use interfaces::UserAccountStore;
pub use runtime::BatchMigrator;
pub use runtime::BatchPages;
pub use runtime::ConfirmActiveUsers;
pub use runtime::DEFAULT_BATCH_SIZE;
pub use runtime::EventLedger;
pub use runtime::InMemoryEventStore;
pub use runtime::InMemoryUserStore;
pub use runtime::MigrationReport;
