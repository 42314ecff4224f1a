// crates/gift-ledger-core/src/runtime/mod.rs
// ============================================================================
// Module: Gift Ledger Runtime
// Description: Event ledger writer, batched table migrator, and in-memory stores.
// Purpose: Drive event writes and data backfills through the storage interfaces.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! Runtime modules implement the write side of the gift card ledger and the
//! paged backfill runner. Both talk to storage only through
//! [`crate::interfaces`]; neither depends on the other.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod ledger;
pub mod migrator;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use ledger::EventLedger;
pub use migrator::BatchMigrator;
pub use migrator::BatchPages;
pub use migrator::ConfirmActiveUsers;
pub use migrator::DEFAULT_BATCH_SIZE;
pub use migrator::MigrationReport;
pub use store::InMemoryEventStore;
pub use store::InMemoryUserStore;
