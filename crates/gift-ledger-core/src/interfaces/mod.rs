// crates/gift-ledger-core/src/interfaces/mod.rs
// ============================================================================
// Module: Gift Ledger Interfaces
// Description: Storage traits consumed by the ledger writer and batch migrator.
// Purpose: Keep the core backend-agnostic through explicit storage contracts.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The ledger writer appends through [`EventStore`]; the batch migrator walks
//! tables through [`BatchSource`] and writes through [`BatchUpdate`]. Backends
//! implement these traits; the core never talks to a database directly.
//!
//! All calls are synchronous. Storage failures are reported as
//! [`StoreError`] and propagated to callers without retries.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::GiftCardEvent;
use crate::core::GiftCardId;
use crate::core::NewGiftCardEvent;

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage errors surfaced by ledger backends.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store I/O error.
    #[error("ledger store io error: {0}")]
    Io(String),
    /// Store data is corrupted or fails integrity checks.
    #[error("ledger store corruption: {0}")]
    Corrupt(String),
    /// Store data version is incompatible.
    #[error("ledger store version mismatch: {0}")]
    VersionMismatch(String),
    /// Store data is invalid.
    #[error("ledger store invalid data: {0}")]
    Invalid(String),
    /// A referential or uniqueness constraint rejected the write.
    #[error("ledger store constraint violation: {0}")]
    Constraint(String),
    /// Store reported an error.
    #[error("ledger store error: {0}")]
    Store(String),
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Append-only persistence for gift card events.
pub trait EventStore {
    /// Inserts a single event and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    fn insert(&self, event: NewGiftCardEvent) -> Result<GiftCardEvent, StoreError>;

    /// Inserts all events in one atomic call, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails; no event is stored.
    fn insert_batch(&self, events: Vec<NewGiftCardEvent>)
    -> Result<Vec<GiftCardEvent>, StoreError>;

    /// Returns all events for a gift card ordered by event id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when loading fails.
    fn events_for_gift_card(&self, gift_card_id: GiftCardId)
    -> Result<Vec<GiftCardEvent>, StoreError>;
}

// ============================================================================
// SECTION: Batched Table Access
// ============================================================================

/// Primary key of a row visited by the batch migrator.
///
/// Zero is the "before the first row" sentinel; real keys are >= 1.
pub type RowKey = u64;

/// Filtered, primary-key ordered query over a table.
pub trait BatchSource {
    /// Returns up to `limit` keys strictly greater than `after` that match the
    /// source filter, in ascending key order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn keys_after(&self, after: RowKey, limit: usize) -> Result<Vec<RowKey>, StoreError>;
}

/// Idempotent update applied to an exact set of rows.
pub trait BatchUpdate {
    /// Applies the update to exactly the rows in `keys` and returns the
    /// number of rows changed.
    ///
    /// Implementations must select rows by key only, never by re-applying
    /// the source filter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn apply(&self, keys: &[RowKey]) -> Result<usize, StoreError>;
}

// ============================================================================
// SECTION: User Accounts
// ============================================================================

/// User account table operations needed by the confirmation backfill.
pub trait UserAccountStore {
    /// Returns up to `limit` ids of users that are unconfirmed, active, and
    /// have logged in at least once, with id strictly greater than `after`,
    /// in ascending id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the query fails.
    fn confirmation_candidates_after(
        &self,
        after: RowKey,
        limit: usize,
    ) -> Result<Vec<RowKey>, StoreError>;

    /// Marks the given users as confirmed and returns how many were not
    /// confirmed before the call.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the update fails.
    fn confirm_users(&self, ids: &[RowKey]) -> Result<usize, StoreError>;
}
