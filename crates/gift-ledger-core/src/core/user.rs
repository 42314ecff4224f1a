// crates/gift-ledger-core/src/core/user.rs
// ============================================================================
// Module: Gift Ledger User Accounts
// Description: User account rows visited by the confirmation backfill.
// Purpose: Describe the account fields that batch migrations read and update.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`UserAccount`] is the stored form of a staff or customer account. The
//! event ledger only references users by id; the batch migrator reads the
//! confirmation flags and login marker.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::UserId;
use crate::core::temporal::Timestamp;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    /// Account identifier.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Whether the account may sign in.
    pub is_active: bool,
    /// Whether the email address has been confirmed.
    pub is_confirmed: bool,
    /// Most recent login, if any.
    pub last_login: Option<Timestamp>,
    /// Per-user token signing key; absent until the key column exists.
    pub jwt_token_key: Option<String>,
}

impl UserAccount {
    /// Returns true when the confirmation backfill should confirm this account.
    #[must_use]
    pub const fn needs_confirmation(&self) -> bool {
        !self.is_confirmed && self.is_active && self.last_login.is_some()
    }
}
