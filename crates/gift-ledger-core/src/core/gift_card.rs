// crates/gift-ledger-core/src/core/gift_card.rs
// ============================================================================
// Module: Gift Card Snapshot
// Description: Point-in-time view of a gift card supplied by mutation callers.
// Purpose: Carry the fields event payloads are derived from.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Callers hand the ledger writer the gift card as it is after a mutation and,
//! for change events, as it was before. The ledger reads these snapshots and
//! never writes them back.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Date;

use crate::core::identifiers::GiftCardId;
use crate::core::money::Amount;
use crate::core::money::Currency;
use crate::core::temporal::optional_date;

// ============================================================================
// SECTION: Gift Card
// ============================================================================

/// Gift card snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCard {
    /// Gift card identifier.
    pub id: GiftCardId,
    /// Redeemable code.
    pub code: String,
    /// Balance currency.
    pub currency: Currency,
    /// Balance at issue time.
    pub initial_balance: Amount,
    /// Remaining balance.
    pub current_balance: Amount,
    /// Optional expiry date.
    #[serde(with = "optional_date")]
    pub expiry_date: Option<Date>,
    /// Optional free-form tag.
    pub tag: Option<String>,
    /// Whether the card can currently be used.
    pub is_active: bool,
}
