// crates/gift-ledger-core/src/core/event.rs
// ============================================================================
// Module: Gift Card Events
// Description: Event kinds, typed parameter payloads, and ledger records.
// Purpose: Give every event kind exactly one parameter schema.
// Dependencies: serde, serde_json, time
// ============================================================================

//! ## Overview
//! [`EventPayload`] is a closed set of variants, one per
//! [`GiftCardEventKind`], each carrying its own parameter struct. Stores
//! persist the kind label and the JSON form of the parameters separately and
//! rebuild the payload with [`EventPayload::from_parameters`].
//!
//! ## Invariants
//! - The parameter shape is determined solely by the kind.
//! - Kinds without parameters persist an empty JSON object.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use time::Date;

use crate::core::actor::EventActor;
use crate::core::identifiers::EventId;
use crate::core::identifiers::GiftCardId;
use crate::core::identifiers::OrderId;
use crate::core::money::Amount;
use crate::core::money::Currency;
use crate::core::temporal::Timestamp;
use crate::core::temporal::optional_date;

// ============================================================================
// SECTION: Event Kinds
// ============================================================================

/// Gift card lifecycle event kind.
///
/// # Invariants
/// - Labels returned by [`Self::as_str`] are stable storage values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardEventKind {
    /// Card was issued.
    Issued,
    /// Card was sent to a customer.
    SentToCustomer,
    /// Card was sent again.
    Resent,
    /// Card balance was reset.
    BalanceReset,
    /// Card expiry date changed.
    ExpiryDateUpdated,
    /// Card tag changed.
    TagUpdated,
    /// Card was activated.
    Activated,
    /// Card was deactivated.
    Deactivated,
    /// Staff note was added.
    NoteAdded,
    /// Card balance was spent on an order.
    UsedInOrder,
    /// Card was bought as part of an order.
    Bought,
}

/// Every event kind in declaration order.
pub const ALL_EVENT_KINDS: [GiftCardEventKind; 11] = [
    GiftCardEventKind::Issued,
    GiftCardEventKind::SentToCustomer,
    GiftCardEventKind::Resent,
    GiftCardEventKind::BalanceReset,
    GiftCardEventKind::ExpiryDateUpdated,
    GiftCardEventKind::TagUpdated,
    GiftCardEventKind::Activated,
    GiftCardEventKind::Deactivated,
    GiftCardEventKind::NoteAdded,
    GiftCardEventKind::UsedInOrder,
    GiftCardEventKind::Bought,
];

impl GiftCardEventKind {
    /// Returns the stable storage label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::SentToCustomer => "sent_to_customer",
            Self::Resent => "resent",
            Self::BalanceReset => "balance_reset",
            Self::ExpiryDateUpdated => "expiry_date_updated",
            Self::TagUpdated => "tag_updated",
            Self::Activated => "activated",
            Self::Deactivated => "deactivated",
            Self::NoteAdded => "note_added",
            Self::UsedInOrder => "used_in_order",
            Self::Bought => "bought",
        }
    }

    /// Parses a storage label back into a kind.
    #[must_use]
    pub fn parse(label: &str) -> Option<Self> {
        ALL_EVENT_KINDS.into_iter().find(|kind| kind.as_str() == label)
    }
}

impl fmt::Display for GiftCardEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Parameter Payloads
// ============================================================================

/// Balance snapshot recorded when a card is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedBalance {
    /// Balance currency.
    pub currency: Currency,
    /// Initial balance.
    pub initial_balance: Amount,
    /// Current balance.
    pub current_balance: Amount,
}

/// Parameters for [`GiftCardEventKind::Issued`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedParameters {
    /// Balance at issue time.
    pub balance: IssuedBalance,
    /// Expiry date at issue time.
    #[serde(with = "optional_date")]
    pub expiry_date: Option<Date>,
}

/// Parameters for [`GiftCardEventKind::SentToCustomer`] and [`GiftCardEventKind::Resent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailParameters {
    /// Recipient address.
    pub email: String,
}

/// Balance change recorded on a reset.
///
/// `old_currency` carries the currency of the card after the reset; readers
/// must not treat it as the pre-reset currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResetBalance {
    /// Currency after the reset.
    pub currency: Currency,
    /// Initial balance after the reset.
    pub initial_balance: Amount,
    /// Current balance after the reset.
    pub current_balance: Amount,
    /// Currency label stored alongside the old amounts.
    pub old_currency: Currency,
    /// Initial balance before the reset.
    pub old_initial_balance: Amount,
    /// Current balance before the reset.
    pub old_current_balance: Amount,
}

/// Parameters for [`GiftCardEventKind::BalanceReset`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceResetParameters {
    /// Balance before and after the reset.
    pub balance: BalanceResetBalance,
}

/// Parameters for [`GiftCardEventKind::ExpiryDateUpdated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpiryDateParameters {
    /// New expiry date.
    #[serde(with = "optional_date")]
    pub expiry_date: Option<Date>,
    /// Previous expiry date.
    #[serde(with = "optional_date")]
    pub old_expiry_date: Option<Date>,
}

/// Parameters for [`GiftCardEventKind::TagUpdated`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagParameters {
    /// New tag.
    pub tag: Option<String>,
    /// Previous tag.
    pub old_tag: Option<String>,
}

/// Parameters for [`GiftCardEventKind::NoteAdded`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteParameters {
    /// Note text.
    pub message: String,
}

/// Balance change recorded when a card pays for an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageBalance {
    /// Balance currency.
    pub currency: Currency,
    /// Balance after the order.
    pub current_balance: Amount,
    /// Balance before the order.
    pub old_current_balance: Amount,
}

/// Parameters for [`GiftCardEventKind::UsedInOrder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedInOrderParameters {
    /// Order the card paid for.
    pub order_id: OrderId,
    /// Balance change.
    pub balance: UsageBalance,
}

/// Parameters for [`GiftCardEventKind::Bought`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoughtParameters {
    /// Order the card was bought in.
    pub order_id: OrderId,
    /// Expiry date of the bought card.
    #[serde(with = "optional_date")]
    pub expiry_date: Option<Date>,
}

// ============================================================================
// SECTION: Payload
// ============================================================================

/// Kind-specific event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "parameters", rename_all = "snake_case")]
pub enum EventPayload {
    /// See [`GiftCardEventKind::Issued`].
    Issued(IssuedParameters),
    /// See [`GiftCardEventKind::SentToCustomer`].
    SentToCustomer(EmailParameters),
    /// See [`GiftCardEventKind::Resent`].
    Resent(EmailParameters),
    /// See [`GiftCardEventKind::BalanceReset`].
    BalanceReset(BalanceResetParameters),
    /// See [`GiftCardEventKind::ExpiryDateUpdated`].
    ExpiryDateUpdated(ExpiryDateParameters),
    /// See [`GiftCardEventKind::TagUpdated`].
    TagUpdated(TagParameters),
    /// See [`GiftCardEventKind::Activated`].
    Activated,
    /// See [`GiftCardEventKind::Deactivated`].
    Deactivated,
    /// See [`GiftCardEventKind::NoteAdded`].
    NoteAdded(NoteParameters),
    /// See [`GiftCardEventKind::UsedInOrder`].
    UsedInOrder(UsedInOrderParameters),
    /// See [`GiftCardEventKind::Bought`].
    Bought(BoughtParameters),
}

impl EventPayload {
    /// Returns the kind this payload belongs to.
    #[must_use]
    pub const fn kind(&self) -> GiftCardEventKind {
        match self {
            Self::Issued(_) => GiftCardEventKind::Issued,
            Self::SentToCustomer(_) => GiftCardEventKind::SentToCustomer,
            Self::Resent(_) => GiftCardEventKind::Resent,
            Self::BalanceReset(_) => GiftCardEventKind::BalanceReset,
            Self::ExpiryDateUpdated(_) => GiftCardEventKind::ExpiryDateUpdated,
            Self::TagUpdated(_) => GiftCardEventKind::TagUpdated,
            Self::Activated => GiftCardEventKind::Activated,
            Self::Deactivated => GiftCardEventKind::Deactivated,
            Self::NoteAdded(_) => GiftCardEventKind::NoteAdded,
            Self::UsedInOrder(_) => GiftCardEventKind::UsedInOrder,
            Self::Bought(_) => GiftCardEventKind::Bought,
        }
    }

    /// Returns the stored parameter mapping for this payload.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when a parameter cannot be rendered.
    pub fn parameters(&self) -> Result<Value, serde_json::Error> {
        match self {
            Self::Issued(parameters) => serde_json::to_value(parameters),
            Self::SentToCustomer(parameters) | Self::Resent(parameters) => {
                serde_json::to_value(parameters)
            }
            Self::BalanceReset(parameters) => serde_json::to_value(parameters),
            Self::ExpiryDateUpdated(parameters) => serde_json::to_value(parameters),
            Self::TagUpdated(parameters) => serde_json::to_value(parameters),
            Self::Activated | Self::Deactivated => Ok(Value::Object(Map::new())),
            Self::NoteAdded(parameters) => serde_json::to_value(parameters),
            Self::UsedInOrder(parameters) => serde_json::to_value(parameters),
            Self::Bought(parameters) => serde_json::to_value(parameters),
        }
    }

    /// Rebuilds a payload from a stored kind and parameter mapping.
    ///
    /// # Errors
    ///
    /// Returns [`serde_json::Error`] when the parameters do not match the
    /// schema of `kind`.
    pub fn from_parameters(
        kind: GiftCardEventKind,
        parameters: Value,
    ) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            GiftCardEventKind::Issued => Self::Issued(serde_json::from_value(parameters)?),
            GiftCardEventKind::SentToCustomer => {
                Self::SentToCustomer(serde_json::from_value(parameters)?)
            }
            GiftCardEventKind::Resent => Self::Resent(serde_json::from_value(parameters)?),
            GiftCardEventKind::BalanceReset => {
                Self::BalanceReset(serde_json::from_value(parameters)?)
            }
            GiftCardEventKind::ExpiryDateUpdated => {
                Self::ExpiryDateUpdated(serde_json::from_value(parameters)?)
            }
            GiftCardEventKind::TagUpdated => Self::TagUpdated(serde_json::from_value(parameters)?),
            GiftCardEventKind::Activated => Self::Activated,
            GiftCardEventKind::Deactivated => Self::Deactivated,
            GiftCardEventKind::NoteAdded => Self::NoteAdded(serde_json::from_value(parameters)?),
            GiftCardEventKind::UsedInOrder => {
                Self::UsedInOrder(serde_json::from_value(parameters)?)
            }
            GiftCardEventKind::Bought => Self::Bought(serde_json::from_value(parameters)?),
        })
    }
}

// ============================================================================
// SECTION: Records
// ============================================================================

/// Event awaiting insertion; the store assigns id and creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGiftCardEvent {
    /// Gift card the event concerns.
    pub gift_card_id: GiftCardId,
    /// Normalized actor.
    pub actor: EventActor,
    /// Kind-specific payload.
    pub payload: EventPayload,
}

impl NewGiftCardEvent {
    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> GiftCardEventKind {
        self.payload.kind()
    }
}

/// Persisted, immutable gift card event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftCardEvent {
    /// Event identifier.
    pub id: EventId,
    /// Gift card the event concerns.
    pub gift_card_id: GiftCardId,
    /// Normalized actor.
    pub actor: EventActor,
    /// Kind-specific payload.
    #[serde(flatten)]
    pub payload: EventPayload,
    /// Creation time.
    pub created_at: Timestamp,
}

impl GiftCardEvent {
    /// Materializes a stored event from an insert request.
    #[must_use]
    pub fn from_new(id: EventId, event: NewGiftCardEvent, created_at: Timestamp) -> Self {
        Self {
            id,
            gift_card_id: event.gift_card_id,
            actor: event.actor,
            payload: event.payload,
            created_at,
        }
    }

    /// Returns the event kind.
    #[must_use]
    pub const fn kind(&self) -> GiftCardEventKind {
        self.payload.kind()
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
