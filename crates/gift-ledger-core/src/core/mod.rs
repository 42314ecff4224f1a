// crates/gift-ledger-core/src/core/mod.rs
// ============================================================================
// Module: Gift Ledger Core Types
// Description: Canonical gift card, actor, and event structures.
// Purpose: Provide stable, serializable types shared by writers and stores.
// Dependencies: bigdecimal, serde, time
// ============================================================================

//! ## Overview
//! Gift ledger core types define identifiers, money, gift card snapshots,
//! actor attribution, user accounts, and the closed set of event payloads. Stores and the
//! CLI consume these types as the single source of truth for the event shape.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod actor;
pub mod event;
pub mod gift_card;
pub mod identifiers;
pub mod money;
pub mod temporal;
pub mod user;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use actor::Actor;
pub use actor::EventActor;
pub use actor::UserRef;
pub use actor::user_is_valid;
pub use event::ALL_EVENT_KINDS;
pub use event::BalanceResetBalance;
pub use event::BalanceResetParameters;
pub use event::BoughtParameters;
pub use event::EmailParameters;
pub use event::EventPayload;
pub use event::ExpiryDateParameters;
pub use event::GiftCardEvent;
pub use event::GiftCardEventKind;
pub use event::IssuedBalance;
pub use event::IssuedParameters;
pub use event::NewGiftCardEvent;
pub use event::NoteParameters;
pub use event::TagParameters;
pub use event::UsageBalance;
pub use event::UsedInOrderParameters;
pub use gift_card::GiftCard;
pub use identifiers::AppId;
pub use identifiers::EventId;
pub use identifiers::GiftCardId;
pub use identifiers::OrderId;
pub use identifiers::UserId;
pub use money::Amount;
pub use money::Currency;
pub use temporal::Timestamp;
pub use user::UserAccount;
