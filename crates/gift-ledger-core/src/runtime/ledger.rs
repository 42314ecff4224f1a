// crates/gift-ledger-core/src/runtime/ledger.rs
// ============================================================================
// Module: Gift Card Event Ledger
// Description: Writer that appends gift card lifecycle events.
// Purpose: Build kind-specific payloads and persist them with normalized actors.
// Dependencies: crate::{audit, core, interfaces}
// ============================================================================

//! ## Overview
//! [`EventLedger`] exposes one operation per gift card lifecycle action.
//! Single-card operations issue exactly one store insert. Bulk operations
//! build one event per input element and persist them through a single
//! [`EventStore::insert_batch`] call.
//!
//! Every operation normalizes its actor independently: a user failing
//! [`user_is_valid`] is stored as no user, while an app is kept as supplied.
//! Store errors are returned unchanged; nothing is retried.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::audit::EventWriteAuditEvent;
use crate::audit::EventWriteAuditParams;
use crate::audit::LedgerAuditSink;
use crate::audit::NoopAuditSink;
use crate::core::Actor;
use crate::core::Amount;
use crate::core::BalanceResetBalance;
use crate::core::BalanceResetParameters;
use crate::core::BoughtParameters;
use crate::core::EmailParameters;
use crate::core::EventActor;
use crate::core::EventPayload;
use crate::core::ExpiryDateParameters;
use crate::core::GiftCard;
use crate::core::GiftCardEvent;
use crate::core::GiftCardEventKind;
use crate::core::GiftCardId;
use crate::core::IssuedBalance;
use crate::core::IssuedParameters;
use crate::core::NewGiftCardEvent;
use crate::core::NoteParameters;
use crate::core::OrderId;
use crate::core::TagParameters;
use crate::core::UsageBalance;
use crate::core::UsedInOrderParameters;
use crate::core::user_is_valid;
use crate::interfaces::EventStore;
use crate::interfaces::StoreError;

// ============================================================================
// SECTION: Ledger
// ============================================================================

/// Append-only writer for gift card events.
pub struct EventLedger<S> {
    /// Backing event store.
    store: S,
    /// Audit sink for write activity.
    audit: Arc<dyn LedgerAuditSink>,
}

impl<S: EventStore> EventLedger<S> {
    /// Creates a ledger over `store` that discards audit events.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self::with_audit(store, Arc::new(NoopAuditSink))
    }

    /// Creates a ledger over `store` reporting writes to `audit`.
    #[must_use]
    pub fn with_audit(store: S, audit: Arc<dyn LedgerAuditSink>) -> Self {
        Self {
            store,
            audit,
        }
    }

    /// Returns the backing store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    // ------------------------------------------------------------------------
    // Single-card events
    // ------------------------------------------------------------------------

    /// Records that `card` was issued.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_issued(
        &self,
        card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::Issued(IssuedParameters {
            balance: IssuedBalance {
                currency: card.currency.clone(),
                initial_balance: card.initial_balance.clone(),
                current_balance: card.current_balance.clone(),
            },
            expiry_date: card.expiry_date,
        });
        self.write_one(card.id, actor, payload)
    }

    /// Records that the card was sent to `email`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_sent(
        &self,
        gift_card_id: GiftCardId,
        actor: &Actor,
        email: &str,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::SentToCustomer(EmailParameters {
            email: email.to_string(),
        });
        self.write_one(gift_card_id, actor, payload)
    }

    /// Records that the card was sent to `email` again.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_resent(
        &self,
        gift_card_id: GiftCardId,
        actor: &Actor,
        email: &str,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::Resent(EmailParameters {
            email: email.to_string(),
        });
        self.write_one(gift_card_id, actor, payload)
    }

    /// Records a balance reset from `old_card` to `card`.
    ///
    /// `old_currency` is taken from `card`, not `old_card`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_balance_reset(
        &self,
        card: &GiftCard,
        old_card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::BalanceReset(BalanceResetParameters {
            balance: BalanceResetBalance {
                currency: card.currency.clone(),
                initial_balance: card.initial_balance.clone(),
                current_balance: card.current_balance.clone(),
                old_currency: card.currency.clone(),
                old_initial_balance: old_card.initial_balance.clone(),
                old_current_balance: old_card.current_balance.clone(),
            },
        });
        self.write_one(card.id, actor, payload)
    }

    /// Records an expiry date change from `old_card` to `card`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_expiry_date_updated(
        &self,
        card: &GiftCard,
        old_card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::ExpiryDateUpdated(ExpiryDateParameters {
            expiry_date: card.expiry_date,
            old_expiry_date: old_card.expiry_date,
        });
        self.write_one(card.id, actor, payload)
    }

    /// Records a tag change from `old_card` to `card`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_tag_updated(
        &self,
        card: &GiftCard,
        old_card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::TagUpdated(TagParameters {
            tag: card.tag.clone(),
            old_tag: old_card.tag.clone(),
        });
        self.write_one(card.id, actor, payload)
    }

    /// Records that `card` was activated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_activated(
        &self,
        card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        self.write_one(card.id, actor, EventPayload::Activated)
    }

    /// Records that `card` was deactivated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_deactivated(
        &self,
        card: &GiftCard,
        actor: &Actor,
    ) -> Result<GiftCardEvent, StoreError> {
        self.write_one(card.id, actor, EventPayload::Deactivated)
    }

    /// Records a staff note on `card`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the insert fails.
    pub fn gift_card_note_added(
        &self,
        card: &GiftCard,
        actor: &Actor,
        message: &str,
    ) -> Result<GiftCardEvent, StoreError> {
        let payload = EventPayload::NoteAdded(NoteParameters {
            message: message.to_string(),
        });
        self.write_one(card.id, actor, payload)
    }

    // ------------------------------------------------------------------------
    // Bulk events
    // ------------------------------------------------------------------------

    /// Records activation of every card in `gift_card_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the batched insert fails.
    pub fn gift_cards_activated(
        &self,
        gift_card_ids: &[GiftCardId],
        actor: &Actor,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let items = gift_card_ids.iter().map(|id| (*id, EventPayload::Activated)).collect();
        self.write_many(GiftCardEventKind::Activated, actor, items)
    }

    /// Records deactivation of every card in `gift_card_ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the batched insert fails.
    pub fn gift_cards_deactivated(
        &self,
        gift_card_ids: &[GiftCardId],
        actor: &Actor,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let items = gift_card_ids.iter().map(|id| (*id, EventPayload::Deactivated)).collect();
        self.write_many(GiftCardEventKind::Deactivated, actor, items)
    }

    /// Records that each card paid for `order_id`, given its balance before
    /// the order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the batched insert fails.
    pub fn gift_cards_used_in_order(
        &self,
        balance_data: &[(GiftCard, Amount)],
        order_id: OrderId,
        actor: &Actor,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let items = balance_data
            .iter()
            .map(|(card, previous_balance)| {
                let payload = EventPayload::UsedInOrder(UsedInOrderParameters {
                    order_id,
                    balance: UsageBalance {
                        currency: card.currency.clone(),
                        current_balance: card.current_balance.clone(),
                        old_current_balance: previous_balance.clone(),
                    },
                });
                (card.id, payload)
            })
            .collect();
        self.write_many(GiftCardEventKind::UsedInOrder, actor, items)
    }

    /// Records that each card was bought in `order_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the batched insert fails.
    pub fn gift_cards_bought(
        &self,
        cards: &[GiftCard],
        order_id: OrderId,
        actor: &Actor,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let items = cards
            .iter()
            .map(|card| {
                let payload = EventPayload::Bought(BoughtParameters {
                    order_id,
                    expiry_date: card.expiry_date,
                });
                (card.id, payload)
            })
            .collect();
        self.write_many(GiftCardEventKind::Bought, actor, items)
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    /// Normalizes the actor and inserts one event.
    fn write_one(
        &self,
        gift_card_id: GiftCardId,
        actor: &Actor,
        payload: EventPayload,
    ) -> Result<GiftCardEvent, StoreError> {
        let stored_actor = actor.normalize();
        let kind = payload.kind();
        let event = self.store.insert(NewGiftCardEvent {
            gift_card_id,
            actor: stored_actor,
            payload,
        })?;
        self.record_write(kind, 1, false, actor, stored_actor);
        Ok(event)
    }

    /// Normalizes the actor once and inserts all events in one batched call.
    ///
    /// An empty input performs no store call.
    fn write_many(
        &self,
        kind: GiftCardEventKind,
        actor: &Actor,
        items: Vec<(GiftCardId, EventPayload)>,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        if items.is_empty() {
            return Ok(Vec::new());
        }
        let stored_actor = actor.normalize();
        let events: Vec<NewGiftCardEvent> = items
            .into_iter()
            .map(|(gift_card_id, payload)| NewGiftCardEvent {
                gift_card_id,
                actor: stored_actor,
                payload,
            })
            .collect();
        let written = self.store.insert_batch(events)?;
        self.record_write(kind, written.len(), true, actor, stored_actor);
        Ok(written)
    }

    /// Emits the audit record for a completed write.
    fn record_write(
        &self,
        kind: GiftCardEventKind,
        count: usize,
        batched: bool,
        supplied: &Actor,
        stored: EventActor,
    ) {
        let user_dropped = match supplied {
            Actor::User(user)
            | Actor::UserViaApp {
                user, ..
            } => !user_is_valid(user),
            Actor::None | Actor::App(_) => false,
        };
        self.audit.record_event_write(&EventWriteAuditEvent::new(EventWriteAuditParams {
            kind,
            count,
            batched,
            actor: stored,
            user_dropped,
        }));
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
