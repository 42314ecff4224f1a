// crates/gift-ledger-core/src/runtime/store.rs
// ============================================================================
// Module: Gift Ledger In-Memory Stores
// Description: In-memory event and user account stores for tests and demos.
// Purpose: Provide deterministic store implementations without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides in-memory implementations of [`EventStore`] and
//! [`UserAccountStore`] for tests and local runs. They are not intended for
//! production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;

use crate::core::EventId;
use crate::core::GiftCardEvent;
use crate::core::GiftCardId;
use crate::core::NewGiftCardEvent;
use crate::core::Timestamp;
use crate::core::UserAccount;
use crate::core::UserId;
use crate::interfaces::EventStore;
use crate::interfaces::RowKey;
use crate::interfaces::StoreError;
use crate::interfaces::UserAccountStore;

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Event rows and the id counter guarded together.
#[derive(Debug, Default)]
struct EventLog {
    /// Last assigned event id (0 before the first insert).
    last_id: u64,
    /// Stored events in insertion order.
    events: Vec<GiftCardEvent>,
}

impl EventLog {
    /// Assigns the next id and appends the event.
    fn append(&mut self, event: NewGiftCardEvent) -> Result<GiftCardEvent, StoreError> {
        let next = self.last_id + 1;
        let id = EventId::from_raw(next)
            .ok_or_else(|| StoreError::Invalid("event id overflow".to_string()))?;
        self.last_id = next;
        let stored = GiftCardEvent::from_new(id, event, Timestamp::now());
        self.events.push(stored.clone());
        Ok(stored)
    }
}

/// In-memory gift card event store.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventStore {
    /// Event log protected by a mutex.
    log: Arc<Mutex<EventLog>>,
}

impl InMemoryEventStore {
    /// Creates an empty in-memory event store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every stored event in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn all_events(&self) -> Result<Vec<GiftCardEvent>, StoreError> {
        let guard = self
            .log
            .lock()
            .map_err(|_| StoreError::Store("event store mutex poisoned".to_string()))?;
        Ok(guard.events.clone())
    }
}

impl EventStore for InMemoryEventStore {
    fn insert(&self, event: NewGiftCardEvent) -> Result<GiftCardEvent, StoreError> {
        self.log
            .lock()
            .map_err(|_| StoreError::Store("event store mutex poisoned".to_string()))?
            .append(event)
    }

    fn insert_batch(
        &self,
        events: Vec<NewGiftCardEvent>,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let mut guard = self
            .log
            .lock()
            .map_err(|_| StoreError::Store("event store mutex poisoned".to_string()))?;
        let rollback_len = guard.events.len();
        let rollback_id = guard.last_id;
        let mut stored = Vec::with_capacity(events.len());
        for event in events {
            match guard.append(event) {
                Ok(record) => stored.push(record),
                Err(err) => {
                    guard.events.truncate(rollback_len);
                    guard.last_id = rollback_id;
                    return Err(err);
                }
            }
        }
        drop(guard);
        Ok(stored)
    }

    fn events_for_gift_card(
        &self,
        gift_card_id: GiftCardId,
    ) -> Result<Vec<GiftCardEvent>, StoreError> {
        let guard = self
            .log
            .lock()
            .map_err(|_| StoreError::Store("event store mutex poisoned".to_string()))?;
        Ok(guard.events.iter().filter(|event| event.gift_card_id == gift_card_id).cloned().collect())
    }
}

// ============================================================================
// SECTION: User Account Store
// ============================================================================

/// In-memory user account store keyed by id.
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserStore {
    /// Accounts protected by a mutex.
    users: Arc<Mutex<BTreeMap<RowKey, UserAccount>>>,
}

impl InMemoryUserStore {
    /// Creates an empty in-memory user store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces an account.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn upsert(&self, account: UserAccount) -> Result<(), StoreError> {
        self.users
            .lock()
            .map_err(|_| StoreError::Store("user store mutex poisoned".to_string()))?
            .insert(account.id.get(), account);
        Ok(())
    }

    /// Loads an account by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store mutex is poisoned.
    pub fn get(&self, id: UserId) -> Result<Option<UserAccount>, StoreError> {
        let guard = self
            .users
            .lock()
            .map_err(|_| StoreError::Store("user store mutex poisoned".to_string()))?;
        Ok(guard.get(&id.get()).cloned())
    }
}

impl UserAccountStore for InMemoryUserStore {
    fn confirmation_candidates_after(
        &self,
        after: RowKey,
        limit: usize,
    ) -> Result<Vec<RowKey>, StoreError> {
        let Some(first) = after.checked_add(1) else {
            return Ok(Vec::new());
        };
        let guard = self
            .users
            .lock()
            .map_err(|_| StoreError::Store("user store mutex poisoned".to_string()))?;
        let keys = guard
            .range(first..)
            .filter(|(_, account)| account.needs_confirmation())
            .map(|(key, _)| *key)
            .take(limit)
            .collect();
        Ok(keys)
    }

    fn confirm_users(&self, ids: &[RowKey]) -> Result<usize, StoreError> {
        let mut guard = self
            .users
            .lock()
            .map_err(|_| StoreError::Store("user store mutex poisoned".to_string()))?;
        let mut changed = 0;
        for id in ids {
            if let Some(account) = guard.get_mut(id)
                && !account.is_confirmed
            {
                account.is_confirmed = true;
                changed += 1;
            }
        }
        drop(guard);
        Ok(changed)
    }
}
