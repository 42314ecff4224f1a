// crates/gift-ledger-core/src/core/actor/tests.rs
// ============================================================================
// Module: Gift Ledger Actor Unit Tests
// Description: Unit tests for user validity and actor normalization.
// Purpose: Ensure invalid users never reach storage and apps pass through.
// Dependencies: gift-ledger-core
// ============================================================================

//! ## Overview
//! Covers every actor shape against the user validity predicate.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::json;

use super::Actor;
use super::EventActor;
use super::UserRef;
use super::user_is_valid;
use crate::core::identifiers::AppId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn user_validity_requires_active_registered_user() {
    let id = UserId::from_raw(1).unwrap();
    assert!(user_is_valid(&UserRef::active(id)));
    assert!(!user_is_valid(&UserRef::Anonymous));
    assert!(!user_is_valid(&UserRef::Registered {
        id,
        is_active: false
    }));
}

#[test]
fn normalize_keeps_app_even_without_user() {
    let app = AppId::from_raw(4).unwrap();
    assert_eq!(Actor::App(app).normalize(), EventActor::App {
        app
    });
    assert_eq!(
        Actor::UserViaApp {
            user: UserRef::Anonymous,
            app
        }
        .normalize(),
        EventActor::App {
            app
        }
    );
}

#[test]
fn normalize_drops_invalid_user() {
    let actor = Actor::User(UserRef::Registered {
        id: UserId::from_raw(2).unwrap(),
        is_active: false,
    });
    assert_eq!(actor.normalize(), EventActor::None);
    assert_eq!(Actor::None.normalize(), EventActor::None);
}

#[test]
fn event_actor_serializes_with_kind_tag() {
    let actor = EventActor::UserViaApp {
        user: UserId::from_raw(3).unwrap(),
        app: AppId::from_raw(9).unwrap(),
    };
    assert_eq!(
        serde_json::to_value(actor).unwrap(),
        json!({"kind": "user_via_app", "user": 3, "app": 9})
    );
    assert_eq!(serde_json::to_value(EventActor::None).unwrap(), json!({"kind": "none"}));
}
