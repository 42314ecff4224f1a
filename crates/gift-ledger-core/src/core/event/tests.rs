// crates/gift-ledger-core/src/core/event/tests.rs
// ============================================================================
// Module: Gift Card Event Unit Tests
// Description: Unit tests for kind labels and stored parameter decoding.
// Purpose: Pin the storage labels and reject parameters of the wrong shape.
// Dependencies: gift-ledger-core
// ============================================================================

//! ## Overview
//! Checks stable kind labels and payload reconstruction from stored rows.

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

use super::ALL_EVENT_KINDS;
use super::EventPayload;
use super::GiftCardEventKind;
use super::NoteParameters;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn kind_labels_are_stable() {
    let labels: Vec<&str> = ALL_EVENT_KINDS.iter().map(|kind| kind.as_str()).collect();
    assert_eq!(labels, vec![
        "issued",
        "sent_to_customer",
        "resent",
        "balance_reset",
        "expiry_date_updated",
        "tag_updated",
        "activated",
        "deactivated",
        "note_added",
        "used_in_order",
        "bought",
    ]);
}

#[test]
fn kind_parse_matches_serde_label() {
    for kind in ALL_EVENT_KINDS {
        assert_eq!(GiftCardEventKind::parse(kind.as_str()), Some(kind));
        assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_str()));
    }
    assert_eq!(GiftCardEventKind::parse("ISSUED"), None);
}

#[test]
fn from_parameters_rebuilds_stored_note() {
    let payload =
        EventPayload::from_parameters(GiftCardEventKind::NoteAdded, json!({"message": "hello"}))
            .unwrap();
    assert_eq!(
        payload,
        EventPayload::NoteAdded(NoteParameters {
            message: "hello".to_string()
        })
    );
}

#[test]
fn from_parameters_ignores_body_for_parameterless_kinds() {
    let payload = EventPayload::from_parameters(GiftCardEventKind::Deactivated, json!({})).unwrap();
    assert_eq!(payload, EventPayload::Deactivated);
}

#[test]
fn from_parameters_rejects_wrong_shape() {
    let result =
        EventPayload::from_parameters(GiftCardEventKind::UsedInOrder, json!({"message": "x"}));
    assert!(result.is_err());
}

#[test]
fn from_parameters_rejects_malformed_amount() {
    let result = EventPayload::from_parameters(
        GiftCardEventKind::Issued,
        json!({
            "balance": {
                "currency": "USD",
                "initial_balance": "fifty",
                "current_balance": "50"
            },
            "expiry_date": null
        }),
    );
    assert!(result.is_err());
}
