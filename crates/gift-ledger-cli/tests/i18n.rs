// crates/gift-ledger-cli/tests/i18n.rs
// ============================================================================
// Module: CLI i18n Tests
// Description: Exercises the translation catalog and placeholder substitution.
// Purpose: Ensure CLI user-facing strings route through stable i18n helpers.
// Dependencies: gift-ledger-cli i18n module and the `t!` macro.
// ============================================================================

//! ## Overview
//! Validates the gift ledger CLI i18n catalog behavior:
//! - Message arguments capture key/value substitutions.
//! - Translation falls back to keys on misses.
//! - The [`t!`](gift_ledger_cli::t) macro formats placeholders correctly.

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

use gift_ledger_cli::i18n::MessageArg;
use gift_ledger_cli::i18n::translate;
use gift_ledger_cli::t;

// ============================================================================
// SECTION: Tests
// ============================================================================

/// Confirms message arguments capture key/value pairs.
#[test]
fn message_arg_new_captures_key_and_value() {
    let arg = MessageArg::new("path", "/tmp/ledger.sqlite");
    assert_eq!(arg.key, "path");
    assert_eq!(arg.value, "/tmp/ledger.sqlite");
}

/// Confirms catalog entries resolve and replace placeholders.
#[test]
fn translate_substitutes_placeholders() {
    let args = vec![MessageArg::new("path", "/tmp/ledger.sqlite"), MessageArg::new("error", "busy")];
    let result = translate("store.open_failed", args);
    assert_eq!(result, "Failed to open ledger store at /tmp/ledger.sqlite: busy");
}

/// Confirms missing keys fall back to the key string.
#[test]
fn translate_falls_back_to_key() {
    let result = translate("missing.key", Vec::new());
    assert_eq!(result, "missing.key");
}

/// Confirms the t! macro formats named arguments.
#[test]
fn t_macro_formats_message() {
    let rendered = t!("main.version", version = "0.1.0");
    assert_eq!(rendered, "gift-ledger 0.1.0");
}

/// Confirms numeric arguments render through `to_string`.
#[test]
fn t_macro_accepts_display_values() {
    let rendered = t!("events.load_failed", id = 42_u64, error = "store unavailable");
    assert_eq!(rendered, "Failed to load events for gift card 42: store unavailable");
}
