// crates/gift-ledger-cli/src/tests/mod.rs
// ============================================================================
// Module: CLI Library Unit Tests
// Description: Unit test modules for the CLI library.
// Purpose: Group crate-internal tests that need private catalog access.
// Dependencies: gift-ledger-cli i18n module
// ============================================================================

//! ## Overview
//! Unit tests for CLI library internals.

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

mod i18n;
