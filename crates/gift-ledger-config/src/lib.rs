// crates/gift-ledger-config/src/lib.rs
// ============================================================================
// Module: Gift Ledger Config Library
// Description: Canonical config model and fail-closed validation.
// Purpose: Single source of truth for gift-ledger.toml semantics.
// Dependencies: gift-ledger-core, gift-ledger-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `gift-ledger-config` defines the configuration model for the gift ledger
//! tools: which event store to open, how large migration pages are, and where
//! audit records go. Validation is strict and fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
