// crates/gift-ledger-core/src/core/money.rs
// ============================================================================
// Module: Gift Ledger Money
// Description: Currency codes and arbitrary-precision amounts.
// Purpose: Represent gift card balances without floating-point drift.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! Balances are stored as [`BigDecimal`] values and serialize as decimal
//! strings (`"50"`, `"12.50"`) so event parameters never lose precision.
//! Scale is preserved exactly as supplied by the caller.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as _;

// ============================================================================
// SECTION: Currency
// ============================================================================

/// ISO 4217 currency code as provided by the catalogue (for example `USD`).
///
/// # Invariants
/// - Opaque string; no normalization or validation is applied by this type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    /// Creates a new currency code.
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Returns the currency code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for Currency {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// SECTION: Amount
// ============================================================================

/// Monetary amount with arbitrary precision.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigDecimal);

impl Amount {
    /// Wraps a decimal value.
    #[must_use]
    pub const fn new(value: BigDecimal) -> Self {
        Self(value)
    }

    /// Returns the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> &BigDecimal {
        &self.0
    }

    /// Parses an amount from its decimal string form.
    ///
    /// # Errors
    ///
    /// Returns [`bigdecimal::ParseBigDecimalError`] when the input is not a decimal.
    pub fn parse(value: &str) -> Result<Self, bigdecimal::ParseBigDecimalError> {
        BigDecimal::from_str(value).map(Self)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<u32> for Amount {
    fn from(value: u32) -> Self {
        Self(BigDecimal::from(value))
    }
}

impl From<BigDecimal> for Amount {
    fn from(value: BigDecimal) -> Self {
        Self(value)
    }
}

impl Serialize for Amount {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(D::Error::custom)
    }
}
