// crates/gift-ledger-core/src/core/temporal.rs
// ============================================================================
// Module: Gift Ledger Time Model
// Description: Event timestamps and calendar-date wire formats.
// Purpose: Keep creation times and expiry dates in one stable representation.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! Event creation times are unix epoch milliseconds assigned by the store at
//! insert time. Gift card expiry dates are calendar dates without a time zone
//! and serialize as `YYYY-MM-DD` strings inside event parameters.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Creation timestamp of a ledger record (unix epoch milliseconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(value: i64) -> Self {
        Self(value)
    }

    /// Returns the current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self(i64::try_from(now.as_millis()).unwrap_or(i64::MAX))
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }
}

// ============================================================================
// SECTION: Calendar Dates
// ============================================================================

/// Wire format for calendar dates (`YYYY-MM-DD`).
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Formats a calendar date as `YYYY-MM-DD`.
///
/// # Errors
///
/// Returns [`time::error::Format`] when the date cannot be rendered.
pub fn format_date(date: Date) -> Result<String, time::error::Format> {
    date.format(DATE_FORMAT)
}

/// Parses a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`time::error::Parse`] when the input is not a valid date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value, DATE_FORMAT)
}

/// Serde adapter for optional calendar dates encoded as `YYYY-MM-DD` or null.
pub mod optional_date {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error as _;
    use serde::ser::Error as _;
    use time::Date;

    /// Serializes an optional date as a string or null.
    ///
    /// # Errors
    ///
    /// Returns the serializer error when formatting fails.
    pub fn serialize<S>(value: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => {
                let rendered = super::format_date(*date).map_err(S::Error::custom)?;
                serializer.serialize_some(&rendered)
            }
            None => serializer.serialize_none(),
        }
    }

    /// Deserializes an optional date from a string or null.
    ///
    /// # Errors
    ///
    /// Returns the deserializer error when the string is not a valid date.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|value| super::parse_date(&value).map_err(D::Error::custom)).transpose()
    }
}
