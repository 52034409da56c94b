//! # Temporal Types
//!
//! UTC-only timestamp type. All timestamps in the protocol are stored in
//! UTC and serialized as ISO 8601 with exactly three fractional digits and
//! a trailing `Z` (e.g. `2026-01-15T12:00:00.000Z`). Millisecond precision
//! is significant: lineage entries are ordered by string comparison of
//! these values.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimestampParseError;

/// A UTC timestamp with millisecond precision.
///
/// `Display` and [`Timestamp::to_millis_string`] render the canonical wire
/// form `YYYY-MM-DDTHH:MM:SS.mmmZ`. The canonical string form sorts
/// lexicographically in chronological order, which lineage verification
/// relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create a timestamp for the current UTC time.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `chrono::DateTime<Utc>`.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Parse an ISO 8601 / RFC 3339 timestamp string.
    ///
    /// Accepts a trailing `Z` or a numeric offset; the result is
    /// normalized to UTC.
    pub fn parse(s: &str) -> Result<Self, TimestampParseError> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| TimestampParseError {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }

    /// Access the underlying `chrono::DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Render the canonical wire form with exactly three fractional
    /// digits and a trailing `Z`.
    pub fn to_millis_string(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }

    /// Epoch milliseconds.
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_millis_string())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
