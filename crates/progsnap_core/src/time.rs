//! Time types for progsnap.
//!
//! Event timestamps are epoch milliseconds. Some logs store them as
//! `YYYY-MM-DD HH:MM:SS.ffffff` followed by a bare hour offset such as
//! `-05`; those are normalized once, when the event is constructed.

use crate::error::{ProgsnapError, ProgsnapResult};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Layout of string timestamps once the offset has been padded to `+HHMM`
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%z";

/// Milliseconds since the Unix epoch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EpochMillis(i64);

impl EpochMillis {
    /// Create from raw milliseconds
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Get raw milliseconds
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Normalize a logged `ts` value
    ///
    /// Numbers are taken as milliseconds already (fractions are truncated).
    /// Strings are parsed in the logged textual layout.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimestamp` for any other shape or an unparseable string
    pub fn from_value(value: &Value) -> ProgsnapResult<Self> {
        match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Self)
                .ok_or_else(|| invalid(value, "not representable as milliseconds")),
            Value::String(s) => Self::parse(s),
            _ => Err(invalid(value, "expected a number or a string")),
        }
    }

    /// Parse a string timestamp such as `2016-01-27 14:03:12.512000-05`
    ///
    /// # Errors
    ///
    /// Returns `InvalidTimestamp` if the string does not match the layout
    pub fn parse(raw: &str) -> ProgsnapResult<Self> {
        // The log drops the minutes of the UTC offset
        let padded = format!("{raw}00");
        DateTime::parse_from_str(&padded, TIMESTAMP_FORMAT)
            .map(|dt| Self(dt.timestamp_millis()))
            .map_err(|e| ProgsnapError::InvalidTimestamp {
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Display for EpochMillis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

impl From<i64> for EpochMillis {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

fn invalid(value: &Value, reason: &str) -> ProgsnapError {
    ProgsnapError::InvalidTimestamp {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}
