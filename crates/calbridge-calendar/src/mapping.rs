//! Lookup tables and conversions between bridge values and store columns.
//!
//! The `from_token` lookups are total and report "no match" explicitly;
//! the lossy fallbacks live in the policy functions below them.

use chrono::{NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::details::DateInput;
use crate::error::EventError;

/// `yyyy-MM-dd'T'HH:mm:ss.SSS'Z'`
pub const DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S.%3fZ";

/// Store-level availability codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Busy,
    Free,
    Tentative,
}

impl Availability {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "busy" => Some(Self::Busy),
            "free" => Some(Self::Free),
            "tentative" => Some(Self::Tentative),
            _ => None,
        }
    }

    /// Column value understood by the calendar store.
    pub fn code(self) -> i32 {
        match self {
            Self::Busy => 0,
            Self::Free => 1,
            Self::Tentative => 2,
        }
    }
}

/// Unknown availability strings count as busy.
pub fn availability_or_busy(token: &str) -> Availability {
    Availability::from_token(token).unwrap_or_else(|| {
        tracing::debug!("Unrecognized availability {:?}, using busy", token);
        Availability::Busy
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurrenceFrequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrenceFrequency {
    /// Case-sensitive lookup of the bridge token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "daily" => Some(Self::Daily),
            "weekly" => Some(Self::Weekly),
            "monthly" => Some(Self::Monthly),
            "yearly" => Some(Self::Yearly),
            _ => None,
        }
    }

    pub fn as_rule_token(self) -> &'static str {
        match self {
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
            Self::Yearly => "YEARLY",
        }
    }
}

/// Frequency plus optional occurrence count, rendered as an RRULE body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: RecurrenceFrequency,
    pub count: Option<u32>,
}

impl std::fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FREQ={}", self.frequency.as_rule_token())?;
        if let Some(count) = self.count {
            write!(f, ";COUNT={}", count)?;
        }
        Ok(())
    }
}

/// Build a rule from the bridge token; unknown tokens are dropped silently.
pub fn recurrence_rule(token: &str, count: Option<u32>) -> Option<RecurrenceRule> {
    match RecurrenceFrequency::from_token(token) {
        Some(frequency) => Some(RecurrenceRule { frequency, count }),
        None => {
            tracing::debug!("Dropping unrecognized recurrence {:?}", token);
            None
        }
    }
}

/// Resolve a bridge date to epoch milliseconds.
///
/// Numbers are taken as epoch milliseconds verbatim (fraction truncated);
/// values outside the `i64` range are rejected. Text is parsed with [`DATE_FORMAT`] in UTC, or in `local_zone` when given.
pub fn date_to_millis(
    field: &'static str,
    input: &DateInput,
    local_zone: Option<&str>,
) -> Result<i64, EventError> {
    match input {
        DateInput::Millis(ms) => millis_from_number(field, *ms),
        DateInput::Text(text) => parse_date_text(field, text, local_zone),
    }
}

fn millis_from_number(field: &'static str, ms: f64) -> Result<i64, EventError> {
    let truncated = ms.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is itself out of range.
    if truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Ok(truncated as i64)
    } else {
        Err(EventError::InvalidDate {
            field,
            value: ms.to_string(),
        })
    }
}

fn parse_date_text(
    field: &'static str,
    text: &str,
    local_zone: Option<&str>,
) -> Result<i64, EventError> {
    let invalid = || EventError::InvalidDate {
        field,
        value: text.to_string(),
    };

    let naive = NaiveDateTime::parse_from_str(text, DATE_FORMAT).map_err(|_| invalid())?;

    match local_zone {
        None => Ok(Utc.from_utc_datetime(&naive).timestamp_millis()),
        Some(zone_id) => {
            let zone: Tz = zone_id
                .parse()
                .map_err(|_| EventError::InvalidTimeZone(zone_id.to_string()))?;
            // Ambiguous wall times resolve to the earlier instant; skipped ones are invalid.
            zone.from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.timestamp_millis())
                .ok_or_else(invalid)
        }
    }
}

/// Numeric row id from the last path segment of a store row URI.
pub fn row_id_from_uri(uri: &str) -> Option<i64> {
    let path = uri.split(['?', '#']).next().unwrap_or(uri);
    path.rsplit('/')
        .find(|segment| !segment.is_empty())
        .and_then(|segment| segment.parse::<i64>().ok())
        .filter(|id| *id >= 0)
}
