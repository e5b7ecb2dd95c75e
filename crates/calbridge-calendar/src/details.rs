//! Event descriptor and save options as delivered by the embedding runtime.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A date given either as ISO-8601 text or as epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(f64),
    Text(String),
}

/// Partially populated event description.
///
/// Every field is optional; absent fields are not written. Keys the store
/// has no column for (`calendarId`, `url`, `notes`, ...) are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetails {
    pub description: Option<String>,
    pub location: Option<String>,
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
    pub all_day: Option<bool>,
    pub time_zone: Option<String>,
    pub end_time_zone: Option<String>,
    pub recurrence: Option<String>,
    #[serde(default, deserialize_with = "occurrence_count")]
    pub occurrence: Option<u32>,
    pub availability: Option<String>,
    /// Only the presence of the key matters, even an explicit `null`.
    #[serde(default, deserialize_with = "present")]
    pub alarms: Option<Value>,
    /// Interpret date text in the device timezone instead of UTC.
    #[serde(default)]
    pub skip_android_timezone: Option<bool>,
}

impl EventDetails {
    /// Parse details from a loosely typed bridge map.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }

    pub fn skip_timezone(&self) -> bool {
        self.skip_android_timezone.unwrap_or(false)
    }
}

/// Options accompanying a save. None of them influence the insert yet.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOptions {
    #[serde(default)]
    pub sync: bool,
    pub exception_date: Option<String>,
    pub future_events: Option<bool>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Accepts `3`, `3.0` or `"3"`; `null` counts as absent.
fn occurrence_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(count) = n.as_u64() {
                return u32::try_from(count)
                    .map(Some)
                    .map_err(|_| D::Error::custom(format!("occurrence out of range: {}", n)));
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= 0.0 && f <= f64::from(u32::MAX) => {
                    Ok(Some(f as u32))
                }
                _ => Err(D::Error::custom(format!("invalid occurrence: {}", n))),
            }
        }
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid occurrence: {:?}", s))),
        other => Err(D::Error::custom(format!("invalid occurrence: {}", other))),
    }
}
