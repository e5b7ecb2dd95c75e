//! Bridge types: permission classes, statuses and the stored column set.

use serde::{Deserialize, Serialize};

/// OS runtime permissions this bridge deals with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarPermission {
    #[serde(rename = "android.permission.READ_CALENDAR")]
    ReadCalendar,
    #[serde(rename = "android.permission.WRITE_CALENDAR")]
    WriteCalendar,
}

impl CalendarPermission {
    /// Fully qualified permission name as understood by the OS.
    pub fn name(self) -> &'static str {
        match self {
            Self::ReadCalendar => "android.permission.READ_CALENDAR",
            Self::WriteCalendar => "android.permission.WRITE_CALENDAR",
        }
    }
}

/// Permission class; read-only and read-write are tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn from_read_only(read_only: bool) -> Self {
        if read_only {
            Self::ReadOnly
        } else {
            Self::ReadWrite
        }
    }

    /// Key of the persisted "was requested" flag.
    ///
    /// Read-write keeps the legacy single key so flags written by older
    /// releases still count.
    pub fn requested_key(self) -> &'static str {
        match self {
            Self::ReadOnly => "permissionRequestedRead",
            Self::ReadWrite => "permissionRequested",
        }
    }

    /// Permissions that must all be granted for this class.
    pub fn required_permissions(self) -> &'static [CalendarPermission] {
        match self {
            Self::ReadOnly => &[CalendarPermission::ReadCalendar],
            Self::ReadWrite => &[
                CalendarPermission::WriteCalendar,
                CalendarPermission::ReadCalendar,
            ],
        }
    }

    /// Permission consulted for the "show rationale" decision.
    pub fn rationale_permission(self) -> CalendarPermission {
        match self {
            Self::ReadOnly => CalendarPermission::ReadCalendar,
            Self::ReadWrite => CalendarPermission::WriteCalendar,
        }
    }
}

/// Authorization status reported to the embedding runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionStatus {
    Authorized,
    Denied,
    Restricted,
    Undetermined,
}

impl PermissionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Authorized => "authorized",
            Self::Denied => "denied",
            Self::Restricted => "restricted",
            Self::Undetermined => "undetermined",
        }
    }
}

impl std::fmt::Display for PermissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token correlating an OS permission request with its result callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestToken(pub u32);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One entry of the OS grant-result array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantResult {
    Granted,
    Denied,
    Other(i32),
}

impl GrantResult {
    pub const GRANTED_CODE: i32 = 0;
    pub const DENIED_CODE: i32 = -1;

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::GRANTED_CODE => Self::Granted,
            Self::DENIED_CODE => Self::Denied,
            other => Self::Other(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Granted => Self::GRANTED_CODE,
            Self::Denied => Self::DENIED_CODE,
            Self::Other(code) => code,
        }
    }
}

/// Column set written to the calendar store's events table.
///
/// Serializes to a content-values map keyed by the store's column names;
/// unset columns are left out of the write entirely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventValues {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "eventLocation", skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(rename = "dtstart", skip_serializing_if = "Option::is_none")]
    pub start_millis: Option<i64>,
    #[serde(rename = "dtend", skip_serializing_if = "Option::is_none")]
    pub end_millis: Option<i64>,
    #[serde(rename = "rrule", skip_serializing_if = "Option::is_none")]
    pub recurrence_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(rename = "allDay", skip_serializing_if = "Option::is_none")]
    pub all_day: Option<u8>,
    #[serde(rename = "eventTimezone", skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(rename = "eventEndTimezone", skip_serializing_if = "Option::is_none")]
    pub end_timezone: Option<String>,
    #[serde(rename = "hasAlarm", skip_serializing_if = "Option::is_none")]
    pub has_alarm: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<i32>,
    #[serde(rename = "calendar_id")]
    pub calendar_id: i64,
}

impl EventValues {
    /// Content-values view of the record.
    pub fn to_content_values(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_keys_are_independent() {
        assert_eq!(AccessMode::ReadWrite.requested_key(), "permissionRequested");
        assert_eq!(AccessMode::ReadOnly.requested_key(), "permissionRequestedRead");
    }

    #[test]
    fn test_required_permissions() {
        assert_eq!(
            AccessMode::ReadOnly.required_permissions(),
            &[CalendarPermission::ReadCalendar]
        );
        assert_eq!(
            AccessMode::ReadWrite.required_permissions(),
            &[CalendarPermission::WriteCalendar, CalendarPermission::ReadCalendar]
        );
        assert_eq!(
            AccessMode::ReadWrite.rationale_permission(),
            CalendarPermission::WriteCalendar
        );
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_value(PermissionStatus::Undetermined).unwrap();
        assert_eq!(json, serde_json::json!("undetermined"));
        assert_eq!(PermissionStatus::Authorized.to_string(), "authorized");
    }

    #[test]
    fn test_grant_result_codes() {
        assert_eq!(GrantResult::from_code(0), GrantResult::Granted);
        assert_eq!(GrantResult::from_code(-1), GrantResult::Denied);
        assert_eq!(GrantResult::from_code(7), GrantResult::Other(7));
        assert_eq!(GrantResult::Other(7).code(), 7);
    }

    #[test]
    fn test_content_values_omit_unset_columns() {
        let values = EventValues {
            title: Some("Standup".into()),
            start_millis: Some(1_700_000_000_000),
            calendar_id: 1,
            ..Default::default()
        };
        let map = values.to_content_values();
        assert_eq!(map.len(), 3);
        assert_eq!(map["title"], "Standup");
        assert_eq!(map["dtstart"], 1_700_000_000_000_i64);
        assert_eq!(map["calendar_id"], 1);
        assert!(!map.contains_key("dtend"));
    }
}
