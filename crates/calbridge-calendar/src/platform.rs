//! Host platform seams.
//!
//! The embedding application implements these against the OS calendar
//! provider, its runtime-permission system and its key-value preferences.

use crate::error::{PreferenceError, ProviderError, SurfaceError};
use crate::types::{CalendarPermission, EventValues, RequestToken};

/// Insert access to the OS calendar store.
///
/// Calls are made from worker threads and may block.
pub trait CalendarProvider: Send + Sync {
    /// Insert one row into the events table.
    ///
    /// Returns the row URI generated by the store, or `None` if the store
    /// accepted the call without producing one.
    fn insert_event(&self, values: &EventValues) -> Result<Option<String>, ProviderError>;
}

/// The OS runtime-permission system and the UI surface hosting its prompts.
pub trait PermissionHost: Send + Sync {
    /// Live grant status of a single permission.
    fn check_self_permission(&self, permission: CalendarPermission) -> bool;

    /// Whether the OS would still show a rationale, i.e. the user has not
    /// permanently denied the permission.
    fn should_show_request_rationale(
        &self,
        permission: CalendarPermission,
    ) -> Result<bool, SurfaceError>;

    /// Show the OS permission prompt.
    ///
    /// The outcome is delivered later through
    /// `PermissionGate::on_request_permissions_result` with the same token.
    /// Implementations may deliver it before returning.
    fn request_permissions(
        &self,
        permissions: &[CalendarPermission],
        token: RequestToken,
    ) -> Result<(), SurfaceError>;
}

/// Namespaced boolean preferences that survive restarts.
pub trait PreferenceStore: Send + Sync {
    fn get_bool(&self, namespace: &str, key: &str, default: bool) -> Result<bool, PreferenceError>;

    fn put_bool(&self, namespace: &str, key: &str, value: bool) -> Result<(), PreferenceError>;
}

/// Source of the device's current default timezone id.
pub trait TimeZoneSource: Send + Sync {
    fn default_timezone_id(&self) -> String;
}

/// Reads the system timezone on every call so zone changes are picked up.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeZone;

impl TimeZoneSource for SystemTimeZone {
    fn default_timezone_id(&self) -> String {
        match iana_time_zone::get_timezone() {
            Ok(zone) => zone,
            Err(e) => {
                tracing::warn!("Could not read system timezone, using UTC: {}", e);
                "UTC".to_string()
            }
        }
    }
}

/// Always reports the same zone.
#[derive(Debug, Clone)]
pub struct FixedTimeZone(pub String);

impl TimeZoneSource for FixedTimeZone {
    fn default_timezone_id(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_zone_is_non_empty() {
        assert!(!SystemTimeZone.default_timezone_id().is_empty());
    }

    #[test]
    fn test_fixed_zone() {
        let zone = FixedTimeZone("America/Toronto".to_string());
        assert_eq!(zone.default_timezone_id(), "America/Toronto");
    }
}
