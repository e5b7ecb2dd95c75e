//! Calendar bridge for cross-platform application runtimes.
//!
//! Exposes the OS calendar store (event inserts) and the calendar
//! runtime-permission handshake through [`CalendarEventsModule`]. The OS
//! itself is reached through the traits in [`platform`].

pub mod details;
pub mod dispatch;
pub mod error;
pub mod mapping;
pub mod module;
pub mod permissions;
pub mod platform;
pub mod preferences;
pub mod types;
pub mod writer;

pub use details::{DateInput, EventDetails, SaveOptions};
pub use dispatch::{BridgeCall, BridgeReply};
pub use error::{BridgeError, BridgeResult, EventError, PreferenceError, ProviderError, SurfaceError};
pub use mapping::{Availability, RecurrenceFrequency, RecurrenceRule};
pub use module::{CalendarEventsModule, MODULE_NAME};
pub use permissions::{PendingRequests, PermissionGate};
pub use platform::{
    CalendarProvider, FixedTimeZone, PermissionHost, PreferenceStore, SystemTimeZone,
    TimeZoneSource,
};
pub use preferences::{FilePreferences, MemoryPreferences};
pub use types::{
    AccessMode, CalendarPermission, EventValues, GrantResult, PermissionStatus, RequestToken,
};
pub use writer::{EventWriter, ResultHandle, WorkerPool};
