//! Bridge error types.
//!
//! Every error that reaches the embedding runtime is rejected as a
//! `(code, message)` pair: `code()` gives the code, `Display` the message.

use thiserror::Error;

/// Rejection code for everything that goes wrong while saving an event.
pub const ADD_EVENT_ERROR: &str = "add event error";

/// The host could not present a permission prompt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("No active UI surface is available to host the permission prompt")]
    NoActiveSurface,

    #[error("The active UI surface cannot host permission prompts")]
    NotPermissionAware,
}

/// Failures of the persisted key-value store.
#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Preference storage error: {0}")]
    Storage(String),

    #[error("Preference file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Preference file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Failures reported by the host calendar store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Calendar store unavailable")]
    Unavailable,

    #[error("Calendar insert failed: {0}")]
    InsertFailed(String),
}

/// Failures of a single save.
#[derive(Error, Debug)]
pub enum EventError {
    #[error("you don't have permissions to add an event to the users calendar")]
    PermissionDenied,

    #[error("Unparseable date for {field}: \"{value}\"")]
    InvalidDate { field: &'static str, value: String },

    #[error("Unknown time zone: {0}")]
    InvalidTimeZone(String),

    #[error("Invalid event details: {0}")]
    InvalidDetails(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Unable to save event")]
    MissingEventId,

    #[error("Event writer is shut down")]
    WriterClosed,

    #[error("Event writer failed: {0}")]
    WorkerFailed(String),
}

/// Top-level error surfaced through a rejected result handle.
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    #[error("{0}")]
    PermissionCheck(#[source] PreferenceError),

    #[error("{0}")]
    PermissionRequest(#[source] PreferenceError),

    /// The OS returned no usable grant result.
    #[error("{0}")]
    UnknownPermissionResult(String),

    /// The pending request was dropped without a result.
    #[error("Permission request was abandoned before the OS answered")]
    Abandoned,

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
}

impl BridgeError {
    /// Stable rejection code understood by the embedding runtime.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Surface(SurfaceError::NoActiveSurface) => "E_ACTIVITY_DOES_NOT_EXIST",
            Self::Surface(SurfaceError::NotPermissionAware) => "E_ACTIVITY_NOT_PERMISSION_AWARE",
            Self::PermissionCheck(_) => "error checking permissions",
            Self::PermissionRequest(_) => "error requesting permissions",
            Self::UnknownPermissionResult(_) => "permissions - unknown error",
            Self::Abandoned => "E_REQUEST_ABANDONED",
            Self::Event(_) => ADD_EVENT_ERROR,
            Self::InvalidArguments(_) => "E_INVALID_ARGUMENTS",
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
