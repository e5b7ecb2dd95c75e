//! The bridge module exposed to the embedding runtime.

use std::sync::Arc;

use calbridge_core::Config;
use serde_json::Value;

use crate::details::{EventDetails, SaveOptions};
use crate::error::{BridgeError, BridgeResult, EventError};
use crate::permissions::PermissionGate;
use crate::platform::{CalendarProvider, PermissionHost, PreferenceStore, TimeZoneSource};
use crate::types::{AccessMode, GrantResult, PermissionStatus, RequestToken};
use crate::writer::EventWriter;

/// Name the module is registered under.
pub const MODULE_NAME: &str = "RNCalendarEvents";

/// Owns one permission gate and one event writer.
///
/// Instances share nothing: each has its own pending-request registry and
/// worker pool.
pub struct CalendarEventsModule {
    gate: PermissionGate,
    writer: EventWriter,
}

impl CalendarEventsModule {
    pub fn new(
        host: Arc<dyn PermissionHost>,
        provider: Arc<dyn CalendarProvider>,
        preferences: Arc<dyn PreferenceStore>,
        timezone: Arc<dyn TimeZoneSource>,
        config: &Config,
    ) -> Self {
        tracing::info!(
            max_workers = config.writer.max_workers,
            calendar_id = config.calendar.default_calendar_id,
            "Creating calendar events module"
        );
        Self {
            gate: PermissionGate::new(host, preferences, config.preferences.namespace.clone()),
            writer: EventWriter::new(
                provider,
                timezone,
                &config.writer,
                config.calendar.clone(),
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        MODULE_NAME
    }

    /// # Errors
    /// See [`PermissionGate::check_permissions`].
    pub fn check_permissions(&self, read_only: bool) -> BridgeResult<PermissionStatus> {
        tracing::info!(read_only, "checkPermissions");
        self.gate.check_permissions(read_only)
    }

    /// # Errors
    /// See [`PermissionGate::request_permissions`].
    pub async fn request_permissions(&self, read_only: bool) -> BridgeResult<PermissionStatus> {
        tracing::info!(read_only, "requestPermissions");
        self.gate.request_permissions(read_only).await
    }

    /// Forwarded from the host when the OS answers a permission prompt.
    pub fn on_request_permissions_result(
        &self,
        token: RequestToken,
        grant_results: &[GrantResult],
    ) -> bool {
        self.gate.on_request_permissions_result(token, grant_results)
    }

    /// Save a new event and return its id.
    ///
    /// Write permission is checked before anything is queued; without it the
    /// call rejects and the store is never touched.
    ///
    /// # Errors
    /// `BridgeError::Event` for missing permission, bad dates, store
    /// failures and inserts that yield no id.
    pub async fn save_event(
        &self,
        title: Option<String>,
        details: EventDetails,
        options: SaveOptions,
    ) -> BridgeResult<String> {
        tracing::info!(title = ?title, "saveEvent");
        self.ensure_write_permission()?;
        self.write(title, details, options).await
    }

    /// Like [`save_event`](Self::save_event), for a descriptor still in its
    /// loosely typed bridge form.
    ///
    /// Permission is checked first, so a caller without write access is told
    /// so even when the descriptor is malformed.
    ///
    /// # Errors
    /// As `save_event`, plus `EventError::InvalidDetails` for a descriptor
    /// whose fields have the wrong types.
    pub async fn save_event_value(
        &self,
        title: Option<String>,
        details: Value,
        options: SaveOptions,
    ) -> BridgeResult<String> {
        tracing::info!(title = ?title, "saveEvent");
        self.ensure_write_permission()?;

        let details = EventDetails::from_value(details).map_err(|e| {
            tracing::error!("Add event error: invalid details: {}", e);
            EventError::InvalidDetails(e.to_string())
        })?;
        self.write(title, details, options).await
    }

    fn ensure_write_permission(&self) -> Result<(), EventError> {
        if self.gate.has_permissions(AccessMode::ReadWrite) {
            Ok(())
        } else {
            tracing::warn!("Refusing to save event without calendar write permission");
            Err(EventError::PermissionDenied)
        }
    }

    async fn write(
        &self,
        title: Option<String>,
        details: EventDetails,
        options: SaveOptions,
    ) -> BridgeResult<String> {
        self.writer
            .submit(title, details, options)
            .wait()
            .await
            .map_err(|e| {
                tracing::error!("Add event error: {}", e);
                BridgeError::from(e)
            })
    }

    pub fn pending_permission_requests(&self) -> usize {
        self.gate.pending_count()
    }

    /// Stop the writer; later saves reject.
    pub fn shutdown(&self) {
        self.writer.shutdown();
    }
}
