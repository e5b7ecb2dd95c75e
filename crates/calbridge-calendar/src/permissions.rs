//! Calendar permission gate.
//!
//! Combines the live OS grant status with a persisted "was requested" flag
//! per permission class, and correlates OS prompt results with the callers
//! waiting on them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::error::{BridgeError, BridgeResult};
use crate::platform::{PermissionHost, PreferenceStore};
use crate::types::{AccessMode, GrantResult, PermissionStatus, RequestToken};

/// Tokens are handed out above this value.
pub const BASE_REQUEST_CODE: u32 = 37;

const CANCELLED_MESSAGE: &str = "Request was cancelled";

type PendingSender = oneshot::Sender<BridgeResult<PermissionStatus>>;

/// Callers waiting on an OS permission prompt, keyed by request token.
///
/// Owned by one gate; separate gates never see each other's requests.
pub struct PendingRequests {
    last_token: AtomicU32,
    entries: Mutex<HashMap<RequestToken, PendingSender>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self {
            last_token: AtomicU32::new(BASE_REQUEST_CODE),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Register a waiter under a fresh token.
    pub fn register(&self) -> (RequestToken, oneshot::Receiver<BridgeResult<PermissionStatus>>) {
        let token = RequestToken(self.last_token.fetch_add(1, Ordering::Relaxed).wrapping_add(1));
        let (tx, rx) = oneshot::channel();
        self.entries.lock().insert(token, tx);
        (token, rx)
    }

    /// Remove the waiter for `token`, together with the number of waiters
    /// that were pending just before removal.
    pub fn take(&self, token: RequestToken) -> Option<(PendingSender, usize)> {
        let mut entries = self.entries.lock();
        let pending = entries.len();
        entries.remove(&token).map(|tx| (tx, pending))
    }

    pub fn remove(&self, token: RequestToken) -> bool {
        self.entries.lock().remove(&token).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for PendingRequests {
    fn default() -> Self {
        Self::new()
    }
}

pub struct PermissionGate {
    host: Arc<dyn PermissionHost>,
    preferences: Arc<dyn PreferenceStore>,
    namespace: String,
    pending: PendingRequests,
}

impl PermissionGate {
    pub fn new(
        host: Arc<dyn PermissionHost>,
        preferences: Arc<dyn PreferenceStore>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            host,
            preferences,
            namespace: namespace.into(),
            pending: PendingRequests::new(),
        }
    }

    /// Whether every permission of the class is currently granted.
    pub fn has_permissions(&self, mode: AccessMode) -> bool {
        mode.required_permissions()
            .iter()
            .all(|permission| self.host.check_self_permission(*permission))
    }

    /// Current status for the class. Never prompts and never writes.
    ///
    /// # Errors
    /// `BridgeError::PermissionCheck` if the persisted flag can't be read.
    pub fn check_permissions(&self, read_only: bool) -> BridgeResult<PermissionStatus> {
        let mode = AccessMode::from_read_only(read_only);
        let requested = self
            .preferences
            .get_bool(&self.namespace, mode.requested_key(), false)
            .map_err(|e| {
                tracing::error!("Error checking calendar permissions: {}", e);
                BridgeError::PermissionCheck(e)
            })?;

        let status = if self.has_permissions(mode) {
            PermissionStatus::Authorized
        } else if !requested {
            PermissionStatus::Undetermined
        } else if self.should_show_rationale(mode) {
            PermissionStatus::Denied
        } else {
            PermissionStatus::Restricted
        };

        tracing::debug!(?mode, %status, "Checked calendar permissions");
        Ok(status)
    }

    /// Mark the class as requested, then prompt unless already granted.
    ///
    /// Resolves once the OS delivers a result through
    /// [`on_request_permissions_result`](Self::on_request_permissions_result).
    ///
    /// # Errors
    /// `BridgeError::PermissionRequest` if the flag can't be written,
    /// `BridgeError::Surface` if no prompt can be shown,
    /// `BridgeError::UnknownPermissionResult` / `BridgeError::Abandoned`
    /// if the OS returns no usable answer.
    pub async fn request_permissions(&self, read_only: bool) -> BridgeResult<PermissionStatus> {
        let mode = AccessMode::from_read_only(read_only);

        self.preferences
            .put_bool(&self.namespace, mode.requested_key(), true)
            .map_err(|e| {
                tracing::error!("Error requesting calendar permissions: {}", e);
                BridgeError::PermissionRequest(e)
            })?;

        if self.has_permissions(mode) {
            return Ok(PermissionStatus::Authorized);
        }

        let receiver = self.issue_request(mode)?;
        receiver.await.unwrap_or_else(|_| Err(BridgeError::Abandoned))
    }

    fn issue_request(
        &self,
        mode: AccessMode,
    ) -> BridgeResult<oneshot::Receiver<BridgeResult<PermissionStatus>>> {
        let (token, receiver) = self.pending.register();
        tracing::info!(%token, ?mode, "Requesting calendar permissions");

        if let Err(e) = self
            .host
            .request_permissions(mode.required_permissions(), token)
        {
            self.pending.remove(token);
            tracing::warn!(%token, "Cannot show permission prompt: {}", e);
            return Err(e.into());
        }

        Ok(receiver)
    }

    /// Deliver the OS outcome for `token`.
    ///
    /// Returns true when no request is left pending.
    pub fn on_request_permissions_result(
        &self,
        token: RequestToken,
        grant_results: &[GrantResult],
    ) -> bool {
        let Some((sender, pending_before)) = self.pending.take(token) else {
            tracing::debug!(%token, "Ignoring permission result for unknown request");
            return self.pending.is_empty();
        };

        let outcome = match grant_results.first() {
            Some(GrantResult::Granted) => Some(Ok(PermissionStatus::Authorized)),
            Some(GrantResult::Denied) => Some(Ok(PermissionStatus::Denied)),
            first if pending_before == 1 => {
                let message = first
                    .map(|result| result.code().to_string())
                    .unwrap_or_else(|| CANCELLED_MESSAGE.to_string());
                Some(Err(BridgeError::UnknownPermissionResult(message)))
            }
            _ => None,
        };

        match outcome {
            Some(outcome) => {
                tracing::info!(%token, ?outcome, "Calendar permission request finished");
                // The caller may have stopped waiting.
                let _ = sender.send(outcome);
            }
            None => {
                tracing::warn!(%token, "Dropping permission request without a usable result");
            }
        }

        self.pending.is_empty()
    }

    /// Number of prompts still waiting for the OS.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    fn should_show_rationale(&self, mode: AccessMode) -> bool {
        match self
            .host
            .should_show_request_rationale(mode.rationale_permission())
        {
            Ok(show) => show,
            Err(e) => {
                tracing::warn!("Cannot query permission rationale: {}", e);
                false
            }
        }
    }
}
