//! In-memory stand-ins for the host platform.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use calbridge_calendar::{
    CalendarEventsModule, CalendarPermission, CalendarProvider, EventValues, FixedTimeZone,
    MemoryPreferences, PermissionHost, PreferenceError, PreferenceStore, ProviderError,
    RequestToken, SurfaceError,
};
use calbridge_core::Config;
use parking_lot::Mutex;
use tokio::sync::mpsc;

pub type PromptRequest = (Vec<CalendarPermission>, RequestToken);

/// Permission host whose grants and prompt behaviour are set by the test.
pub struct FakeHost {
    granted: Mutex<HashSet<CalendarPermission>>,
    rationale: Mutex<HashMap<CalendarPermission, bool>>,
    surface: Mutex<Option<SurfaceError>>,
    prompts: mpsc::UnboundedSender<PromptRequest>,
}

impl FakeHost {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PromptRequest>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let host = Arc::new(Self {
            granted: Mutex::new(HashSet::new()),
            rationale: Mutex::new(HashMap::new()),
            surface: Mutex::new(None),
            prompts: tx,
        });
        (host, rx)
    }

    pub fn grant(&self, permissions: &[CalendarPermission]) {
        self.granted.lock().extend(permissions.iter().copied());
    }

    pub fn grant_all(&self) {
        self.grant(&[
            CalendarPermission::ReadCalendar,
            CalendarPermission::WriteCalendar,
        ]);
    }

    pub fn set_rationale(&self, permission: CalendarPermission, show: bool) {
        self.rationale.lock().insert(permission, show);
    }

    pub fn break_surface(&self, error: SurfaceError) {
        *self.surface.lock() = Some(error);
    }
}

impl PermissionHost for FakeHost {
    fn check_self_permission(&self, permission: CalendarPermission) -> bool {
        self.granted.lock().contains(&permission)
    }

    fn should_show_request_rationale(
        &self,
        permission: CalendarPermission,
    ) -> Result<bool, SurfaceError> {
        if let Some(error) = *self.surface.lock() {
            return Err(error);
        }
        Ok(self
            .rationale
            .lock()
            .get(&permission)
            .copied()
            .unwrap_or(false))
    }

    fn request_permissions(
        &self,
        permissions: &[CalendarPermission],
        token: RequestToken,
    ) -> Result<(), SurfaceError> {
        if let Some(error) = *self.surface.lock() {
            return Err(error);
        }
        let _ = self.prompts.send((permissions.to_vec(), token));
        Ok(())
    }
}

/// Calendar store that records every insert and answers with a fixed reply.
pub struct FakeProvider {
    reply: Mutex<Result<Option<String>, ProviderError>>,
    next_id: AtomicUsize,
    auto_ids: bool,
    pub inserts: Mutex<Vec<EventValues>>,
}

impl FakeProvider {
    /// Hands out increasing row ids starting at 1.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(Ok(None)),
            next_id: AtomicUsize::new(1),
            auto_ids: true,
            inserts: Mutex::new(Vec::new()),
        })
    }

    /// Always answers with `reply`.
    pub fn replying(reply: Result<Option<String>, ProviderError>) -> Arc<Self> {
        Arc::new(Self {
            reply: Mutex::new(reply),
            next_id: AtomicUsize::new(1),
            auto_ids: false,
            inserts: Mutex::new(Vec::new()),
        })
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.lock().len()
    }

    pub fn last_insert(&self) -> Option<EventValues> {
        self.inserts.lock().last().cloned()
    }
}

impl CalendarProvider for FakeProvider {
    fn insert_event(&self, values: &EventValues) -> Result<Option<String>, ProviderError> {
        self.inserts.lock().push(values.clone());
        if self.auto_ids {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            return Ok(Some(format!("content://com.android.calendar/events/{}", id)));
        }
        self.reply.lock().clone()
    }
}

/// Preference store where every call fails.
pub struct BrokenPreferences;

impl PreferenceStore for BrokenPreferences {
    fn get_bool(&self, _: &str, _: &str, _: bool) -> Result<bool, PreferenceError> {
        Err(PreferenceError::Storage("store locked".into()))
    }

    fn put_bool(&self, _: &str, _: &str, _: bool) -> Result<(), PreferenceError> {
        Err(PreferenceError::Storage("store locked".into()))
    }
}

pub struct Harness {
    pub module: Arc<CalendarEventsModule>,
    pub host: Arc<FakeHost>,
    pub provider: Arc<FakeProvider>,
    pub preferences: Arc<MemoryPreferences>,
    pub prompts: mpsc::UnboundedReceiver<PromptRequest>,
}

pub fn harness() -> Harness {
    harness_with(FakeProvider::new())
}

pub fn harness_with(provider: Arc<FakeProvider>) -> Harness {
    let (host, prompts) = FakeHost::new();
    let preferences = Arc::new(MemoryPreferences::new());
    let module = Arc::new(CalendarEventsModule::new(
        host.clone(),
        provider.clone(),
        preferences.clone(),
        Arc::new(FixedTimeZone("Europe/Paris".to_string())),
        &Config::default(),
    ));
    Harness {
        module,
        host,
        provider,
        preferences,
        prompts,
    }
}
