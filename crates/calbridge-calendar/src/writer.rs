//! Event writer: maps event details onto store columns and performs the
//! insert on a bounded pool of blocking workers.

use std::sync::Arc;

use calbridge_core::{CalendarConfig, WriterConfig};
use tokio::sync::{oneshot, Semaphore};

use crate::details::{EventDetails, SaveOptions};
use crate::error::EventError;
use crate::mapping::{availability_or_busy, date_to_millis, recurrence_rule, row_id_from_uri};
use crate::platform::{CalendarProvider, TimeZoneSource};
use crate::types::EventValues;

/// Completion side of a submitted job.
pub struct ResultHandle<T> {
    receiver: oneshot::Receiver<Result<T, EventError>>,
}

impl<T> ResultHandle<T> {
    /// Wait for the job to resolve or reject.
    pub async fn wait(self) -> Result<T, EventError> {
        self.receiver
            .await
            .unwrap_or_else(|_| Err(EventError::WorkerFailed("job dropped before completion".into())))
    }
}

/// Runs blocking jobs with at most `max_workers` in flight.
///
/// Jobs are independent and complete in no particular order. Jobs beyond the
/// limit wait for a free worker instead of starting new threads.
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    max_workers: usize,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        let max_workers = max_workers.max(1);
        Self {
            permits: Arc::new(Semaphore::new(max_workers)),
            max_workers,
        }
    }

    /// Queue `job` and return its result handle.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit<F, T>(&self, job: F) -> ResultHandle<T>
    where
        F: FnOnce() -> Result<T, EventError> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, receiver) = oneshot::channel();
        let permits = self.permits.clone();

        tokio::spawn(async move {
            let result = match permits.acquire_owned().await {
                Ok(permit) => tokio::task::spawn_blocking(move || {
                    let _permit = permit;
                    job()
                })
                .await
                .unwrap_or_else(|e| Err(EventError::WorkerFailed(e.to_string()))),
                Err(_) => Err(EventError::WriterClosed),
            };
            let _ = tx.send(result);
        });

        ResultHandle { receiver }
    }

    /// Stop accepting work. Running jobs finish; queued and later ones reject.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// Translate event details into the column set for one insert.
///
/// # Errors
/// `EventError::InvalidDate` / `EventError::InvalidTimeZone` when a date
/// can't be resolved; the whole save is abandoned in that case.
pub fn build_event_values(
    title: Option<&str>,
    details: &EventDetails,
    calendar: &CalendarConfig,
    timezone: &dyn TimeZoneSource,
) -> Result<EventValues, EventError> {
    let default_zone = timezone.default_timezone_id();
    let local_zone = details.skip_timezone().then_some(default_zone.as_str());

    let mut values = EventValues {
        title: title.map(str::to_string),
        description: details.description.clone(),
        location: details.location.clone(),
        calendar_id: calendar.default_calendar_id,
        ..Default::default()
    };

    if let Some(start) = &details.start_date {
        values.start_millis = Some(date_to_millis("startDate", start, local_zone)?);
    }

    // A recurrence key suppresses the end date even when its rule is dropped.
    match &details.recurrence {
        Some(token) => {
            if let Some(rule) = recurrence_rule(token, details.occurrence) {
                values.recurrence_rule = Some(rule.to_string());
                values.duration = Some(calendar.recurring_duration.clone());
            }
        }
        None => {
            if let Some(end) = &details.end_date {
                values.end_millis = Some(date_to_millis("endDate", end, local_zone)?);
            }
        }
    }

    values.all_day = details.all_day.map(u8::from);
    values.timezone = Some(
        details
            .time_zone
            .clone()
            .unwrap_or_else(|| default_zone.clone()),
    );
    values.end_timezone = Some(details.end_time_zone.clone().unwrap_or(default_zone));

    if details.alarms.is_some() {
        values.has_alarm = Some(1);
    }

    values.availability = details
        .availability
        .as_deref()
        .map(|token| availability_or_busy(token).code());

    Ok(values)
}

/// Insert `values` and extract the new event id.
///
/// # Errors
/// `EventError::Provider` if the store fails, `EventError::MissingEventId`
/// if it returns no usable row reference.
pub fn insert_event_values(
    provider: &dyn CalendarProvider,
    values: &EventValues,
) -> Result<String, EventError> {
    let uri = provider.insert_event(values)?;
    let id = uri
        .as_deref()
        .and_then(row_id_from_uri)
        .ok_or_else(|| {
            tracing::warn!(?uri, "Calendar store returned no usable row id");
            EventError::MissingEventId
        })?;
    Ok(id.to_string())
}

pub struct EventWriter {
    provider: Arc<dyn CalendarProvider>,
    timezone: Arc<dyn TimeZoneSource>,
    calendar: CalendarConfig,
    pool: WorkerPool,
}

impl EventWriter {
    pub fn new(
        provider: Arc<dyn CalendarProvider>,
        timezone: Arc<dyn TimeZoneSource>,
        writer: &WriterConfig,
        calendar: CalendarConfig,
    ) -> Self {
        Self {
            provider,
            timezone,
            calendar,
            pool: WorkerPool::new(writer.max_workers),
        }
    }

    /// Queue one save. Mapping and insert both run on a pool worker.
    pub fn submit(
        &self,
        title: Option<String>,
        details: EventDetails,
        options: SaveOptions,
    ) -> ResultHandle<String> {
        let provider = self.provider.clone();
        let timezone = self.timezone.clone();
        let calendar = self.calendar.clone();

        self.pool.submit(move || {
            tracing::trace!(?options, "Save options are not applied to inserts");
            let values =
                build_event_values(title.as_deref(), &details, &calendar, timezone.as_ref())?;
            let id = insert_event_values(provider.as_ref(), &values)?;
            tracing::info!(event_id = %id, "Saved calendar event");
            Ok(id)
        })
    }

    pub fn shutdown(&self) {
        tracing::info!("Shutting down event writer");
        self.pool.close();
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}
