//! End-to-end saves through the module against a fake calendar store.

mod common;

use calbridge_calendar::{
    CalendarPermission, EventDetails, ProviderError, SaveOptions,
};
use common::{harness, harness_with, FakeProvider};
use serde_json::json;

fn details(value: serde_json::Value) -> EventDetails {
    EventDetails::from_value(value).unwrap()
}

#[tokio::test]
async fn test_save_without_permission_never_touches_store() {
    let h = harness();
    // Read alone is not enough.
    h.host.grant(&[CalendarPermission::ReadCalendar]);

    let err = h
        .module
        .save_event(Some("Standup".into()), details(json!({})), SaveOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "add event error");
    assert_eq!(
        err.to_string(),
        "you don't have permissions to add an event to the users calendar"
    );
    assert_eq!(h.provider.insert_count(), 0);
}

#[tokio::test]
async fn test_save_returns_row_id() {
    let h = harness();
    h.host.grant_all();

    let id = h
        .module
        .save_event(
            Some("Standup".into()),
            details(json!({
                "startDate": "2023-11-14T22:13:20.000Z",
                "endDate": "2023-11-14T22:28:20.000Z",
                "location": "Room 2",
            })),
            SaveOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(id, "1");
    let stored = h.provider.last_insert().unwrap();
    assert_eq!(stored.title.as_deref(), Some("Standup"));
    assert_eq!(stored.start_millis, Some(1_700_000_000_000));
    assert_eq!(stored.end_millis, Some(1_700_000_900_000));
    assert_eq!(stored.location.as_deref(), Some("Room 2"));
    assert_eq!(stored.timezone.as_deref(), Some("Europe/Paris"));
    assert_eq!(stored.end_timezone.as_deref(), Some("Europe/Paris"));
    assert_eq!(stored.calendar_id, 1);
}

#[tokio::test]
async fn test_numeric_start_stored_verbatim() {
    let h = harness();
    h.host.grant_all();

    h.module
        .save_event(
            None,
            details(json!({ "startDate": 1700000000000_i64 })),
            SaveOptions::default(),
        )
        .await
        .unwrap();

    let stored = h.provider.last_insert().unwrap();
    assert_eq!(stored.start_millis, Some(1_700_000_000_000));
    assert!(stored.title.is_none());
}

#[tokio::test]
async fn test_recurring_event_content_values() {
    let h = harness();
    h.host.grant_all();

    h.module
        .save_event(
            Some("Retro".into()),
            details(json!({
                "startDate": 1700000000000_i64,
                "endDate": 1700003600000_i64,
                "recurrence": "monthly",
                "occurrence": 6,
                "alarms": [],
                "availability": "free",
                "allDay": true,
            })),
            SaveOptions::default(),
        )
        .await
        .unwrap();

    let content = h.provider.last_insert().unwrap().to_content_values();
    assert_eq!(content["rrule"], "FREQ=MONTHLY;COUNT=6");
    assert_eq!(content["duration"], "PT1H");
    assert_eq!(content["hasAlarm"], 1);
    assert_eq!(content["availability"], 1);
    assert_eq!(content["allDay"], 1);
    assert!(!content.contains_key("dtend"));
}

#[tokio::test]
async fn test_malformed_date_aborts_save() {
    let h = harness();
    h.host.grant_all();

    let err = h
        .module
        .save_event(
            Some("Broken".into()),
            details(json!({ "startDate": "next tuesday" })),
            SaveOptions::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), "add event error");
    assert_eq!(h.provider.insert_count(), 0);
}

#[tokio::test]
async fn test_store_without_row_id_is_failure() {
    for reply in [
        Ok(None),
        Ok(Some("content://com.android.calendar/events/".to_string())),
        Ok(Some("content://com.android.calendar/events/x1".to_string())),
    ] {
        let h = harness_with(FakeProvider::replying(reply));
        h.host.grant_all();

        let err = h
            .module
            .save_event(Some("Ghost".into()), details(json!({})), SaveOptions::default())
            .await
            .unwrap_err();

        assert_eq!(err.code(), "add event error");
        assert_eq!(err.to_string(), "Unable to save event");
        assert_eq!(h.provider.insert_count(), 1);
    }
}

#[tokio::test]
async fn test_store_error_is_rejected() {
    let h = harness_with(FakeProvider::replying(Err(ProviderError::InsertFailed(
        "constraint failed".into(),
    ))));
    h.host.grant_all();

    let err = h
        .module
        .save_event(None, details(json!({})), SaveOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "add event error");
    assert!(err.to_string().contains("constraint failed"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_saves_are_independent() {
    let h = harness();
    h.host.grant_all();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let module = h.module.clone();
            tokio::spawn(async move {
                module
                    .save_event(
                        Some(format!("Event {}", i)),
                        EventDetails::default(),
                        SaveOptions::default(),
                    )
                    .await
            })
        })
        .collect();

    let mut ids = Vec::new();
    for task in tasks {
        ids.push(task.await.unwrap().unwrap());
    }
    ids.sort_by_key(|id| id.parse::<u32>().unwrap());

    assert_eq!(ids.len(), 16);
    assert_eq!(ids.first().map(String::as_str), Some("1"));
    assert_eq!(ids.last().map(String::as_str), Some("16"));
    assert_eq!(h.provider.insert_count(), 16);
}

#[tokio::test]
async fn test_save_after_shutdown_rejects() {
    let h = harness();
    h.host.grant_all();
    h.module.shutdown();

    let err = h
        .module
        .save_event(None, details(json!({})), SaveOptions::default())
        .await
        .unwrap_err();

    assert_eq!(err.code(), "add event error");
    assert_eq!(h.provider.insert_count(), 0);
}
