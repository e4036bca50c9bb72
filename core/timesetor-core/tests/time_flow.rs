mod common;

use chrono::NaiveDate;
use common::{StubBackend, TOKEN};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use timesetor_core::session::keys;
use timesetor_core::{App, KeyValueStore, MemoryStore, TimeState};
use timesetor_protocol::{ActivityType, TimeStatus};

fn logged_in(backend: &StubBackend) -> App {
    let store = Arc::new(MemoryStore::new());
    store.set(keys::TOKEN, TOKEN).unwrap();
    backend.app(store)
}

async fn wait_for<F: Fn() -> bool>(condition: F) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[tokio::test]
async fn test_fetch_current_time_applies_payload() {
    let backend = StubBackend::start().await;
    let app = logged_in(&backend);

    let response = app.time().fetch_current_time().await.unwrap();

    assert_eq!(response.status, TimeStatus::Awake);
    let state = app.time().state();
    assert!(state.is_awake());
    assert_eq!(state.virtual_time, "08:30");
    assert_eq!(state.real_time, "2026-03-02 08:00:00");
    assert_eq!(state.speed, 1.5);
    assert_eq!(state.activity, "study");
}

#[tokio::test]
async fn test_fetch_current_time_normalizes_sparse_payload() {
    let backend = StubBackend::start().await;
    backend.set_current(json!({ "status": "not_awake", "message": "no wake record" }));
    let app = logged_in(&backend);

    let response = app.time().fetch_current_time().await.unwrap();

    assert_eq!(response.message.as_deref(), Some("no wake record"));
    let state = app.time().state();
    assert_eq!(state.status, TimeStatus::NotAwake);
    assert_eq!(state.virtual_time, "");
    assert_eq!(state.speed, 1.0);
    assert_eq!(state.activity, "rest");
}

#[tokio::test]
async fn test_fetch_current_time_failure_is_silent() {
    let backend = StubBackend::start().await;
    let app = backend.app(Arc::new(MemoryStore::new()));

    assert!(app.time().fetch_current_time().await.is_none());
    assert_eq!(app.time().state(), TimeState::default());
}

#[tokio::test]
async fn test_wake_starts_polling_and_sleep_stops_it() {
    let backend = StubBackend::start().await;
    let app = logged_in(&backend);

    let wake = app.time().record_wake().await.unwrap();
    assert_eq!(wake.virtual_wake_time.as_deref(), Some("07:00"));
    assert_eq!(wake.entertainment_multiplier, Some(1.2));
    assert!(app.time().is_awake());
    assert!(app.time().is_auto_updating());

    // The poller picks up the backend's view.
    assert!(wait_for(|| app.time().state().virtual_time == "08:30").await);

    app.time().record_sleep().await.unwrap();
    assert_eq!(app.time().state().status, TimeStatus::Sleep);
    assert!(!app.time().is_auto_updating());

    // The backend still says awake; nothing may flip the state back.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let polls = backend.hit_count("/time/current");
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.hit_count("/time/current"), polls);
    assert_eq!(app.time().state().status, TimeStatus::Sleep);
}

#[tokio::test]
async fn test_stop_discards_in_flight_poll() {
    let backend = StubBackend::start().await;
    backend.delay_current(Duration::from_millis(200));
    let app = logged_in(&backend);

    app.time().record_wake().await.unwrap();
    assert!(wait_for(|| backend.hit_count("/time/current") == 1).await);

    assert!(app.time().stop_auto_update());
    tokio::time::sleep(Duration::from_millis(350)).await;

    let state = app.time().state();
    assert_eq!(state.status, TimeStatus::Awake);
    assert_eq!(state.virtual_time, "");
    assert_eq!(backend.hit_count("/time/current"), 1);
}

#[tokio::test]
async fn test_late_fetch_never_overrides_sleep() {
    let backend = StubBackend::start().await;
    backend.delay_current(Duration::from_millis(200));
    let app = logged_in(&backend);

    let time = app.time().clone();
    let fetch = tokio::spawn(async move { time.fetch_current_time().await });
    assert!(wait_for(|| backend.hit_count("/time/current") == 1).await);

    app.time().record_sleep().await.unwrap();
    let response = fetch.await.unwrap().unwrap();

    assert_eq!(response.status, TimeStatus::Awake);
    assert_eq!(app.time().state().status, TimeStatus::Sleep);
    assert_eq!(app.time().state().virtual_time, "");
}

#[tokio::test]
async fn test_start_auto_update_is_idempotent() {
    let backend = StubBackend::start().await;
    let app = logged_in(&backend);

    assert!(app.time().start_auto_update());
    assert!(!app.time().start_auto_update());
    assert!(app.time().is_auto_updating());

    assert!(app.time().stop_auto_update());
    assert!(!app.time().stop_auto_update());
    assert!(!app.time().is_auto_updating());
}

#[tokio::test]
async fn test_record_wake_at_sends_timestamp() {
    let backend = StubBackend::start().await;
    let app = logged_in(&backend);
    let at = NaiveDate::from_ymd_opt(2026, 3, 2)
        .unwrap()
        .and_hms_opt(6, 45, 0)
        .unwrap();

    app.time().record_wake_at(Some(at)).await.unwrap();
    app.time().record_wake().await.unwrap();

    let requests = backend.wake_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].wake_time, Some(at));
    assert_eq!(requests[1].wake_time, None);
    app.time().stop_auto_update();
}

#[tokio::test]
async fn test_failed_wake_keeps_state() {
    let backend = StubBackend::start().await;
    let app = backend.app(Arc::new(MemoryStore::new()));

    let err = app.time().record_wake().await.unwrap_err();

    assert_eq!(err.message(), "Unauthorized");
    assert_eq!(app.time().state(), TimeState::default());
    assert!(!app.time().is_auto_updating());
}

#[tokio::test]
async fn test_update_activity_sets_activity_and_speed() {
    let backend = StubBackend::start().await;
    let app = logged_in(&backend);

    let response = app
        .time()
        .update_activity(ActivityType::Entertainment, Some("video-player"))
        .await
        .unwrap();

    assert_eq!(response.speed, 2.0);
    let state = app.time().state();
    assert_eq!(state.activity, "entertainment");
    assert_eq!(state.speed, 2.0);
}
