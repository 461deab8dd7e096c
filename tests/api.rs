//! HTTP control surface

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use countdown_deck::{
    api::create_router,
    profile::{Profile, ProfileStore},
    scheduler::{ManualClock, Scheduler, DEFAULT_TICK_INTERVAL},
    state::{AppState, Timer},
};

struct Harness {
    _tmp: tempfile::TempDir,
    clock: Arc<ManualClock>,
    state: Arc<AppState>,
    app: Router,
}

fn harness() -> Harness {
    let tmp = tempfile::tempdir().unwrap();
    let clock = Arc::new(ManualClock::new(0.0));
    let scheduler = Arc::new(Scheduler::with_clock(DEFAULT_TICK_INTERVAL, clock.clone()));
    let store = ProfileStore::new(tmp.path().join("profiles")).unwrap();

    let mut profile = Profile::named("test");
    profile
        .timers
        .push(Timer::with_id("pearl", "Pearl", 90).unwrap().to_record());

    let state = Arc::new(AppState::new(
        scheduler,
        store,
        profile,
        "127.0.0.1".to_string(),
        0,
    ));
    state.install_observers();
    let app = create_router(Arc::clone(&state));

    Harness { _tmp: tmp, clock, state, app }
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn health_reports_ok() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn lists_profile_timers() {
    let h = harness();
    let (status, body) = send(&h.app, Method::GET, "/timers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], "pearl");
    assert_eq!(body[0]["display"], "01:30");
    assert_eq!(body[0]["state"], "stopped");
}

#[tokio::test]
async fn create_accepts_clock_style_durations() {
    let h = harness();
    let (status, body) = send(
        &h.app,
        Method::POST,
        "/timers",
        Some(json!({"id": "brew", "label": "Brew", "duration": "04:00", "hotkey": "ctrl+shift+2"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["timer"]["duration_seconds"], 240);
    assert_eq!(body["timer"]["hotkey"], "ctrl+shift+2");

    let (status, body) = send(&h.app, Method::GET, "/timers/brew", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["display"], "04:00");
}

#[tokio::test]
async fn create_rejects_invalid_input() {
    let h = harness();
    let bad = [
        json!({"label": "", "duration": 60}),
        json!({"label": "Zero", "duration": 0}),
        json!({"label": "Long", "duration": 100_000}),
        json!({"label": "Garbage", "duration": "soon"}),
        json!({"label": "Keys", "duration": 60, "hotkey": "ctrl+a+b"}),
    ];
    for body in bad {
        let (status, response) = send(&h.app, Method::POST, "/timers", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["status"], "error");
    }
    assert_eq!(h.state.scheduler.len(), 1);
}

#[tokio::test]
async fn actions_drive_the_countdown() {
    let h = harness();
    let (status, body) = send(&h.app, Method::POST, "/timers/pearl/start", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["state"], "running");

    h.clock.advance(30.0);
    h.state.scheduler.tick();

    let (_, body) = send(&h.app, Method::POST, "/timers/pearl/pause", None).await;
    assert_eq!(body["timer"]["state"], "paused");
    assert_eq!(body["timer"]["display"], "01:00");

    let (_, body) = send(&h.app, Method::POST, "/timers/pearl/reset", None).await;
    assert_eq!(body["timer"]["state"], "stopped");
    assert_eq!(body["timer"]["remaining_seconds"], 90);

    let (_, status) = send(&h.app, Method::GET, "/status", None).await;
    assert_eq!(status["last_action"], "reset");
}

#[tokio::test]
async fn unknown_action_is_ignored_and_unknown_timer_is_404() {
    let h = harness();
    let (status, body) = send(&h.app, Method::POST, "/timers/pearl/launch", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");
    assert_eq!(body["timer"]["state"], "stopped");

    let (status, _) = send(&h.app, Method::POST, "/timers/ghost/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_reconfigures_without_rewinding() {
    let h = harness();
    send(&h.app, Method::POST, "/timers/pearl/start", None).await;
    h.clock.advance(10.0);
    h.state.scheduler.tick();

    let (status, body) = send(
        &h.app,
        Method::PATCH,
        "/timers/pearl",
        Some(json!({"label": "Ender Pearl", "duration": 120, "alert": {"audio": {"volume": 50}}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["timer"]["label"], "Ender Pearl");
    assert_eq!(body["timer"]["duration_seconds"], 120);
    assert_eq!(body["timer"]["remaining_seconds"], 80);
    assert_eq!(body["timer"]["alert"]["audio"]["volume"], 50);

    let (status, _) = send(
        &h.app,
        Method::PATCH,
        "/timers/pearl",
        Some(json!({"duration": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn delete_removes_timer() {
    let h = harness();
    let (status, _) = send(&h.app, Method::DELETE, "/timers/pearl", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&h.app, Method::DELETE, "/timers/pearl", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, body) = send(&h.app, Method::GET, "/timers", None).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn status_reports_counts_and_completion() {
    let h = harness();
    send(&h.app, Method::POST, "/timers/pearl/start", None).await;
    h.clock.advance(100.0);
    h.state.scheduler.tick();

    let (status, body) = send(&h.app, Method::GET, "/status", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["scheduler"], "idle");
    assert_eq!(body["profile"], "test");
    assert_eq!(body["timers_total"], 1);
    assert_eq!(body["timers_completed"], 1);
    assert_eq!(body["last_completed"]["id"], "pearl");
}

#[tokio::test]
async fn save_profile_persists_current_timers() {
    let h = harness();
    send(
        &h.app,
        Method::POST,
        "/timers",
        Some(json!({"id": "brew", "label": "Brew", "duration": 240})),
    )
    .await;

    let (status, body) = send(&h.app, Method::POST, "/profile/save", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let saved = h.state.store.load("test").unwrap().unwrap();
    let ids: Vec<String> = saved
        .timers
        .iter()
        .filter_map(|t| t.id.as_ref().map(|id| id.to_string()))
        .collect();
    assert_eq!(ids, ["pearl", "brew"]);
}

#[tokio::test]
async fn profiles_can_be_imported_listed_and_exported() {
    let h = harness();
    let doc = json!({
        "profile_name": "Boss: Phase 2",
        "global_settings": {"theme": "light"},
        "timers": [{"id": "enrage", "label": "Enrage", "duration_seconds": 600}]
    });

    let (status, body) = send(&h.app, Method::POST, "/profiles/import", Some(doc.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Profile imported as 'Boss_ Phase 2'");

    let (status, _) = send(&h.app, Method::POST, "/profiles/import", Some(doc.clone())).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(
        &h.app,
        Method::POST,
        "/profiles/import?name=boss&overwrite=true",
        Some(doc),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&h.app, Method::GET, "/profiles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["active"], "test");
    assert_eq!(body["profiles"], json!(["Boss_ Phase 2", "boss"]));

    let (status, body) = send(&h.app, Method::GET, "/profiles/boss", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profile_name"], "boss");
    assert_eq!(body["global_settings"]["theme"], "light");
    assert_eq!(body["global_settings"]["default_font"]["family"], "Arial");
    assert_eq!(body["timers"][0]["id"], "enrage");

    let (status, _) = send(&h.app, Method::GET, "/profiles/nothing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn loading_a_profile_swaps_the_timers() {
    let h = harness();
    let doc = json!({"timers": [{"id": "enrage", "label": "Enrage", "duration_seconds": 600}]});
    send(&h.app, Method::POST, "/profiles/import?name=boss", Some(doc)).await;
    send(&h.app, Method::POST, "/timers/pearl/start", None).await;

    let (status, body) = send(&h.app, Method::POST, "/profiles/boss/load", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (_, body) = send(&h.app, Method::GET, "/timers", None).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], "enrage");

    let (_, body) = send(&h.app, Method::GET, "/profiles", None).await;
    assert_eq!(body["active"], "boss");
    assert_eq!(body["recent"][0], "boss");
    assert_eq!(h.state.store.load_session().last_active_profile, "boss");

    // The profile switched away from was saved with its running timer
    let saved = h.state.store.load("test").unwrap().unwrap();
    assert_eq!(saved.timers[0].id.as_ref().unwrap().as_str(), "pearl");

    let (_, body) = send(&h.app, Method::POST, "/profiles/boss/load", None).await;
    assert_eq!(body["status"], "ignored");
    let (status, _) = send(&h.app, Method::POST, "/profiles/ghost/load", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_deletion_protects_default_and_active() {
    let h = harness();
    send(&h.app, Method::POST, "/profiles/import?name=old", Some(json!({}))).await;

    let (status, _) = send(&h.app, Method::DELETE, "/profiles/default", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&h.app, Method::DELETE, "/profiles/test", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = send(&h.app, Method::DELETE, "/profiles/a%3Ab", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&h.app, Method::DELETE, "/profiles/old", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&h.app, Method::DELETE, "/profiles/old", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
