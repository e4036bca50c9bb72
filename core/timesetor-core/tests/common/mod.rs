//! In-process stub of the TimeSetor backend for integration tests.
//!
//! Serves the same routes as the real backend on an ephemeral port. Valid
//! credentials are `alice` / `secret`, which yield token `t1` and user `u1`.
//! Every request path is recorded so tests can assert what went over the
//! wire.

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use timesetor_core::{App, ClientConfig, KeyValueStore};
use timesetor_protocol::{
    ActivityType, ActivityUpdateRequest, ActivityUpdateResponse, Credentials, ErrorBody,
    GenerateSummaryRequest, PomodoroEndRequest, PomodoroStartRequest, Settings, SettingsPayload,
    SleepRequest, WakeRequest,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const TOKEN: &str = "t1";
pub const USER_ID: &str = "u1";

#[derive(Default)]
pub struct StubState {
    hits: Mutex<Vec<String>>,
    settings: Mutex<Settings>,
    current: Mutex<Value>,
    current_delay: Mutex<Duration>,
    wake_requests: Mutex<Vec<WakeRequest>>,
    pomodoro_starts: Mutex<Vec<PomodoroStartRequest>>,
    pomodoro_ends: Mutex<Vec<PomodoroEndRequest>>,
}

impl StubState {
    fn hit(&self, path: &str) {
        self.hits.lock().unwrap().push(path.to_string());
    }
}

pub struct StubBackend {
    pub base_url: String,
    state: Arc<StubState>,
    server: JoinHandle<()>,
}

impl StubBackend {
    pub async fn start() -> Self {
        let state = Arc::new(StubState::default());
        *state.current.lock().unwrap() = json!({
            "status": "awake",
            "real_time": "2026-03-02 08:00:00",
            "virtual_time_display": "08:30",
            "current_speed": 1.5,
            "current_activity": "study",
        });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = router(state.clone());
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
            server,
        }
    }

    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.api.base_url = self.base_url.clone();
        config.api.timeout_ms = 2_000;
        config.time.poll_interval_ms = 25;
        config
    }

    pub fn app(&self, store: Arc<dyn KeyValueStore>) -> App {
        App::with_store(self.config(), store).unwrap()
    }

    pub fn hits(&self) -> Vec<String> {
        self.state.hits.lock().unwrap().clone()
    }

    pub fn hit_count(&self, path: &str) -> usize {
        self.hits().iter().filter(|hit| hit.as_str() == path).count()
    }

    pub fn server_settings(&self) -> Settings {
        self.state.settings.lock().unwrap().clone()
    }

    pub fn set_server_settings(&self, settings: Value) {
        let Value::Object(settings) = settings else {
            panic!("settings must be an object");
        };
        *self.state.settings.lock().unwrap() = settings;
    }

    pub fn set_current(&self, payload: Value) {
        *self.state.current.lock().unwrap() = payload;
    }

    /// Delays every `GET /time/current` response.
    pub fn delay_current(&self, delay: Duration) {
        *self.state.current_delay.lock().unwrap() = delay;
    }

    pub fn wake_requests(&self) -> Vec<WakeRequest> {
        self.state.wake_requests.lock().unwrap().clone()
    }

    pub fn pomodoro_starts(&self) -> Vec<PomodoroStartRequest> {
        self.state.pomodoro_starts.lock().unwrap().clone()
    }

    pub fn pomodoro_ends(&self) -> Vec<PomodoroEndRequest> {
        self.state.pomodoro_ends.lock().unwrap().clone()
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Arc<StubState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/register", post(register))
        .route("/api/user/settings", get(get_settings).put(put_settings))
        .route("/api/time/current", get(current_time))
        .route("/api/time/wake", post(wake))
        .route("/api/time/sleep", post(sleep))
        .route("/api/activity/update", post(update_activity))
        .route("/api/pomodoro/start", post(pomodoro_start))
        .route("/api/pomodoro/end", post(pomodoro_end))
        .route("/api/data/daily", get(daily))
        .route("/api/data/weekly", get(weekly))
        .route("/api/summaries", get(summaries))
        .route("/api/summaries/generate", post(generate_summary))
        .route("/api/config", get(server_config))
        .route("/api/health", get(health))
        .with_state(state)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(ErrorBody::new(message))).into_response()
}

fn authorize(headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(error(StatusCode::UNAUTHORIZED, "Unauthorized")),
    }
}

async fn login(State(state): State<Arc<StubState>>, Json(creds): Json<Credentials>) -> Response {
    state.hit("/auth/login");
    if creds.username != "alice" || creds.password != "secret" {
        return error(StatusCode::UNAUTHORIZED, "bad credentials");
    }
    let settings = state.settings.lock().unwrap().clone();
    Json(json!({ "token": TOKEN, "user_id": USER_ID, "settings": settings })).into_response()
}

async fn register(State(state): State<Arc<StubState>>, Json(creds): Json<Credentials>) -> Response {
    state.hit("/auth/register");
    if creds.username == "alice" {
        return error(StatusCode::BAD_REQUEST, "Username already exists");
    }
    // The real backend sends a numeric id here.
    Json(json!({ "token": TOKEN, "user_id": 2 })).into_response()
}

async fn get_settings(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.hit("/user/settings");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let settings = state.settings.lock().unwrap().clone();
    Json(SettingsPayload { settings }).into_response()
}

async fn put_settings(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(payload): Json<SettingsPayload>,
) -> Response {
    state.hit("/user/settings");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.settings.lock().unwrap().extend(payload.settings);
    Json(json!({ "success": true })).into_response()
}

async fn current_time(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.hit("/time/current");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let delay = *state.current_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let payload = state.current.lock().unwrap().clone();
    Json(payload).into_response()
}

async fn wake(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<WakeRequest>,
) -> Response {
    state.hit("/time/wake");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.wake_requests.lock().unwrap().push(request);
    Json(json!({ "virtual_wake_time": "07:00", "entertainment_multiplier": 1.2 })).into_response()
}

async fn sleep(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(_request): Json<SleepRequest>,
) -> Response {
    state.hit("/time/sleep");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    Json(json!({ "virtual_sleep_time": "23:00" })).into_response()
}

async fn update_activity(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<ActivityUpdateRequest>,
) -> Response {
    state.hit("/activity/update");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let speed = match request.activity_type {
        ActivityType::Entertainment => 2.0,
        ActivityType::Study => 0.8,
        _ => 1.0,
    };
    Json(ActivityUpdateResponse {
        activity_type: request.activity_type.as_str().to_string(),
        speed,
    })
    .into_response()
}

async fn pomodoro_start(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<PomodoroStartRequest>,
) -> Response {
    state.hit("/pomodoro/start");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let mut starts = state.pomodoro_starts.lock().unwrap();
    starts.push(request);
    Json(json!({ "session_id": 40 + starts.len() as i64 })).into_response()
}

async fn pomodoro_end(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<PomodoroEndRequest>,
) -> Response {
    state.hit("/pomodoro/end");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    state.pomodoro_ends.lock().unwrap().push(request);
    Json(json!({ "success": true })).into_response()
}

async fn daily(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("/data/daily");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let date = query
        .get("date")
        .cloned()
        .unwrap_or_else(|| "2026-03-02".to_string());
    if date == "1999-01-01" {
        return error(StatusCode::NOT_FOUND, "No record for this date");
    }
    Json(json!({
        "daily_record": { "id": 1, "date": date, "status": "awake", "user_id": 1 },
        "time_logs": [
            { "activity_type": "study", "speed_multiplier": 0.8, "duration_seconds": 1500 }
        ],
        "pomodoro_sessions": [
            { "id": 41, "session_type": "work", "status": "completed", "actual_duration_minutes": 25 }
        ],
    }))
    .into_response()
}

async fn weekly(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.hit("/data/weekly");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    Json(json!({
        "records": [
            { "id": 2, "date": "2026-03-02" },
            { "id": 1, "date": "2026-03-01" },
        ]
    }))
    .into_response()
}

async fn summaries(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    state.hit("/summaries");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    let summary_type = query.get("type").cloned().unwrap_or_else(|| "daily".to_string());
    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(10);
    let summaries: Vec<Value> = (1..=3)
        .take(limit)
        .map(|id| json!({ "id": id, "summary_type": summary_type, "summary_text": "ok" }))
        .collect();
    Json(json!({ "summaries": summaries })).into_response()
}

async fn generate_summary(
    State(state): State<Arc<StubState>>,
    headers: HeaderMap,
    Json(request): Json<GenerateSummaryRequest>,
) -> Response {
    state.hit("/summaries/generate");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    Json(json!({ "summary": format!("{} summary", request.summary_type) })).into_response()
}

async fn server_config(State(state): State<Arc<StubState>>, headers: HeaderMap) -> Response {
    state.hit("/config");
    if let Err(denied) = authorize(&headers) {
        return denied;
    }
    Json(json!({ "pomodoro": { "work_duration": 25 }, "target_wake_time": "07:00" }))
        .into_response()
}

async fn health(State(state): State<Arc<StubState>>) -> Response {
    state.hit("/health");
    Json(json!({ "status": "ok", "timestamp": "2026-03-02T08:00:00" })).into_response()
}
