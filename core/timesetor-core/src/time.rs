//! Virtual-time store.
//!
//! Mirrors the backend's view of the day (virtual clock, real clock, speed,
//! activity, awake/asleep) and keeps it fresh with a background poller while
//! the user is awake.
//!
//! ## Poller
//!
//! - At most one poller task per store; starting an active poller is a no-op.
//! - Fetches inside the poller run one after another, never overlapping.
//! - Stopping aborts the task, including a request in flight.
//! - Every acknowledged mutation (wake, sleep, activity) and every stop bumps
//!   a generation counter. A fetch only applies its payload if the generation
//!   is unchanged since it was issued, so a late response can never overwrite
//!   a newer transition.

use crate::api::ApiClient;
use crate::error::{ActionError, ActionResult, ClientError};
use crate::messages::Messages;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use timesetor_protocol::{
    paths, ActivityType, ActivityUpdateRequest, ActivityUpdateResponse, CurrentTimeResponse,
    SleepRequest, SleepResponse, TimeStatus, WakeRequest, WakeResponse,
};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

const DEFAULT_SPEED: f64 = 1.0;
const DEFAULT_ACTIVITY: &str = "rest";
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeState {
    pub virtual_time: String,
    pub real_time: String,
    pub speed: f64,
    pub activity: String,
    pub status: TimeStatus,
}

impl Default for TimeState {
    fn default() -> Self {
        Self {
            virtual_time: String::new(),
            real_time: String::new(),
            speed: DEFAULT_SPEED,
            activity: DEFAULT_ACTIVITY.to_string(),
            status: TimeStatus::Unknown,
        }
    }
}

impl TimeState {
    pub fn is_awake(&self) -> bool {
        self.status == TimeStatus::Awake
    }

    fn apply_current(&mut self, response: &CurrentTimeResponse) {
        self.status = response.status;
        self.virtual_time = response.virtual_time_display.clone().unwrap_or_default();
        self.real_time = response.real_time.clone().unwrap_or_default();
        self.speed = normalize_speed(response.current_speed);
        self.activity = response
            .current_activity
            .clone()
            .filter(|activity| !activity.is_empty())
            .unwrap_or_else(|| DEFAULT_ACTIVITY.to_string());
    }

    fn apply_activity(&mut self, response: &ActivityUpdateResponse) {
        self.activity = response.activity_type.clone();
        self.speed = normalize_speed(Some(response.speed));
    }
}

/// Speed is always positive; anything else falls back to real time.
fn normalize_speed(speed: Option<f64>) -> f64 {
    match speed {
        Some(speed) if speed.is_finite() && speed > 0.0 => speed,
        _ => DEFAULT_SPEED,
    }
}

struct Tracked {
    state: TimeState,
    generation: u64,
}

struct Poller {
    handle: JoinHandle<()>,
}

struct Inner {
    api: ApiClient,
    messages: &'static Messages,
    poll_interval: Duration,
    tracked: Mutex<Tracked>,
    poller: Mutex<Option<Poller>>,
}

impl Inner {
    fn tracked(&self) -> MutexGuard<'_, Tracked> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generation(&self) -> u64 {
        self.tracked().generation
    }

    /// Applies `mutate` and invalidates every fetch issued before it.
    fn transition<F: FnOnce(&mut TimeState)>(&self, mutate: F) {
        let mut tracked = self.tracked();
        tracked.generation += 1;
        mutate(&mut tracked.state);
    }

    async fn fetch(&self) -> Option<CurrentTimeResponse> {
        let issued_at = self.generation();
        match self
            .api
            .get::<CurrentTimeResponse>(paths::TIME_CURRENT)
            .await
        {
            Ok(response) => {
                let mut tracked = self.tracked();
                if tracked.generation == issued_at {
                    tracked.state.apply_current(&response);
                } else {
                    debug!(issued_at, current = tracked.generation, "Discarding stale time fetch");
                }
                Some(response)
            }
            Err(err) => {
                debug!(error = %err, "Current time fetch failed");
                None
            }
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        let poller = self
            .poller
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(poller) = poller {
            poller.handle.abort();
        }
    }
}

/// Cheap to clone; clones share state and the poller.
#[derive(Clone)]
pub struct TimeStore {
    inner: Arc<Inner>,
}

impl TimeStore {
    /// Creates the store. A zero `poll_interval` is clamped to one millisecond.
    pub fn new(api: ApiClient, messages: &'static Messages, poll_interval: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                messages,
                poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
                tracked: Mutex::new(Tracked {
                    state: TimeState::default(),
                    generation: 0,
                }),
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> TimeState {
        self.inner.tracked().state.clone()
    }

    pub fn is_awake(&self) -> bool {
        self.inner.tracked().state.is_awake()
    }

    pub fn poll_interval(&self) -> Duration {
        self.inner.poll_interval
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Backend operations
    // ─────────────────────────────────────────────────────────────────────────────

    /// Fetches and applies the backend's current time. Any failure yields
    /// `None` and leaves the state untouched.
    pub async fn fetch_current_time(&self) -> Option<CurrentTimeResponse> {
        self.inner.fetch().await
    }

    pub async fn record_wake(&self) -> ActionResult<WakeResponse> {
        self.record_wake_at(None).await
    }

    /// Records waking up at `wake_time` (local time), or now when `None`.
    pub async fn record_wake_at(
        &self,
        wake_time: Option<NaiveDateTime>,
    ) -> ActionResult<WakeResponse> {
        let response: WakeResponse = self
            .inner
            .api
            .post(paths::TIME_WAKE, &WakeRequest { wake_time })
            .await
            .map_err(|err| self.fail("record wake", err, self.inner.messages.wake_failed))?;

        self.inner
            .transition(|state| state.status = TimeStatus::Awake);
        info!(virtual_wake_time = ?response.virtual_wake_time, "Wake recorded");
        self.start_auto_update();
        Ok(response)
    }

    pub async fn record_sleep(&self) -> ActionResult<SleepResponse> {
        self.record_sleep_at(None).await
    }

    /// Records going to sleep at `sleep_time` (local time), or now when `None`.
    pub async fn record_sleep_at(
        &self,
        sleep_time: Option<NaiveDateTime>,
    ) -> ActionResult<SleepResponse> {
        let response: SleepResponse = self
            .inner
            .api
            .post(paths::TIME_SLEEP, &SleepRequest { sleep_time })
            .await
            .map_err(|err| self.fail("record sleep", err, self.inner.messages.sleep_failed))?;

        self.stop_auto_update();
        self.inner
            .transition(|state| state.status = TimeStatus::Sleep);
        info!(virtual_sleep_time = ?response.virtual_sleep_time, "Sleep recorded");
        Ok(response)
    }

    pub async fn update_activity(
        &self,
        activity_type: ActivityType,
        app_name: Option<&str>,
    ) -> ActionResult<ActivityUpdateResponse> {
        let request = ActivityUpdateRequest {
            activity_type,
            app_name: app_name.map(str::to_string),
        };
        let response: ActivityUpdateResponse = self
            .inner
            .api
            .post(paths::ACTIVITY_UPDATE, &request)
            .await
            .map_err(|err| {
                self.fail("update activity", err, self.inner.messages.activity_failed)
            })?;

        self.inner
            .transition(|state| state.apply_activity(&response));
        debug!(activity = %response.activity_type, speed = response.speed, "Activity updated");
        Ok(response)
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Poller
    // ─────────────────────────────────────────────────────────────────────────────

    /// Starts polling the current time every `poll_interval`. Returns `false`
    /// when a poller was already running or no tokio runtime is available.
    pub fn start_auto_update(&self) -> bool {
        let mut poller = self.inner.poller();
        if poller.as_ref().is_some_and(|p| !p.handle.is_finished()) {
            return false;
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                warn!(
                    error = %ClientError::NoRuntime("time poller"),
                    "Auto update not started"
                );
                return false;
            }
        };

        let period = self.inner.poll_interval;
        let handle = runtime.spawn(poll_loop(Arc::downgrade(&self.inner), period));
        *poller = Some(Poller { handle });
        debug!(interval_ms = period.as_millis() as u64, "Auto update started");
        true
    }

    /// Stops the poller and cancels its in-flight fetch. Returns `false` when
    /// nothing was running.
    pub fn stop_auto_update(&self) -> bool {
        let poller = self.inner.poller().take();
        match poller {
            Some(poller) => {
                self.inner.transition(|_| {});
                poller.handle.abort();
                debug!("Auto update stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_auto_updating(&self) -> bool {
        self.inner
            .poller()
            .as_ref()
            .is_some_and(|p| !p.handle.is_finished())
    }

    fn fail(&self, operation: &str, err: ClientError, default_message: &str) -> ActionError {
        warn!(operation, error = %err, "Time request failed");
        ActionError::from_client(err, default_message)
    }
}

async fn poll_loop(inner: Weak<Inner>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        let Some(inner) = inner.upgrade() else {
            break;
        };
        inner.fetch().await;
    }
}
