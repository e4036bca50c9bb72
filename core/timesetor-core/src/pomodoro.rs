//! Pomodoro store: focus sessions registered with the backend plus a local
//! countdown for the one in progress.

use crate::api::ApiClient;
use crate::error::ActionError;
use crate::messages::Messages;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use timesetor_protocol::{
    paths, Ack, PomodoroEndRequest, PomodoroStartRequest, PomodoroStartResponse, PomodoroStatus,
    SessionType,
};
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PomodoroError {
    #[error("A pomodoro session is already running (id {0})")]
    AlreadyActive(i64),

    #[error("No pomodoro session is running")]
    NoActiveSession,

    #[error("Pomodoro duration must be at least one minute")]
    InvalidDuration,

    #[error(transparent)]
    Request(#[from] ActionError),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivePomodoro {
    pub session_id: i64,
    pub session_type: SessionType,
    pub planned_minutes: u32,
    pub started_at: DateTime<Local>,
    #[serde(skip)]
    started: Instant,
}

impl ActivePomodoro {
    pub fn planned(&self) -> Duration {
        Duration::from_secs(u64::from(self.planned_minutes) * 60)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn remaining(&self) -> Duration {
        self.planned().saturating_sub(self.elapsed())
    }

    pub fn is_finished(&self) -> bool {
        self.remaining().is_zero()
    }
}

/// What the backend was told when a session ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinishedPomodoro {
    pub session_id: i64,
    pub actual_minutes: u32,
    pub status: PomodoroStatus,
}

pub struct PomodoroStore {
    api: ApiClient,
    messages: &'static Messages,
    active: Mutex<Option<ActivePomodoro>>,
}

impl PomodoroStore {
    pub fn new(api: ApiClient, messages: &'static Messages) -> Self {
        Self {
            api,
            messages,
            active: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ActivePomodoro>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn active(&self) -> Option<ActivePomodoro> {
        self.slot().clone()
    }

    pub fn remaining(&self) -> Option<Duration> {
        self.slot().as_ref().map(ActivePomodoro::remaining)
    }

    pub fn is_finished(&self) -> bool {
        self.slot().as_ref().is_some_and(ActivePomodoro::is_finished)
    }

    pub async fn start(
        &self,
        duration_minutes: u32,
        session_type: SessionType,
    ) -> Result<i64, PomodoroError> {
        if duration_minutes == 0 {
            return Err(PomodoroError::InvalidDuration);
        }
        if let Some(active) = self.slot().as_ref() {
            return Err(PomodoroError::AlreadyActive(active.session_id));
        }

        let request = PomodoroStartRequest {
            duration_minutes,
            session_type,
        };
        let response: PomodoroStartResponse = self
            .api
            .post(paths::POMODORO_START, &request)
            .await
            .map_err(|err| {
                warn!(error = %err, "Pomodoro start failed");
                ActionError::from_client(err, self.messages.pomodoro_failed)
            })?;

        let mut slot = self.slot();
        if let Some(previous) = slot.as_ref() {
            warn!(
                previous = previous.session_id,
                replacement = response.session_id,
                "Concurrent pomodoro start; keeping the newest session"
            );
        }
        *slot = Some(ActivePomodoro {
            session_id: response.session_id,
            session_type,
            planned_minutes: duration_minutes,
            started_at: Local::now(),
            started: Instant::now(),
        });
        info!(
            session_id = response.session_id,
            session_type = session_type.as_str(),
            duration_minutes,
            "Pomodoro started"
        );
        Ok(response.session_id)
    }

    /// Ends the running session, reporting the locally measured duration
    /// rounded to whole minutes.
    pub async fn end(&self, status: PomodoroStatus) -> Result<FinishedPomodoro, PomodoroError> {
        let active = self.active().ok_or(PomodoroError::NoActiveSession)?;
        let actual_minutes = rounded_minutes(active.elapsed());

        let request = PomodoroEndRequest {
            session_id: active.session_id,
            actual_duration_minutes: actual_minutes,
            status,
        };
        let _: Ack = self
            .api
            .post(paths::POMODORO_END, &request)
            .await
            .map_err(|err| {
                warn!(error = %err, "Pomodoro end failed");
                ActionError::from_client(err, self.messages.pomodoro_failed)
            })?;

        let mut slot = self.slot();
        if slot.as_ref().map(|s| s.session_id) == Some(active.session_id) {
            *slot = None;
        }
        info!(session_id = active.session_id, actual_minutes, "Pomodoro ended");
        Ok(FinishedPomodoro {
            session_id: active.session_id,
            actual_minutes,
            status,
        })
    }
}

fn rounded_minutes(elapsed: Duration) -> u32 {
    u32::try_from((elapsed.as_secs() + 30) / 60).unwrap_or(u32::MAX)
}
