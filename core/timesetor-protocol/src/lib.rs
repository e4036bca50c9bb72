//! HTTP API types for the TimeSetor backend.
//!
//! This crate is shared by the client and by test backends to prevent schema
//! drift. The backend remains the authority on validation; the client only
//! relies on the fields below.

use chrono::{NaiveDate, NaiveDateTime};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// User settings as stored by the backend: an open JSON mapping.
pub type Settings = Map<String, Value>;

/// Endpoint paths, relative to the API base URL.
pub mod paths {
    pub const AUTH_LOGIN: &str = "/auth/login";
    pub const AUTH_REGISTER: &str = "/auth/register";
    pub const USER_SETTINGS: &str = "/user/settings";
    pub const TIME_CURRENT: &str = "/time/current";
    pub const TIME_WAKE: &str = "/time/wake";
    pub const TIME_SLEEP: &str = "/time/sleep";
    pub const ACTIVITY_UPDATE: &str = "/activity/update";
    pub const POMODORO_START: &str = "/pomodoro/start";
    pub const POMODORO_END: &str = "/pomodoro/end";
    pub const DATA_DAILY: &str = "/data/daily";
    pub const DATA_WEEKLY: &str = "/data/weekly";
    pub const SUMMARIES: &str = "/summaries";
    pub const SUMMARIES_GENERATE: &str = "/summaries/generate";
    pub const CONFIG: &str = "/config";
    pub const HEALTH: &str = "/health";
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors and acknowledgements
// ─────────────────────────────────────────────────────────────────────────────

/// Body of every non-2xx response the backend produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Generic `{"success": true}` acknowledgement.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Auth & settings
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResponse {
    pub token: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegisterResponse {
    pub token: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SettingsPayload {
    #[serde(default, deserialize_with = "deserialize_settings")]
    pub settings: Settings,
}

/// The backend hands out integer ids; older builds sent strings. Both are
/// kept in their decimal string form.
fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        Value::Number(id) => Ok(id.to_string()),
        other => Err(de::Error::custom(format!("invalid user_id: {}", other))),
    }
}

/// `null` settings are treated as an empty mapping.
fn deserialize_settings<'de, D>(deserializer: D) -> Result<Settings, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Settings>::deserialize(deserializer)?.unwrap_or_default())
}

// ─────────────────────────────────────────────────────────────────────────────
// Virtual time
// ─────────────────────────────────────────────────────────────────────────────

/// Day status reported by `GET /time/current`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeStatus {
    Awake,
    Sleep,
    /// The backend has no wake record for today yet.
    NotAwake,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TimeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeStatus::Awake => "awake",
            TimeStatus::Sleep => "sleep",
            TimeStatus::NotAwake => "not_awake",
            TimeStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CurrentTimeResponse {
    #[serde(default)]
    pub status: TimeStatus,
    #[serde(default)]
    pub real_time: Option<String>,
    #[serde(default)]
    pub virtual_time: Option<String>,
    #[serde(default)]
    pub virtual_time_display: Option<String>,
    #[serde(default)]
    pub current_speed: Option<f64>,
    #[serde(default)]
    pub current_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WakeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WakeResponse {
    #[serde(default)]
    pub virtual_wake_time: Option<String>,
    #[serde(default)]
    pub entertainment_multiplier: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SleepRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sleep_time: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SleepResponse {
    #[serde(default)]
    pub virtual_sleep_time: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Activity
// ─────────────────────────────────────────────────────────────────────────────

/// Activity categories the backend maps to speed multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Rest,
    Entertainment,
    Study,
    PomodoroBreak,
    Sleep,
}

impl ActivityType {
    pub const ALL: [ActivityType; 5] = [
        ActivityType::Rest,
        ActivityType::Entertainment,
        ActivityType::Study,
        ActivityType::PomodoroBreak,
        ActivityType::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityType::Rest => "rest",
            ActivityType::Entertainment => "entertainment",
            ActivityType::Study => "study",
            ActivityType::PomodoroBreak => "pomodoro_break",
            ActivityType::Sleep => "sleep",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace('-', "_");
        ActivityType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown activity type: {}", value))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivityUpdateRequest {
    pub activity_type: ActivityType,
    pub app_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActivityUpdateResponse {
    pub activity_type: String,
    pub speed: f64,
}

// ─────────────────────────────────────────────────────────────────────────────
// Pomodoro
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short_break",
            SessionType::LongBreak => "long_break",
        }
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "work" => Ok(SessionType::Work),
            "short_break" | "break" => Ok(SessionType::ShortBreak),
            "long_break" => Ok(SessionType::LongBreak),
            _ => Err(format!("unknown session type: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PomodoroStatus {
    #[default]
    Completed,
    Interrupted,
}

impl FromStr for PomodoroStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "completed" => Ok(PomodoroStatus::Completed),
            "interrupted" => Ok(PomodoroStatus::Interrupted),
            _ => Err(format!("unknown pomodoro status: {}", value)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroStartRequest {
    pub duration_minutes: u32,
    pub session_type: SessionType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroStartResponse {
    pub session_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PomodoroEndRequest {
    pub session_id: i64,
    pub actual_duration_minutes: u32,
    pub status: PomodoroStatus,
}

// ─────────────────────────────────────────────────────────────────────────────
// Records & summaries
// ─────────────────────────────────────────────────────────────────────────────

/// One row of the backend's daily record table. Columns the client does not
/// interpret are kept in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub real_wake_time: Option<String>,
    #[serde(default)]
    pub real_sleep_time: Option<String>,
    #[serde(default)]
    pub real_wake_time_display: Option<String>,
    #[serde(default)]
    pub virtual_sleep_time_display: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TimeLog {
    #[serde(default)]
    pub real_timestamp: Option<String>,
    #[serde(default)]
    pub virtual_time_display: Option<String>,
    #[serde(default)]
    pub activity_type: Option<String>,
    #[serde(default)]
    pub speed_multiplier: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PomodoroRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub planned_duration_minutes: Option<i64>,
    #[serde(default)]
    pub actual_duration_minutes: Option<i64>,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyDataResponse {
    pub daily_record: DailyRecord,
    #[serde(default)]
    pub time_logs: Vec<TimeLog>,
    #[serde(default)]
    pub pomodoro_sessions: Vec<PomodoroRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WeeklyDataResponse {
    #[serde(default)]
    pub records: Vec<DailyRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Summary {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub summary_type: Option<String>,
    #[serde(default)]
    pub period_start: Option<String>,
    #[serde(default)]
    pub period_end: Option<String>,
    #[serde(default)]
    pub summary_text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SummariesResponse {
    #[serde(default)]
    pub summaries: Vec<Summary>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateSummaryRequest {
    #[serde(rename = "type")]
    pub summary_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateSummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}
