//! API request and response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    scheduler::SchedulerStatus,
    state::{app_state::CompletedTimer, Timer, TimerState},
};

/// Presentation view of a timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerView {
    pub id: String,
    pub label: String,
    pub duration_seconds: u32,
    pub remaining_seconds: u64,
    pub display: String,
    pub state: TimerState,
    pub progress: f64,
    pub hotkey: Option<String>,
    pub alert: Option<Value>,
    pub font: Option<Value>,
}

impl From<&Timer> for TimerView {
    fn from(timer: &Timer) -> Self {
        Self {
            id: timer.id().to_string(),
            label: timer.label().to_string(),
            duration_seconds: timer.duration(),
            remaining_seconds: timer.remaining_whole_seconds(),
            display: timer.display_time(),
            state: timer.state(),
            progress: timer.progress(),
            hotkey: timer.hotkey().map(str::to_string),
            alert: timer.alert().cloned(),
            font: timer.font().cloned(),
        }
    }
}

/// API response structure for mutating endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerView>,
}

impl ApiResponse {
    /// Create a new API response
    pub fn new(status: &str, message: String, timer: Option<TimerView>) -> Self {
        Self {
            status: status.to_string(),
            message,
            timestamp: Utc::now(),
            timer,
        }
    }

    pub fn ok(message: String, timer: Option<TimerView>) -> Self {
        Self::new("ok", message, timer)
    }

    /// The request was understood but had no effect
    pub fn ignored(message: String, timer: Option<TimerView>) -> Self {
        Self::new("ignored", message, timer)
    }

    pub fn error(message: String) -> Self {
        Self::new("error", message, None)
    }
}

/// Duration given either as seconds or as `MM:SS` / `HH:MM:SS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationInput {
    Seconds(u64),
    Text(String),
}

/// Body of `POST /timers`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTimerRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub label: String,
    pub duration: DurationInput,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub alert: Option<Value>,
    #[serde(default)]
    pub font: Option<Value>,
}

/// Body of `PATCH /timers/:id`. An empty hotkey clears it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTimerRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub duration: Option<DurationInput>,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub alert: Option<Value>,
    #[serde(default)]
    pub font: Option<Value>,
}

/// Body of `GET /profiles`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileListResponse {
    pub active: String,
    pub profiles: Vec<String>,
    pub recent: Vec<String>,
}

/// Query of `POST /profiles/import`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportQuery {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub overwrite: bool,
}

/// Status response with scheduler and timer summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub scheduler: SchedulerStatus,
    pub tick_interval_ms: u64,
    pub profile: String,
    pub timers_total: usize,
    pub timers_running: usize,
    pub timers_paused: usize,
    pub timers_completed: usize,
    pub uptime: String,
    pub port: u16,
    pub host: String,
    pub last_action: Option<String>,
    pub last_action_time: Option<DateTime<Utc>>,
    pub last_completed: Option<CompletedTimer>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
