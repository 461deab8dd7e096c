//! Countdown timer entity and its serialized record

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::TimerState;
use crate::error::TimerError;

/// Opaque, immutable timer identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimerId(String);

impl TimerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TimerId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TimerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What a call to [`Timer::advance`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Timer was not running; nothing changed and nothing should be signalled
    Idle,
    /// Time was consumed; a tick should be signalled
    Ticked,
    /// Time ran out; both completion and tick should be signalled
    Completed,
}

impl Advance {
    pub fn ticked(&self) -> bool {
        !matches!(self, Advance::Idle)
    }

    pub fn completed(&self) -> bool {
        matches!(self, Advance::Completed)
    }
}

/// A single countdown state machine.
///
/// All time readings are seconds from a [`Clock`](crate::scheduler::Clock);
/// only differences between readings matter.
#[derive(Debug, Clone, PartialEq)]
pub struct Timer {
    id: TimerId,
    label: String,
    duration: u32,
    remaining: f64,
    state: TimerState,
    /// Clock anchor, present only while running
    last_tick: Option<f64>,
    hotkey: Option<String>,
    alert: Option<Value>,
    font: Option<Value>,
}

impl Timer {
    /// Create a stopped timer with a generated identifier
    pub fn new(label: impl Into<String>, duration: u32) -> Result<Self, TimerError> {
        Self::with_id(TimerId::generate(), label, duration)
    }

    /// Create a stopped timer with a caller-supplied identifier
    pub fn with_id(
        id: impl Into<TimerId>,
        label: impl Into<String>,
        duration: u32,
    ) -> Result<Self, TimerError> {
        if duration == 0 {
            return Err(TimerError::ZeroDuration);
        }

        Ok(Self {
            id: id.into(),
            label: label.into(),
            duration,
            remaining: f64::from(duration),
            state: TimerState::Stopped,
            last_tick: None,
            hotkey: None,
            alert: None,
            font: None,
        })
    }

    pub fn with_hotkey(mut self, hotkey: impl Into<String>) -> Self {
        self.hotkey = Some(hotkey.into());
        self
    }

    pub fn with_alert(mut self, alert: Value) -> Self {
        self.alert = Some(alert);
        self
    }

    pub fn with_font(mut self, font: Value) -> Self {
        self.font = Some(font);
        self
    }

    pub fn id(&self) -> &TimerId {
        &self.id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration(&self) -> u32 {
        self.duration
    }

    /// Remaining seconds, with sub-second precision
    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    /// Remaining seconds, floored
    pub fn remaining_whole_seconds(&self) -> u64 {
        self.remaining.max(0.0).floor() as u64
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn hotkey(&self) -> Option<&str> {
        self.hotkey.as_deref()
    }

    pub fn alert(&self) -> Option<&Value> {
        self.alert.as_ref()
    }

    pub fn font(&self) -> Option<&Value> {
        self.font.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.state == TimerState::Completed
    }

    /// Whether a clock anchor is currently held
    pub fn is_anchored(&self) -> bool {
        self.last_tick.is_some()
    }

    /// Fraction of the duration already consumed, in 0..=1
    pub fn progress(&self) -> f64 {
        (1.0 - self.remaining / f64::from(self.duration)).clamp(0.0, 1.0)
    }

    /// Start counting down. A stopped timer is rewound to its full duration
    /// first; every other state is left untouched.
    pub fn start(&mut self, now: f64) {
        if self.state != TimerState::Stopped {
            return;
        }
        self.remaining = f64::from(self.duration);
        self.state = TimerState::Running;
        self.last_tick = Some(now);
    }

    pub fn pause(&mut self) {
        if self.state != TimerState::Running {
            return;
        }
        self.state = TimerState::Paused;
        self.last_tick = None;
    }

    /// Resume a paused timer; the anchor restarts at `now` so the paused
    /// interval is never charged.
    pub fn resume(&mut self, now: f64) {
        if self.state != TimerState::Paused {
            return;
        }
        self.state = TimerState::Running;
        self.last_tick = Some(now);
    }

    /// Stop and rewind. The only way out of `Completed`.
    pub fn reset(&mut self) {
        self.state = TimerState::Stopped;
        self.remaining = f64::from(self.duration);
        self.last_tick = None;
    }

    pub fn toggle(&mut self, now: f64) {
        match self.state {
            TimerState::Running => self.pause(),
            TimerState::Paused => self.resume(now),
            TimerState::Stopped => self.start(now),
            TimerState::Completed => {}
        }
    }

    /// Consume the time elapsed since the clock anchor.
    pub fn advance(&mut self, now: f64) -> Advance {
        let Some(last_tick) = self.last_tick else {
            return Advance::Idle;
        };
        if self.state != TimerState::Running {
            return Advance::Idle;
        }

        // Backwards or non-finite readings consume nothing
        let elapsed = now - last_tick;
        let elapsed = if elapsed.is_finite() { elapsed.max(0.0) } else { 0.0 };
        self.last_tick = Some(now);
        self.remaining -= elapsed;

        if self.remaining <= 0.0 {
            self.remaining = 0.0;
            self.state = TimerState::Completed;
            self.last_tick = None;
            Advance::Completed
        } else {
            Advance::Ticked
        }
    }

    /// Re-establish the clock anchor of a running timer that has none,
    /// e.g. one restored from a record. Returns whether an anchor was set.
    pub(crate) fn anchor_if_running(&mut self, now: f64) -> bool {
        if self.state == TimerState::Running && self.last_tick.is_none() {
            self.last_tick = Some(now);
            true
        } else {
            false
        }
    }

    /// Remaining time as zero-padded `MM:SS`; minutes are not capped at 99.
    pub fn display_time(&self) -> String {
        let total = self.remaining_whole_seconds();
        format!("{:02}:{:02}", total / 60, total % 60)
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    /// Change the configured duration. `remaining` is only pulled down when
    /// it would otherwise exceed the new duration.
    pub fn set_duration(&mut self, duration: u32) -> Result<(), TimerError> {
        if duration == 0 {
            return Err(TimerError::ZeroDuration);
        }
        self.duration = duration;
        self.remaining = self.remaining.min(f64::from(duration));
        Ok(())
    }

    pub fn set_hotkey(&mut self, hotkey: Option<String>) {
        self.hotkey = hotkey;
    }

    pub fn set_alert(&mut self, alert: Option<Value>) {
        self.alert = alert;
    }

    pub fn set_font(&mut self, font: Option<Value>) {
        self.font = font;
    }

    /// Snapshot into the persisted shape. Sub-second precision is dropped.
    pub fn to_record(&self) -> TimerRecord {
        TimerRecord {
            id: Some(self.id.clone()),
            label: self.label.clone(),
            duration_seconds: self.duration,
            hotkey: self.hotkey.clone(),
            state: Some(StateRecord {
                current_state: self.state,
                remaining_seconds: Some(self.remaining_whole_seconds()),
            }),
            alert: self.alert.clone(),
            font: self.font.clone(),
        }
    }

    /// Rebuild a timer from its persisted shape. The result never holds a
    /// clock anchor. Saved remaining time is kept, clamped to the duration,
    /// and a timer saved at zero comes back completed.
    pub fn from_record(record: TimerRecord) -> Result<Self, TimerError> {
        let id = record.id.unwrap_or_else(TimerId::generate);
        let mut timer = Self::with_id(id, record.label, record.duration_seconds)?;
        timer.hotkey = record.hotkey;
        timer.alert = record.alert;
        timer.font = record.font;

        let Some(saved) = record.state else {
            return Ok(timer);
        };

        let duration = f64::from(timer.duration);
        let remaining = saved
            .remaining_seconds
            .map(|secs| (secs as f64).min(duration))
            .unwrap_or(duration);

        match saved.current_state {
            TimerState::Completed => {
                timer.state = TimerState::Completed;
                timer.remaining = 0.0;
            }
            state => {
                if remaining <= 0.0 {
                    timer.state = TimerState::Completed;
                    timer.remaining = 0.0;
                } else {
                    timer.state = state;
                    timer.remaining = remaining;
                }
            }
        }

        Ok(timer)
    }
}

/// Persisted `{state, remaining}` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    #[serde(default)]
    pub current_state: TimerState,
    #[serde(default)]
    pub remaining_seconds: Option<u64>,
}

/// Persisted shape of a timer, as embedded in profiles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerRecord {
    #[serde(default)]
    pub id: Option<TimerId>,
    pub label: String,
    pub duration_seconds: u32,
    #[serde(default)]
    pub hotkey: Option<String>,
    #[serde(default)]
    pub state: Option<StateRecord>,
    #[serde(default)]
    pub alert: Option<Value>,
    #[serde(default)]
    pub font: Option<Value>,
}
