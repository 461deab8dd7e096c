//! Timer lifecycle states and control actions

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Lifecycle state of a single countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    #[default]
    Stopped,
    Running,
    Paused,
    Completed,
}

impl TimerState {
    /// Lowercase name used in records and API payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerState::Stopped => "stopped",
            TimerState::Running => "running",
            TimerState::Paused => "paused",
            TimerState::Completed => "completed",
        }
    }

    /// Check if the countdown is consuming time
    pub fn is_running(&self) -> bool {
        matches!(self, TimerState::Running)
    }
}

impl fmt::Display for TimerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control action routed to a timer through the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerAction {
    Start,
    Pause,
    Reset,
    Toggle,
}

impl TimerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerAction::Start => "start",
            TimerAction::Pause => "pause",
            TimerAction::Reset => "reset",
            TimerAction::Toggle => "toggle",
        }
    }
}

impl fmt::Display for TimerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an action name is not one of start/pause/reset/toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl fmt::Display for UnknownAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown timer action '{}'", self.0)
    }
}

impl std::error::Error for UnknownAction {}

impl FromStr for TimerAction {
    type Err = UnknownAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Ok(TimerAction::Start),
            "pause" => Ok(TimerAction::Pause),
            "reset" => Ok(TimerAction::Reset),
            "toggle" => Ok(TimerAction::Toggle),
            _ => Err(UnknownAction(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names_are_lowercase() {
        assert_eq!(TimerState::Completed.to_string(), "completed");
        let json = serde_json::to_string(&TimerState::Paused).unwrap();
        assert_eq!(json, "\"paused\"");
        let parsed: TimerState = serde_json::from_str("\"running\"").unwrap();
        assert_eq!(parsed, TimerState::Running);
    }

    #[test]
    fn action_parsing_ignores_case_and_rejects_unknown() {
        assert_eq!("Toggle".parse::<TimerAction>(), Ok(TimerAction::Toggle));
        assert_eq!(" pause ".parse::<TimerAction>(), Ok(TimerAction::Pause));
        assert_eq!(
            "explode".parse::<TimerAction>(),
            Err(UnknownAction("explode".to_string()))
        );
    }
}
