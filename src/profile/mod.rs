//! Profiles: named timer lists persisted between runs
//!
//! A profile embeds the serialized timer list plus a `global_settings`
//! blob owned by presentation layers. Settings missing from a stored
//! profile are filled from [`default_global_settings`].

pub mod session;
pub mod store;

pub use session::Session;
pub use store::ProfileStore;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::{scheduler::Scheduler, state::TimerRecord};

pub const PROFILE_VERSION: &str = "1.0";
pub const DEFAULT_PROFILE_NAME: &str = "default";

/// Persisted profile document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default = "default_profile_name")]
    pub profile_name: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Presentation preferences; keys are merged over the defaults on load
    #[serde(
        default = "default_global_settings",
        deserialize_with = "merge_over_defaults"
    )]
    pub global_settings: Value,
    #[serde(default)]
    pub timers: Vec<TimerRecord>,
}

fn default_profile_name() -> String {
    DEFAULT_PROFILE_NAME.to_string()
}

fn default_version() -> String {
    PROFILE_VERSION.to_string()
}

/// Presentation defaults for a profile
pub fn default_global_settings() -> Value {
    json!({
        "theme": "dark",
        "always_on_top": true,
        "window_position": {"x": 100, "y": 100},
        "window_size": {"width": 400, "height": 300},
        "default_font": {"family": "Arial", "size": 12, "bold": false},
        "default_alert": {
            "visual": {
                "flash_numbers": true,
                "flash_background": true,
                "flash_window": false,
                "flash_taskbar": true,
                "flash_duration_ms": 3000,
                "flash_interval_ms": 500
            },
            "audio": {
                "enabled": true,
                "file": "assets/sounds/beepbeep.wav",
                "volume": 80
            }
        }
    })
}

/// Top-level keys of the stored settings replace the defaults'
fn merge_over_defaults<'de, D>(deserializer: D) -> Result<Value, D::Error>
where
    D: Deserializer<'de>,
{
    let mut settings = default_global_settings();
    match Value::deserialize(deserializer)? {
        Value::Null => {}
        Value::Object(stored) => {
            if let Value::Object(base) = &mut settings {
                base.extend(stored);
            }
        }
        other => {
            return Err(de::Error::custom(format!(
                "global_settings must be an object, found {}",
                other
            )))
        }
    }
    Ok(settings)
}

impl Profile {
    /// An empty profile with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            profile_name: name.into(),
            version: default_version(),
            global_settings: default_global_settings(),
            timers: Vec::new(),
        }
    }

    /// Replace the scheduler's timers with this profile's. Returns how many
    /// timers were registered.
    pub fn apply_to(&self, scheduler: &Scheduler) -> usize {
        scheduler.load_records(self.timers.clone())
    }

    /// Copy the scheduler's current timers into this profile
    pub fn capture(&mut self, scheduler: &Scheduler) {
        self.timers = scheduler.to_records();
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::named(DEFAULT_PROFILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{Timer, TimerAction, TimerState};

    #[test]
    fn missing_fields_take_defaults() {
        let profile: Profile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile, Profile::default());
    }

    #[test]
    fn stored_settings_override_defaults() {
        let raw = json!({
            "profile_name": "Raid",
            "version": "1.0",
            "global_settings": {"theme": "light", "always_on_top": false, "custom": 1},
            "timers": [{"id": "a", "label": "Pearl", "duration_seconds": 30}]
        });
        let profile: Profile = serde_json::from_value(raw).unwrap();
        let settings = &profile.global_settings;
        assert_eq!(settings["theme"], "light");
        assert_eq!(settings["always_on_top"], false);
        assert_eq!(settings["custom"], 1);
        assert_eq!(settings["default_font"]["family"], "Arial");
        assert_eq!(settings["default_alert"]["audio"]["volume"], 80);
        assert_eq!(profile.timers.len(), 1);
    }

    #[test]
    fn sparse_settings_load_like_the_defaults() {
        let profile: Profile =
            serde_json::from_value(json!({"global_settings": null})).unwrap();
        assert_eq!(profile.global_settings, default_global_settings());

        let err = serde_json::from_value::<Profile>(json!({"global_settings": "dark"}));
        assert!(err.is_err());
    }

    #[test]
    fn capture_then_apply_restores_timers() {
        let scheduler = Scheduler::default();
        scheduler.register(Timer::with_id("a", "A", 60).unwrap());
        scheduler.register(Timer::with_id("b", "B", 90).unwrap());
        scheduler.run_action("b", TimerAction::Start);
        scheduler.run_action("b", TimerAction::Pause);

        let mut profile = Profile::named("test");
        profile.capture(&scheduler);
        assert_eq!(profile.timers.len(), 2);

        let other = Scheduler::default();
        other.register(Timer::with_id("stale", "Stale", 5).unwrap());
        assert_eq!(profile.apply_to(&other), 2);
        assert!(other.get("stale").is_none());
        assert_eq!(other.get("b").unwrap().state(), TimerState::Paused);
    }
}
