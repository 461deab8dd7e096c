//! Application session: which profile was active last, and recent history

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{default_profile_name, DEFAULT_PROFILE_NAME};

/// File name of the session document, stored beside the profiles directory
pub const SESSION_FILE: &str = "app_state.json";

const MAX_RECENT_PROFILES: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "default_profile_name")]
    pub last_active_profile: String,
    #[serde(default)]
    pub recent_profiles: Vec<String>,
    /// Presentation state such as window geometry; kept as-is
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            last_active_profile: DEFAULT_PROFILE_NAME.to_string(),
            recent_profiles: vec![DEFAULT_PROFILE_NAME.to_string()],
            extra: Map::new(),
        }
    }
}

impl Session {
    /// Record `name` as the active profile, most recent first
    pub fn mark_active(&mut self, name: &str) {
        self.last_active_profile = name.to_string();
        self.recent_profiles.retain(|p| p != name);
        self.recent_profiles.insert(0, name.to_string());
        self.recent_profiles.truncate(MAX_RECENT_PROFILES);
    }

    /// Drop a deleted profile from the history
    pub fn forget(&mut self, name: &str) {
        self.recent_profiles.retain(|p| p != name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn recent_profiles_are_most_recent_first_and_bounded() {
        let mut session = Session::default();
        for name in ["a", "b", "c", "d", "e", "f"] {
            session.mark_active(name);
        }
        session.mark_active("c");
        assert_eq!(session.last_active_profile, "c");
        assert_eq!(session.recent_profiles, ["c", "f", "e", "d", "b"]);

        session.forget("e");
        assert_eq!(session.recent_profiles, ["c", "f", "d", "b"]);
    }

    #[test]
    fn unknown_fields_survive_a_round_trip() {
        let raw = json!({
            "last_active_profile": "raid",
            "recent_profiles": ["raid"],
            "window_state": {"position": {"x": 100, "y": 100}}
        });
        let session: Session = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(session.last_active_profile, "raid");
        assert_eq!(serde_json::to_value(&session).unwrap(), raw);
    }

    #[test]
    fn empty_document_is_the_default_profile() {
        let session: Session = serde_json::from_str("{}").unwrap();
        assert_eq!(session.last_active_profile, DEFAULT_PROFILE_NAME);
        assert!(session.recent_profiles.is_empty());
    }
}
