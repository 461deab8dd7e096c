//! Shared state of the HTTP control surface

use std::{
    sync::{Arc, Mutex},
    time::Instant,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    error::ProfileError,
    profile::{Profile, ProfileStore, Session, DEFAULT_PROFILE_NAME},
    scheduler::Scheduler,
};

/// The most recent timer completion seen by the observer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedTimer {
    pub id: String,
    pub label: String,
    pub completed_at: DateTime<Utc>,
}

/// Server-side state wrapped around the scheduler
#[derive(Debug)]
pub struct AppState {
    /// Live timers and the tick loop
    pub scheduler: Arc<Scheduler>,
    /// Profile persistence
    pub store: ProfileStore,
    /// Active profile; its timer list is refreshed on save
    pub profile: Mutex<Profile>,
    /// Last active profile and recent history
    pub session: Mutex<Session>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    pub last_action: Mutex<Option<String>>,
    pub last_action_time: Mutex<Option<DateTime<Utc>>>,
    /// Written by the scheduler's completion observer
    pub last_completed: Arc<Mutex<Option<CompletedTimer>>>,
}

impl AppState {
    /// Create the state and register the profile's timers with the scheduler
    pub fn new(
        scheduler: Arc<Scheduler>,
        store: ProfileStore,
        profile: Profile,
        host: String,
        port: u16,
    ) -> Self {
        let loaded = profile.apply_to(&scheduler);
        info!("Profile '{}' active with {} timers", profile.profile_name, loaded);

        let mut session = store.load_session();
        session.mark_active(&profile.profile_name);

        Self {
            scheduler,
            store,
            profile: Mutex::new(profile),
            session: Mutex::new(session),
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            last_action_time: Mutex::new(None),
            last_completed: Arc::new(Mutex::new(None)),
        }
    }

    /// Install the completion observer that feeds [`last_completed`](Self::last_completed)
    pub fn install_observers(&self) {
        let last_completed = Arc::clone(&self.last_completed);
        self.scheduler.set_on_complete(move |timer| {
            info!("Alert: timer '{}' finished", timer.label());
            match last_completed.lock() {
                Ok(mut slot) => {
                    *slot = Some(CompletedTimer {
                        id: timer.id().to_string(),
                        label: timer.label().to_string(),
                        completed_at: Utc::now(),
                    });
                }
                Err(e) => warn!("Failed to record completion: {}", e),
            }
        });
    }

    /// Remember the last control action for status reporting
    pub fn record_action(&self, action: &str) {
        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(action.to_string());
        }
        if let Ok(mut last_time) = self.last_action_time.lock() {
            *last_time = Some(Utc::now());
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        let last_action = self.last_action.lock().ok().and_then(|a| a.clone());
        let last_action_time = self.last_action_time.lock().ok().and_then(|t| *t);
        (last_action, last_action_time)
    }

    pub fn get_last_completed(&self) -> Option<CompletedTimer> {
        self.last_completed.lock().ok().and_then(|c| c.clone())
    }

    /// Name of the active profile
    pub fn profile_name(&self) -> String {
        self.profile
            .lock()
            .map(|p| p.profile_name.clone())
            .unwrap_or_else(|e| e.into_inner().profile_name.clone())
    }

    /// Capture the current timers into the active profile and write it out.
    /// Returns how many timers were saved.
    pub fn save_profile(&self) -> Result<usize, ProfileError> {
        let mut profile = self.profile.lock().unwrap_or_else(|e| e.into_inner());
        profile.capture(&self.scheduler);
        let name = profile.profile_name.clone();
        self.store.save(&name, &profile)?;
        Ok(profile.timers.len())
    }

    /// Save the active profile, then replace the scheduler's timers with
    /// those of `name`. Returns `None` if no such profile is stored.
    pub fn switch_profile(&self, name: &str) -> Result<Option<usize>, ProfileError> {
        let Some(mut next) = self.store.load(name)? else {
            return Ok(None);
        };
        next.profile_name = name.to_string();

        let mut profile = self.profile.lock().unwrap_or_else(|e| e.into_inner());
        if profile.profile_name != name {
            profile.capture(&self.scheduler);
            let current = profile.profile_name.clone();
            self.store.save(&current, &profile)?;
        }
        let loaded = next.apply_to(&self.scheduler);
        *profile = next;
        drop(profile);

        info!("Switched to profile '{}' with {} timers", name, loaded);
        self.update_session(|session| session.mark_active(name))?;
        Ok(Some(loaded))
    }

    /// Delete a stored profile. The default and the active profile are kept.
    /// Returns whether the profile existed.
    pub fn delete_profile(&self, name: &str) -> Result<bool, ProfileError> {
        if name == DEFAULT_PROFILE_NAME {
            return Err(ProfileError::Protected { name: name.to_string() });
        }
        if name == self.profile_name() {
            return Err(ProfileError::InUse { name: name.to_string() });
        }
        if !self.store.delete(name)? {
            return Ok(false);
        }

        info!("Deleted profile '{}'", name);
        self.update_session(|session| session.forget(name))?;
        Ok(true)
    }

    /// Store an imported profile; the active profile cannot be replaced.
    /// Returns the name it was stored under.
    pub fn import_profile(
        &self,
        profile: &Profile,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<String, ProfileError> {
        let target = ProfileStore::import_name(profile, name);
        if target == self.profile_name() {
            return Err(ProfileError::InUse { name: target });
        }
        self.store.import(profile, Some(&target), overwrite)
    }

    pub fn get_session(&self) -> Session {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Persist the session document
    pub fn save_session(&self) -> Result<(), ProfileError> {
        self.update_session(|_| {})
    }

    fn update_session(&self, change: impl FnOnce(&mut Session)) -> Result<(), ProfileError> {
        let mut session = self.session.lock().unwrap_or_else(|e| e.into_inner());
        change(&mut session);
        self.store.save_session(&session)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }
}
