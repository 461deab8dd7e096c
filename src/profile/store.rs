//! Directory-backed profile storage, one JSON file per profile
//!
//! The session document lives one level up, beside the profiles directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use super::{session::SESSION_FILE, Profile, Session, DEFAULT_PROFILE_NAME};
use crate::{
    error::ProfileError,
    utils::validators::{sanitize_filename, validate_profile_name},
};

#[derive(Debug, Clone)]
pub struct ProfileStore {
    dir: PathBuf,
    session_path: PathBuf,
}

impl ProfileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ProfileError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| ProfileError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let session_path = dir
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(SESSION_FILE);
        Ok(Self { dir, session_path })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn session_path(&self) -> &Path {
        &self.session_path
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ProfileError> {
        validate_profile_name(name).map_err(|reason| ProfileError::InvalidName {
            name: name.to_string(),
            reason,
        })?;
        Ok(self.dir.join(format!("{}.json", name)))
    }

    /// Load a profile by name; `None` if it does not exist
    pub fn load(&self, name: &str) -> Result<Option<Profile>, ProfileError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path).map_err(|source| ProfileError::ReadFile {
            path: path.clone(),
            source,
        })?;
        let profile = serde_json::from_str(&raw)
            .map_err(|source| ProfileError::ParseJson { path: path.clone(), source })?;

        debug!("Loaded profile '{}' from {}", name, path.display());
        Ok(Some(profile))
    }

    /// Write a profile under `name`, replacing any previous file
    pub fn save(&self, name: &str, profile: &Profile) -> Result<(), ProfileError> {
        let path = self.path_for(name)?;

        let mut profile = profile.clone();
        profile.profile_name = name.to_string();
        let json = serde_json::to_string_pretty(&profile).map_err(|source| {
            ProfileError::EncodeJson {
                name: name.to_string(),
                source,
            }
        })?;
        write_atomically(&path, json)?;

        info!("Saved profile '{}' ({} timers)", name, profile.timers.len());
        Ok(())
    }

    pub fn exists(&self, name: &str) -> Result<bool, ProfileError> {
        Ok(self.path_for(name)?.exists())
    }

    /// Name an imported document is stored under
    pub fn import_name(profile: &Profile, name: Option<&str>) -> String {
        match name {
            Some(name) => name.to_string(),
            None => sanitize_filename(&profile.profile_name),
        }
    }

    /// Store an imported profile document. Without an explicit name the
    /// document's own name is used, made safe for the filesystem. Returns
    /// the name it was stored under.
    pub fn import(
        &self,
        profile: &Profile,
        name: Option<&str>,
        overwrite: bool,
    ) -> Result<String, ProfileError> {
        let name = Self::import_name(profile, name);
        if !overwrite && self.exists(&name)? {
            return Err(ProfileError::AlreadyExists { name });
        }
        self.save(&name, profile)?;
        info!("Imported profile '{}'", name);
        Ok(name)
    }

    /// Delete a profile; returns whether it existed
    pub fn delete(&self, name: &str) -> Result<bool, ProfileError> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).map_err(|source| ProfileError::RemoveFile { path, source })?;
        Ok(true)
    }

    /// Names of all stored profiles, sorted
    pub fn list(&self) -> Result<Vec<String>, ProfileError> {
        let entries = fs::read_dir(&self.dir).map_err(|source| ProfileError::ReadDir {
            path: self.dir.clone(),
            source,
        })?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Load a profile, creating and saving an empty one if it is missing
    pub fn load_or_create(&self, name: &str) -> Result<Profile, ProfileError> {
        if let Some(profile) = self.load(name)? {
            return Ok(profile);
        }
        info!("Profile '{}' not found, creating it", name);
        let profile = Profile::named(name);
        self.save(name, &profile)?;
        Ok(profile)
    }

    /// Pick the profile to start with. An explicitly requested profile is
    /// created when missing; otherwise the last active one is used, falling
    /// back to the default profile if it has gone away.
    pub fn open_active(&self, requested: Option<&str>) -> Result<Profile, ProfileError> {
        if let Some(name) = requested {
            return self.load_or_create(name);
        }

        let last = self.load_session().last_active_profile;
        match self.load(&last) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => {
                info!("Last active profile '{}' is gone, using default", last);
                self.load_or_create(DEFAULT_PROFILE_NAME)
            }
            Err(e) => {
                warn!("Cannot open last active profile '{}': {}", last, e);
                self.load_or_create(DEFAULT_PROFILE_NAME)
            }
        }
    }

    /// Read the session document. A missing or unreadable file yields the
    /// default session.
    pub fn load_session(&self) -> Session {
        let path = &self.session_path;
        if !path.exists() {
            return Session::default();
        }

        let parsed = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Session>(&raw).map_err(|e| e.to_string()));
        match parsed {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring unreadable session file {}: {}", path.display(), e);
                Session::default()
            }
        }
    }

    pub fn save_session(&self, session: &Session) -> Result<(), ProfileError> {
        let json = serde_json::to_string_pretty(session).map_err(|source| {
            ProfileError::EncodeJson {
                name: SESSION_FILE.to_string(),
                source,
            }
        })?;
        write_atomically(&self.session_path, json)?;
        debug!("Saved session, last active '{}'", session.last_active_profile);
        Ok(())
    }
}

/// Write beside the target then rename, so a crash never leaves half a file
fn write_atomically(path: &Path, contents: String) -> Result<(), ProfileError> {
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, contents).map_err(|source| ProfileError::WriteFile {
        path: tmp.clone(),
        source,
    })?;
    fs::rename(&tmp, path).map_err(|source| ProfileError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}
