use crate::config::{Config, ConfigError};
use crate::models::User;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Logged-in credentials: the bearer token plus the minimal user profile.
/// Persisted as JSON next to the config file; created at login, removed at
/// logout. All authorization flows through this object rather than ambient
/// storage.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

impl Session {
    pub fn new(token: String, user: User) -> Self {
        Self { token, user }
    }

    /// Load the stored session, if any. A missing or unreadable file is
    /// simply "not logged in".
    pub fn load() -> Option<Self> {
        let path = Self::session_path().ok()?;
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::session_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Remove the stored session (logout).
    pub fn clear() {
        if let Ok(path) = Self::session_path() {
            let _ = std::fs::remove_file(path);
        }
    }

    fn session_path() -> Result<PathBuf, ConfigError> {
        Ok(Config::config_dir()?.join("session.json"))
    }
}
