use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock};

/// Persisted key set. Field names are the on-disk contract; unknown or
/// missing keys fall back to their defaults on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    last_date: String,
    last_url: String,
    last_title: String,
    first_launch: bool,
    language: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            last_date: String::new(),
            last_url: String::new(),
            last_title: String::new(),
            first_launch: true,
            language: String::new(),
        }
    }
}

/// Small persistent key/value store for UX continuity: the last searched
/// date, the last viewed entry, the first-launch flag, and the language
/// preference. Writes persist immediately, last-write-wins.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn last_searched_date(&self) -> String {
        self.data.read().unwrap().last_date.clone()
    }

    pub fn set_last_searched_date(&self, date: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.last_date = date.to_string();
        self.persist(&guard)
    }

    /// Last viewed entry as a `(url, title)` pair.
    pub fn last_viewed(&self) -> (String, String) {
        let guard = self.data.read().unwrap();
        (guard.last_url.clone(), guard.last_title.clone())
    }

    pub fn set_last_viewed(&self, url: &str, title: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.last_url = url.to_string();
        guard.last_title = title.to_string();
        self.persist(&guard)
    }

    pub fn is_first_launch(&self) -> bool {
        self.data.read().unwrap().first_launch
    }

    pub fn set_first_launch_complete(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.first_launch = false;
        self.persist(&guard)
    }

    pub fn language(&self) -> String {
        self.data.read().unwrap().language.clone()
    }

    pub fn set_language(&self, code: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        guard.language = code.to_string();
        self.persist(&guard)
    }

    /// Reset every key to its default.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.data.write().unwrap();
        *guard = UserSettings::default();
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
