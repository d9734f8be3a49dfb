use std::{
    fs,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::analysis::OverlayGeometry;

pub const DEFAULT_DATABASE_FILE: &str = "crowdmeter.sqlite3";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Display refresh period in milliseconds (about 60 Hz by default).
    pub refresh_interval_ms: u64,
    /// Detections slower than this are logged; the loop still waits for them.
    pub slow_detection_warn_ms: u64,
    pub verbose_frames: bool,
    pub overlay: OverlayGeometry,
    pub database_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            refresh_interval_ms: 16,
            slow_detection_warn_ms: 5_000,
            verbose_frames: false,
            overlay: OverlayGeometry::default(),
            database_path: None,
        }
    }
}

impl Settings {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILE))
    }
}

/// JSON-backed settings file. A missing or unreadable file yields defaults.
pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<Settings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring invalid settings file {}: {err}", path.display());
                Settings::default()
            })
        } else {
            Settings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> Settings {
        self.read().clone()
    }

    pub fn update(&self, settings: Settings) -> Result<()> {
        let mut guard = self.write();
        *guard = settings;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: Settings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn persist(&self, data: &Settings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, Settings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Settings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.get(), Settings::default());
        assert_eq!(store.get().database_path(), PathBuf::from(DEFAULT_DATABASE_FILE));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"refreshIntervalMs": 33, "overlay": {"panelWidth": 200}}"#).unwrap();

        let settings = SettingsStore::new(path).unwrap().get();
        assert_eq!(settings.refresh_interval_ms, 33);
        assert_eq!(settings.overlay.panel_width, 200.0);
        assert_eq!(settings.overlay.panel_height, 100.0);
        assert_eq!(settings.slow_detection_warn_ms, 5_000);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(SettingsStore::new(path).unwrap().get(), Settings::default());
    }

    #[test]
    fn update_persists_and_reload_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).unwrap();

        let mut settings = store.get();
        settings.slow_detection_warn_ms = 750;
        settings.database_path = Some(dir.path().join("custom.sqlite3"));
        store.update(settings.clone()).unwrap();

        let reopened = SettingsStore::new(path.clone()).unwrap();
        assert_eq!(reopened.get(), settings);

        fs::write(&path, r#"{"slowDetectionWarnMs": 10}"#).unwrap();
        store.reload().unwrap();
        assert_eq!(store.get().slow_detection_warn_ms, 10);
    }
}
