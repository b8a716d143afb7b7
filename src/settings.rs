//! Persisted application settings.
//!
//! Process-wide state that survives restarts: theme choice, the auto-save
//! flag, the recent-project list, and the last-opened path. The backing file
//! lives in the per-user application-data directory and is written
//! immediately after every mutation.
//!
//! Settings are deliberately forgiving: a corrupt or missing file degrades to
//! defaults, and a failed write is logged and otherwise ignored. Nothing in
//! process startup may fail because of settings.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum number of entries kept in the recent-files list.
pub const MAX_RECENT: usize = 10;

/// Shared handle to the settings store, passed to collaborators at
/// composition time.
pub type SettingsHandle = Arc<Mutex<SettingsStore>>;

/// The persisted settings document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub theme: String,
    pub auto_save_enabled: bool,
    /// Most-recent first, deduplicated, at most [`MAX_RECENT`] entries.
    pub recent_files: Vec<PathBuf>,
    pub last_opened: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            theme: "Default".to_string(),
            auto_save_enabled: false,
            recent_files: Vec::new(),
            last_opened: None,
        }
    }
}

/// Loads, mutates, and persists [`AppSettings`].
#[derive(Debug)]
pub struct SettingsStore {
    settings: AppSettings,
    path: PathBuf,
}

impl SettingsStore {
    /// Load settings from the per-user application-data location, falling
    /// back to defaults (and an in-tree relative path) when the platform
    /// directory cannot be determined.
    pub fn load_default() -> Self {
        let path = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("panelforge")
            .join("settings.json");
        Self::load_from(path)
    }

    /// Load settings from an explicit path. Any failure degrades to defaults.
    pub fn load_from(path: PathBuf) -> Self {
        let settings = match std::fs::read_to_string(&path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "settings file unreadable, using defaults");
                    AppSettings::default()
                }
            },
            Err(_) => AppSettings::default(),
        };
        Self { settings, path }
    }

    /// Wrap the store in the shared handle collaborators receive.
    pub fn into_handle(self) -> SettingsHandle {
        Arc::new(Mutex::new(self))
    }

    /// Read access to the current settings.
    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Persist the current settings, creating the parent directory if
    /// needed. Failures are logged and swallowed.
    pub fn save(&self) {
        if let Some(dir) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(dir) {
                tracing::warn!(dir = %dir.display(), %err, "could not create settings directory");
                return;
            }
        }
        match serde_json::to_string_pretty(&self.settings) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), %err, "could not write settings");
                }
            }
            Err(err) => tracing::warn!(%err, "could not serialize settings"),
        }
    }

    /// Change the theme and persist immediately.
    pub fn set_theme(&mut self, theme: impl Into<String>) {
        self.settings.theme = theme.into();
        self.save();
    }

    /// Toggle auto-save and persist immediately.
    pub fn set_auto_save(&mut self, enabled: bool) {
        self.settings.auto_save_enabled = enabled;
        self.save();
    }

    /// Record `path` as the most recently used project file: move-to-front,
    /// dedup, cap at [`MAX_RECENT`], update last-opened, persist.
    pub fn push_recent(&mut self, path: &Path) {
        let path = path.to_path_buf();
        self.settings.recent_files.retain(|p| p != &path);
        self.settings.recent_files.insert(0, path.clone());
        self.settings.recent_files.truncate(MAX_RECENT);
        self.settings.last_opened = Some(path);
        self.save();
    }

    /// The recent-files list filtered to entries whose file still exists.
    /// Stale entries are dropped and the drop is persisted as a side effect
    /// of this read.
    pub fn recent_files(&mut self) -> Vec<PathBuf> {
        let before = self.settings.recent_files.len();
        self.settings.recent_files.retain(|p| p.exists());
        if self.settings.recent_files.len() != before {
            self.save();
        }
        self.settings.recent_files.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &Path) -> SettingsStore {
        SettingsStore::load_from(dir.join("settings.json"))
    }

    #[test]
    fn missing_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.settings().theme, "Default");
        assert!(!store.settings().auto_save_enabled);
        assert!(store.settings().recent_files.is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        let store = SettingsStore::load_from(path);
        assert_eq!(store.settings(), &AppSettings::default());
    }

    #[test]
    fn settings_round_trip_through_save() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::load_from(path.clone());
        store.set_theme("Dark");
        store.set_auto_save(true);

        let reloaded = SettingsStore::load_from(path);
        assert_eq!(reloaded.settings().theme, "Dark");
        assert!(reloaded.settings().auto_save_enabled);
    }

    #[test]
    fn push_recent_moves_existing_entry_to_front() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        let a = dir.path().join("a.panelcfg");
        let b = dir.path().join("b.panelcfg");
        std::fs::write(&a, "{}").unwrap();
        std::fs::write(&b, "{}").unwrap();

        store.push_recent(&a);
        store.push_recent(&b);
        store.push_recent(&a);

        assert_eq!(store.settings().recent_files, vec![a.clone(), b]);
        assert_eq!(store.settings().last_opened, Some(a));
    }

    #[test]
    fn recent_list_never_exceeds_cap() {
        let dir = tempdir().unwrap();
        let mut store = store_in(dir.path());
        for i in 0..15 {
            store.push_recent(&dir.path().join(format!("p{i}.panelcfg")));
        }
        assert_eq!(store.settings().recent_files.len(), MAX_RECENT);
        // Most recent first.
        assert_eq!(
            store.settings().recent_files[0],
            dir.path().join("p14.panelcfg")
        );
    }

    #[test]
    fn recent_files_prunes_deleted_entries_and_persists_the_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = SettingsStore::load_from(path.clone());

        let kept = dir.path().join("kept.panelcfg");
        let gone = dir.path().join("gone.panelcfg");
        std::fs::write(&kept, "{}").unwrap();
        std::fs::write(&gone, "{}").unwrap();
        store.push_recent(&kept);
        store.push_recent(&gone);
        std::fs::remove_file(&gone).unwrap();

        assert_eq!(store.recent_files(), vec![kept.clone()]);

        // The prune is visible to a fresh load.
        let mut reloaded = SettingsStore::load_from(path);
        assert_eq!(reloaded.recent_files(), vec![kept]);
    }
}
