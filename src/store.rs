//! Configuration store: ownership, persistence, and change notification.
//!
//! The store is the single owner of the in-memory [`ProjectConfiguration`].
//! Collaborators read snapshots through [`ConfigurationStore::config`] and
//! mutate exclusively through the edit API here; there is no second mutable
//! reference anywhere in the process.
//!
//! Change notification uses a typed broadcast channel of [`ProjectEvent`]
//! values rather than registered callbacks, so emission is decoupled from any
//! particular UI dispatch mechanism. Events are sent synchronously from
//! within each operation; absent or lagging subscribers never block or fail
//! an edit.
//!
//! Mutation does not validate. The edit API allows a pin collision to exist
//! transiently in memory; the invariant is enforced at load time and on
//! explicit `validation::validate` calls. Interactive layers are expected to
//! reject collisions before committing an edit.

use crate::error::{AppResult, PanelError};
use crate::model::{
    DisplayConfiguration, InputConfiguration, InputId, OutputMapping, ProjectConfiguration,
};
use crate::settings::SettingsHandle;
use crate::validation;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Dedicated extension for project files.
pub const FILE_EXTENSION: &str = "panelcfg";

/// Capacity of the event channel. Slow subscribers past this many pending
/// events observe a lag error and resubscribe; they never block the store.
const EVENT_CAPACITY: usize = 32;

/// Notifications emitted by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectEvent {
    /// The in-memory configuration changed (any mutation, new, or load).
    Changed,
    /// The configuration reached disk.
    Saved,
    /// A file replaced the in-memory configuration.
    Loaded,
}

/// Owns the current project, its file association, and the dirty flag.
pub struct ConfigurationStore {
    config: ProjectConfiguration,
    path: Option<PathBuf>,
    /// Shared with detached auto-save tasks, which clear it on success.
    dirty: Arc<AtomicBool>,
    events: broadcast::Sender<ProjectEvent>,
    settings: SettingsHandle,
}

impl ConfigurationStore {
    /// A store holding a fresh default project with no file association.
    pub fn new(settings: SettingsHandle) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            config: ProjectConfiguration::default(),
            path: None,
            dirty: Arc::new(AtomicBool::new(false)),
            events,
            settings,
        }
    }

    /// Subscribe to store notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ProjectEvent> {
        self.events.subscribe()
    }

    /// The current configuration snapshot.
    pub fn config(&self) -> &ProjectConfiguration {
        &self.config
    }

    /// The associated file path, if the project has ever been saved/loaded.
    pub fn current_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// True if the project has unsaved mutations.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// True if no path has ever been associated with this project.
    pub fn is_new(&self) -> bool {
        self.path.is_none()
    }

    /// Reset to a fresh default project with no file association.
    pub fn new_project(&mut self) {
        self.config = ProjectConfiguration::default();
        self.path = None;
        self.dirty.store(false, Ordering::SeqCst);
        self.emit(ProjectEvent::Changed);
    }

    /// Replace the current project with the contents of `path`.
    ///
    /// The file must exist, deserialize into a project, and pass structural
    /// validation; otherwise the in-memory project is left untouched.
    pub fn load(&mut self, path: &Path) -> AppResult<()> {
        if !path.exists() {
            return Err(PanelError::NotFound(path.display().to_string()));
        }
        let json = std::fs::read_to_string(path)?;
        let config: ProjectConfiguration =
            serde_json::from_str(&json).map_err(|err| PanelError::Parse(err.to_string()))?;
        validation::validate(&config)?;

        self.config = config;
        self.path = Some(path.to_path_buf());
        self.dirty.store(false, Ordering::SeqCst);
        self.settings.lock().push_recent(path);
        tracing::info!(path = %path.display(), "project loaded");
        self.emit(ProjectEvent::Loaded);
        self.emit(ProjectEvent::Changed);
        Ok(())
    }

    /// Write the current project to `path`, or to the associated path when
    /// `path` is `None`. Stamps the modification time before serializing.
    pub fn save(&mut self, path: Option<&Path>) -> AppResult<()> {
        let target = match path.or(self.path.as_deref()) {
            Some(p) => p.to_path_buf(),
            None => return Err(PanelError::NoPath),
        };

        self.config.modified_at = Utc::now();
        let json = serde_json::to_string_pretty(&self.config)
            .map_err(|err| PanelError::Parse(err.to_string()))?;
        std::fs::write(&target, json)?;

        self.path = Some(target.clone());
        self.dirty.store(false, Ordering::SeqCst);
        self.settings.lock().push_recent(&target);
        tracing::info!(path = %target.display(), "project saved");
        self.emit(ProjectEvent::Saved);
        Ok(())
    }

    /// Record that the project changed: set the dirty flag, stamp the
    /// modification time, notify subscribers, and kick off a detached
    /// auto-save when enabled and a path is associated.
    pub fn mark_modified(&mut self) {
        self.dirty.store(true, Ordering::SeqCst);
        self.config.modified_at = Utc::now();
        self.emit(ProjectEvent::Changed);

        let auto_save = self.settings.lock().settings().auto_save_enabled;
        if auto_save {
            if let Some(path) = self.path.clone() {
                self.spawn_auto_save(path);
            }
        }
    }

    /// Best-effort background save. The triggering mutation has already
    /// succeeded, so failures here are logged and swallowed; success clears
    /// the dirty flag and emits `Saved`.
    fn spawn_auto_save(&self, path: PathBuf) {
        let json = match serde_json::to_string_pretty(&self.config) {
            Ok(json) => json,
            Err(err) => {
                tracing::warn!(%err, "auto-save skipped: serialization failed");
                return;
            }
        };
        let dirty = Arc::clone(&self.dirty);
        let events = self.events.clone();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("auto-save skipped: no async runtime");
            return;
        };
        runtime.spawn_blocking(move || match std::fs::write(&path, json) {
            Ok(()) => {
                dirty.store(false, Ordering::SeqCst);
                let _ = events.send(ProjectEvent::Saved);
                tracing::debug!(path = %path.display(), "auto-saved");
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "auto-save failed");
            }
        });
    }

    /// Recent project files that still exist on disk, most recent first.
    pub fn recent_files(&self) -> Vec<PathBuf> {
        self.settings.lock().recent_files()
    }

    /// Rename the project.
    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.config.name = name.into();
        self.mark_modified();
    }

    // ------------------------------------------------------------------
    // Input management
    // ------------------------------------------------------------------

    /// Append an input to the project.
    pub fn add_input(&mut self, input: InputConfiguration) {
        self.config.inputs.push(input);
        self.mark_modified();
    }

    /// Replace the input with the same id. Returns false (and leaves the
    /// project untouched) when no such input exists.
    pub fn update_input(&mut self, input: InputConfiguration) -> bool {
        match self.config.inputs.iter_mut().find(|i| i.id == input.id) {
            Some(slot) => {
                *slot = input;
                self.mark_modified();
                true
            }
            None => false,
        }
    }

    /// Remove an input by id, cascading to any output mapping keyed on it.
    pub fn remove_input(&mut self, id: InputId) {
        self.config.inputs.retain(|i| i.id != id);
        self.config.output_mappings.retain(|m| m.input_id != id);
        self.mark_modified();
    }

    // ------------------------------------------------------------------
    // Display management
    // ------------------------------------------------------------------

    /// Append a display module to the project.
    pub fn add_display(&mut self, display: DisplayConfiguration) {
        self.config.displays.push(display);
        self.mark_modified();
    }

    /// Replace the display with the same id. Returns false when absent.
    pub fn update_display(&mut self, display: DisplayConfiguration) -> bool {
        match self.config.displays.iter_mut().find(|d| d.id == display.id) {
            Some(slot) => {
                *slot = display;
                self.mark_modified();
                true
            }
            None => false,
        }
    }

    /// Remove a display by id.
    pub fn remove_display(&mut self, id: Uuid) {
        self.config.displays.retain(|d| d.id != id);
        self.mark_modified();
    }

    // ------------------------------------------------------------------
    // Output mapping management
    // ------------------------------------------------------------------

    /// Insert or replace the mapping for the mapping's input id. At most one
    /// mapping exists per input.
    pub fn set_output_mapping(&mut self, mapping: OutputMapping) {
        match self
            .config
            .output_mappings
            .iter_mut()
            .find(|m| m.input_id == mapping.input_id)
        {
            Some(slot) => *slot = mapping,
            None => self.config.output_mappings.push(mapping),
        }
        self.mark_modified();
    }

    /// Remove the mapping keyed on `input_id`, if any.
    pub fn remove_output_mapping(&mut self, input_id: InputId) {
        self.config
            .output_mappings
            .retain(|m| m.input_id != input_id);
        self.mark_modified();
    }

    fn emit(&self, event: ProjectEvent) {
        // Send fails only when no subscriber exists, which is fine.
        let _ = self.events.send(event);
    }
}
