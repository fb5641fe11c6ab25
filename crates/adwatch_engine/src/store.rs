use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use adwatch_core::{
    update, Command, CommandError, Effect, KnownIds, Settings, SettingsUpdate, WatchState,
    WatchView,
};
use engine_logging::{engine_debug, engine_error, engine_info, engine_warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::persist::{set_aside, write_atomically, PersistError};

pub const DEFAULT_STATE_FILE: &str = "config.json";
const CORRUPT_SUFFIX: &str = "corrupt";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error("change applied but not saved: {0}")]
    Persist(#[from] PersistError),
}

/// On-disk record. Each field defaults on its own when it is missing, null,
/// or of the wrong type; unknown keys are ignored. Inside the lists only the
/// offending elements are dropped.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StateFile {
    #[serde(default, deserialize_with = "lenient_urls", skip_serializing_if = "Option::is_none")]
    urls: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    refresh_seconds: Option<u64>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    ntfy_enabled: Option<bool>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    ntfy_topic: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_known_ids",
        skip_serializing_if = "Option::is_none"
    )]
    known_ids: Option<BTreeMap<String, Vec<String>>>,
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_urls<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Array(items) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let total = items.len();
    let urls: Vec<String> = items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(url) => Some(url),
            _ => None,
        })
        .collect();
    if urls.len() < total {
        engine_warn!("Ignored {} non-text entries in stored urls", total - urls.len());
    }
    Ok(Some(urls))
}

fn lenient_known_ids<'de, D>(
    deserializer: D,
) -> Result<Option<BTreeMap<String, Vec<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Value::Object(map) = Value::deserialize(deserializer)? else {
        return Ok(None);
    };
    let known = map
        .into_iter()
        .filter_map(|(url, ids)| match ids {
            Value::Array(ids) => Some((url, ids.into_iter().filter_map(id_text).collect())),
            _ => None,
        })
        .collect();
    Ok(Some(known))
}

// Ad IDs are digit runs, so a bare number is the same ID written without quotes.
fn id_text(value: Value) -> Option<String> {
    match value {
        Value::String(id) => Some(id),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

impl StateFile {
    fn from_state(state: &WatchState) -> Self {
        let settings = state.settings();
        Self {
            urls: Some(state.targets().to_vec()),
            refresh_seconds: Some(settings.refresh_seconds),
            ntfy_enabled: Some(settings.notifications_enabled),
            ntfy_topic: Some(settings.channel.clone()),
            // KnownIds is a set, so every list is written deduplicated.
            known_ids: Some(
                state
                    .tracked()
                    .map(|(url, ids)| (url.to_string(), ids.iter().cloned().collect()))
                    .collect(),
            ),
        }
    }

    fn into_state(self) -> WatchState {
        let defaults = Settings::default();
        let settings = Settings {
            refresh_seconds: self.refresh_seconds.unwrap_or(defaults.refresh_seconds),
            notifications_enabled: self.ntfy_enabled.unwrap_or(defaults.notifications_enabled),
            channel: self.ntfy_topic.unwrap_or(defaults.channel),
        };
        WatchState::from_parts(
            self.urls.unwrap_or_default(),
            self.known_ids.unwrap_or_default(),
            settings,
        )
    }
}

/// Durable, lock-guarded home of the shared [`WatchState`].
///
/// Every mutation holds the lock for its whole read-modify-write span,
/// including the write to disk.
#[derive(Debug)]
pub struct StateStore {
    path: PathBuf,
    state: Mutex<WatchState>,
}

impl StateStore {
    /// Read the state file at `path`, falling back to defaults when it is
    /// absent or unreadable. Never fails.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = read_state(&path);
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<(), PersistError> {
        let state = self.lock();
        self.write(&state)
    }

    /// Apply a control command and persist the result when it asks for it.
    pub fn dispatch(&self, command: Command) -> Result<Vec<Effect>, StoreError> {
        let mut state = self.lock();
        let effects = update(&mut state, command)?;
        if effects.contains(&Effect::Persist) {
            self.write(&state)?;
        }
        Ok(effects)
    }

    pub fn add_target(&self, url: &str) -> Result<(), StoreError> {
        self.dispatch(Command::AddTarget(url.to_string()))?;
        Ok(())
    }

    /// Remove the target at a zero-based position.
    pub fn remove_target(&self, index: usize) -> Result<(), StoreError> {
        self.dispatch(Command::RemoveTarget(index))?;
        Ok(())
    }

    /// Flip notifications on or off and return the new value.
    pub fn toggle_notifications(&self) -> Result<bool, StoreError> {
        let mut state = self.lock();
        update(&mut state, Command::ToggleNotifications)?;
        self.write(&state)?;
        Ok(state.settings().notifications_enabled)
    }

    pub fn update_settings(&self, change: SettingsUpdate) -> Result<(), StoreError> {
        self.dispatch(Command::UpdateSettings(change))?;
        Ok(())
    }

    /// Fold a scan's refreshed known-ID set into the stored one and persist
    /// if it grew. Returns whether anything was written.
    pub fn record_scan(&self, url: &str, ids: &KnownIds) -> Result<bool, PersistError> {
        let mut state = self.lock();
        if !state.merge_known_ids(url, ids) {
            return Ok(false);
        }
        self.write(&state)?;
        Ok(true)
    }

    pub fn snapshot(&self) -> WatchState {
        self.lock().clone()
    }

    pub fn view(&self) -> WatchView {
        self.lock().view()
    }

    pub fn targets(&self) -> Vec<String> {
        self.lock().targets().to_vec()
    }

    pub fn known_ids(&self, url: &str) -> Option<KnownIds> {
        self.lock().known_ids(url).cloned()
    }

    pub fn settings(&self) -> Settings {
        self.lock().settings().clone()
    }

    // The state is plain data and stays valid if a holder panicked.
    fn lock(&self) -> MutexGuard<'_, WatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self, state: &WatchState) -> Result<(), PersistError> {
        let content = serde_json::to_string_pretty(&StateFile::from_state(state))?;
        write_atomically(&self.path, &content).inspect_err(|err| {
            engine_error!("Failed to write state to {:?}: {}", self.path, err);
        })?;
        engine_debug!("Saved state to {:?}", self.path);
        Ok(())
    }
}

fn read_state(path: &Path) -> WatchState {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            engine_info!("No state file at {:?}; starting with defaults", path);
            return WatchState::new();
        }
        Err(err) => {
            engine_warn!("Failed to read state from {:?}: {}; using defaults", path, err);
            set_aside_unreadable(path);
            return WatchState::new();
        }
    };

    let parsed = String::from_utf8(bytes)
        .map_err(|err| err.to_string())
        .and_then(|text| serde_json::from_str::<StateFile>(&text).map_err(|err| err.to_string()));
    match parsed {
        Ok(file) => {
            let state = file.into_state();
            engine_info!(
                "Loaded {} tracked urls from {:?}",
                state.targets().len(),
                path
            );
            state
        }
        Err(err) => {
            engine_warn!("State file {:?} is not valid: {}; using defaults", path, err);
            set_aside_unreadable(path);
            WatchState::new()
        }
    }
}

// Keeps the old file around so the first save cannot overwrite it.
fn set_aside_unreadable(path: &Path) {
    match set_aside(path, CORRUPT_SUFFIX) {
        Ok(moved) => engine_warn!("Moved unreadable state file to {:?}", moved),
        Err(err) => engine_error!("Could not move unreadable state file aside: {}", err),
    }
}
