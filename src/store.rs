//! Durable configuration storage
//!
//! Handles saving and loading the application configuration (font size,
//! current session pointer and all saved sessions) as one JSON record in a
//! key-value slot. The slot normally lives as a file in the application
//! config directory.

use crate::fields::FieldSnapshot;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, error, info, warn};

/// Storage key for the configuration record
pub(crate) const CONFIG_KEY: &str = "medicalAppConfig";

/// Session name meaning "no named session is active"
pub(crate) const DEFAULT_SESSION: &str = "default";

/// Font size preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FontSize {
    Small,
    #[default]
    Normal,
    Large,
}

impl fmt::Display for FontSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontSize::Small => write!(f, "small"),
            FontSize::Normal => write!(f, "normal"),
            FontSize::Large => write!(f, "large"),
        }
    }
}

impl FromStr for FontSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "small" => Ok(FontSize::Small),
            "normal" => Ok(FontSize::Normal),
            "large" => Ok(FontSize::Large),
            other => Err(format!("Unknown font size: {}", other)),
        }
    }
}

/// Snapshot of the note fields saved under one session name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct SessionRecord {
    /// Field identifier to section text
    #[serde(default)]
    pub data: FieldSnapshot,
    /// Time of the last save, in milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

/// The persisted application configuration
///
/// Property names follow the browser localStorage layout. Missing
/// properties fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Configuration {
    #[serde(rename = "fontSize")]
    pub font_size: FontSize,
    #[serde(rename = "currentSession")]
    pub current_session: String,
    pub sessions: BTreeMap<String, SessionRecord>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            font_size: FontSize::default(),
            current_session: DEFAULT_SESSION.to_string(),
            sessions: BTreeMap::new(),
        }
    }
}

/// A single-value-per-key persistence medium
pub(crate) trait Storage {
    /// Read the value stored under `key`, if any
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Storage backed by one JSON file per key inside a directory
#[derive(Debug, Clone)]
pub(crate) struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default storage directory in the platform config dir
    pub(crate) fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("MedScribe"))
    }

    pub(crate) fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StoreError::Read { path, source: e })
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).map_err(|e| StoreError::CreateDirectory {
                path: self.dir.clone(),
                source: e,
            })?;
            info!("Created storage directory: {:?}", self.dir);
        }

        // Write beside the target, then rename over it
        let path = self.path_for(key);
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, value).map_err(|e| StoreError::Write {
            path: staging.clone(),
            source: e,
        })?;
        fs::rename(&staging, &path).map_err(|e| StoreError::Write {
            path: path.clone(),
            source: e,
        })?;

        Ok(())
    }
}

/// In-memory storage; clones share the same slots
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryStorage {
    slots: std::sync::Arc<std::sync::Mutex<std::collections::HashMap<String, String>>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub(crate) fn with_value(key: &str, value: &str) -> Self {
        let storage = Self::default();
        storage
            .slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        storage
    }

    pub(crate) fn get(&self, key: &str) -> Option<String> {
        self.slots.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.slots
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Loads and saves the configuration record
pub(crate) struct ConfigStore {
    storage: Box<dyn Storage>,
    /// Set when a stored value exists but could not be read
    read_failed: bool,
}

impl ConfigStore {
    pub(crate) fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
            read_failed: false,
        }
    }

    /// Load the configuration
    ///
    /// Returns the default configuration if nothing was stored yet or the
    /// stored value is not a JSON object. Stored properties are merged over
    /// the defaults one by one. If the slot can't be read at all, later saves
    /// are refused so the stored value stays intact.
    pub(crate) fn load(&mut self) -> Configuration {
        let contents = match self.storage.read(CONFIG_KEY) {
            Ok(Some(contents)) => contents,
            Ok(None) => {
                info!("No stored configuration, using defaults");
                return Configuration::default();
            }
            Err(e) => {
                error!("Failed to read configuration, saving is disabled: {}", e);
                self.read_failed = true;
                return Configuration::default();
            }
        };

        let stored = match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(stored)) => stored,
            Ok(_) => {
                error!("Stored configuration is not a JSON object, using defaults");
                return Configuration::default();
            }
            Err(e) => {
                error!("Failed to parse stored configuration, using defaults: {}", e);
                return Configuration::default();
            }
        };

        let config = merge_over_defaults(stored);
        info!(
            sessions = config.sessions.len(),
            current_session = %config.current_session,
            "Loaded configuration"
        );
        config
    }

    /// Serialize and store the full configuration, replacing the old value
    pub(crate) fn save(&mut self, config: &Configuration) -> Result<(), StoreError> {
        if self.read_failed {
            return Err(StoreError::Unreadable);
        }
        let json = serde_json::to_string_pretty(config)?;
        self.storage.write(CONFIG_KEY, &json)
    }
}

/// Merge stored top-level properties over the defaults
///
/// A property that fails to decode keeps its default; a malformed session
/// record is dropped on its own.
fn merge_over_defaults(stored: Map<String, Value>) -> Configuration {
    let mut config = Configuration::default();

    for (key, value) in stored {
        match key.as_str() {
            "fontSize" => match serde_json::from_value::<FontSize>(value) {
                Ok(size) => config.font_size = size,
                Err(e) => warn!("Ignoring stored fontSize: {}", e),
            },
            "currentSession" => match value {
                Value::String(name) => config.current_session = name,
                other => warn!("Ignoring stored currentSession: {}", other),
            },
            "sessions" => match value {
                Value::Object(sessions) => {
                    for (name, record) in sessions {
                        match serde_json::from_value::<SessionRecord>(record) {
                            Ok(record) => {
                                config.sessions.insert(name, record);
                            }
                            Err(e) => warn!(session = %name, "Skipping malformed session: {}", e),
                        }
                    }
                }
                other => warn!("Ignoring stored sessions of type {}", json_type(&other)),
            },
            other => debug!("Ignoring unknown property {:?}", other),
        }
    }

    config
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Storage errors with contextual information
#[derive(Debug, thiserror::Error)]
pub(crate) enum StoreError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored configuration could not be read; not overwriting it")]
    Unreadable,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
