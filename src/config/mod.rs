//! Persisted settings
//!
//! Settings live in a small camelCase JSON document next to other per-user
//! configuration (`<config_dir>/decomp-rename/config.json`). Requests never
//! read the file directly: they load an immutable [`Settings`] snapshot from
//! [`SharedSettings`], which is swapped as a whole on reload.

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

use crate::utils::atomic_write;

pub const DEFAULT_SERVER: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "codellama:7b";
pub const DEFAULT_TEMPERATURE: f64 = 0.3;
/// A local Ollama server works through requests one or two at a time
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 2;

const APP_DIR: &str = "decomp-rename";
const CONFIG_FILE: &str = "config.json";

/// Errors from reading or writing the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Unknown setting '{0}'")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

/// User settings for the Ollama connection and rename behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Base URL of the Ollama server
    pub ollama_server: String,
    /// Model tag passed to `/api/generate`
    pub model: String,
    /// Save the program model after every applied rename
    pub auto_save_changes: bool,
    /// Keep a `.bak` copy of the model file before the first save
    pub create_backup: bool,
    /// Sampling temperature for single-entity rename requests
    pub temperature: f64,
    /// Requests allowed on the wire at once; later ones wait their turn
    pub max_concurrent_requests: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ollama_server: DEFAULT_SERVER.to_string(),
            model: DEFAULT_MODEL.to_string(),
            auto_save_changes: false,
            create_backup: true,
            temperature: DEFAULT_TEMPERATURE,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
        }
    }
}

impl Settings {
    /// Apply one-off overrides (CLI flags / env vars) on top of the file values
    pub fn with_overrides(mut self, server: Option<String>, model: Option<String>) -> Self {
        if let Some(server) = server {
            self.ollama_server = server;
        }
        if let Some(model) = model {
            self.model = model;
        }
        self
    }

    /// Set one field by its persisted (camelCase) key
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "ollamaServer" => {
                url::Url::parse(value).map_err(|_| invalid())?;
                self.ollama_server = value.to_string();
            }
            "model" => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                self.model = value.trim().to_string();
            }
            "autoSaveChanges" => self.auto_save_changes = value.parse().map_err(|_| invalid())?,
            "createBackup" => self.create_backup = value.parse().map_err(|_| invalid())?,
            "temperature" => {
                let t: f64 = value.parse().map_err(|_| invalid())?;
                if !(0.0..=2.0).contains(&t) {
                    return Err(invalid());
                }
                self.temperature = t;
            }
            "maxConcurrentRequests" => {
                let n: usize = value.parse().map_err(|_| invalid())?;
                if n == 0 {
                    return Err(invalid());
                }
                self.max_concurrent_requests = n;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }
}

/// Default location of the settings file
pub fn config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
        .ok_or(ConfigError::NoConfigDir)
}

/// Read settings from `path`
///
/// A missing file is not an error: it yields the defaults. Keys absent from
/// the document also take their defaults.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        return Ok(Settings::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Read settings, falling back to defaults on any error
///
/// The failure is logged and the defaults are kept, so a broken config file
/// never prevents a run.
pub fn load_settings_or_default(path: &Path) -> Settings {
    match load_settings(path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("{}; using default settings", e);
            Settings::default()
        }
    }
}

/// Write settings to `path` as pretty-printed JSON
pub fn save_settings(path: &Path, settings: &Settings) -> Result<(), ConfigError> {
    let json = serde_json::to_vec_pretty(settings).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    atomic_write(path, &json).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Settings shared between concurrent requests
///
/// Readers take a snapshot with [`SharedSettings::load`] and keep using it for
/// the whole request; [`SharedSettings::replace`] swaps in a new snapshot
/// without blocking them.
#[derive(Debug, Clone)]
pub struct SharedSettings {
    inner: Arc<ArcSwap<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(ArcSwap::from_pointee(settings)),
        }
    }

    /// Current snapshot
    pub fn load(&self) -> Arc<Settings> {
        self.inner.load_full()
    }

    pub fn replace(&self, settings: Settings) {
        self.inner.store(Arc::new(settings));
    }

    /// Re-read `path` and swap the snapshot; keeps the old one on failure
    pub fn reload(&self, path: &Path) -> Result<(), ConfigError> {
        let settings = load_settings(path)?;
        tracing::debug!(server = %settings.ollama_server, model = %settings.model, "Settings reloaded");
        self.replace(settings);
        Ok(())
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
