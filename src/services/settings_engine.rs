// Reader Settings Engine
// Loads, saves and updates the client settings. Settings are stored as a JSON
// file at the platform-specific config path unless overridden.

use std::env;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::ClientSettings;

/// Overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "ZIMREADER_CONFIG";
/// Overrides `backend_url` after loading.
pub const BACKEND_URL_ENV: &str = "ZIMREADER_BACKEND_URL";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ClientSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &ClientSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: ClientSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// Path resolution: `path_override`, then `$ZIMREADER_CONFIG`, then
    /// `settings.json` in the platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = path_override
            .or_else(|| env::var(CONFIG_PATH_ENV).ok())
            .unwrap_or_else(|| {
                platform::get_config_dir()
                    .join("settings.json")
                    .to_string_lossy()
                    .to_string()
            });

        Self {
            config_path,
            settings: ClientSettings::default(),
        }
    }

    /// Apply environment overrides on top of the loaded settings. These are
    /// not written back to disk by `save`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var(BACKEND_URL_ENV) {
            if !url.trim().is_empty() {
                debug!(backend_url = %url, "backend url overridden from environment");
                self.settings.backend_url = url;
            }
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// A missing file yields defaults; a malformed one is an error. Missing
    /// fields take their default values.
    fn load(&mut self) -> Result<ClientSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = ClientSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: ClientSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        info!(path = %self.config_path, "settings saved");
        Ok(())
    }

    fn get_settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Updates one top-level setting by name and saves.
    ///
    /// The new value is validated by deserializing the whole settings object,
    /// so a wrongly typed value leaves the current settings untouched.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        match json_value.as_object_mut() {
            Some(map) if map.contains_key(key) => {
                map.insert(key.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )));
            }
        }

        let new_settings: ClientSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;

        self.settings = new_settings;
        self.save()?;
        Ok(())
    }

    /// Resets all settings to defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = ClientSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
