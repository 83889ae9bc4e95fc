use super::write_atomic;
use crate::config::settings::Settings;
use crate::error::{EngineError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SETTINGS_FILE: &str = "user_settings.json";

/// User settings on disk; saved keys override the defaults one by one.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SettingsStore { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields the defaults.
    pub fn load(&self) -> Settings {
        if !self.path.exists() {
            info!(path = %self.path.display(), "No saved settings, using defaults");
            return Settings::default();
        }
        match self.read() {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %self.path.display(), error_detail = ?e, "Unreadable settings, using defaults");
                Settings::default()
            }
        }
    }

    fn read(&self) -> Result<Settings> {
        let raw = fs::read_to_string(&self.path)?;
        let saved = match serde_json::from_str(&raw)? {
            serde_json::Value::Object(saved) => saved,
            other => {
                return Err(EngineError::ConfigError(format!(
                    "{} holds {} instead of a settings object",
                    self.path.display(),
                    json_kind(&other)
                )))
            }
        };
        let mut merged = serde_json::to_value(Settings::default())?;
        if let Some(base) = merged.as_object_mut() {
            for (key, value) in saved {
                base.insert(key, value);
            }
        }
        Ok(serde_json::from_value(merged)?)
    }

    pub fn save(&self, settings: &Settings) -> Result<()> {
        write_atomic(&self.path, &serde_json::to_string_pretty(settings)?)?;
        info!(path = %self.path.display(), instrument = %settings.instrument, "Settings saved");
        Ok(())
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
