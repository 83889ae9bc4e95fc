// JSON snapshots of pyramids and an append-only alert log
use super::write_atomic;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::Pyramid;
use shared::utils::normalize_instrument;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

/// Receives every pyramid the collector produces.
pub trait PyramidSink: Send + Sync {
    fn save(&self, pyramid: &Pyramid) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub created: DateTime<Utc>,
    pub message: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

pub struct JsonStore {
    dir: PathBuf,
    // Serializes read-modify-write of the alert log
    alerts_lock: Mutex<()>,
}

impl JsonStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonStore {
            dir: dir.into(),
            alerts_lock: Mutex::new(()),
        }
    }

    fn pyramid_path(&self, instrument: &str) -> PathBuf {
        self.dir.join(format!("pyramid_{}.json", normalize_instrument(instrument)))
    }

    fn alerts_path(&self) -> PathBuf {
        self.dir.join("alerts.json")
    }

    /// Last saved pyramid, `None` when the instrument was never saved.
    pub fn load_pyramid(&self, instrument: &str) -> Result<Option<Pyramid>> {
        let path = self.pyramid_path(instrument);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn save_alert(&self, message: &str, payload: serde_json::Value) -> Result<Alert> {
        let _guard = self
            .alerts_lock
            .lock()
            .map_err(|_| EngineError::PersistenceError("alert log lock poisoned".to_string()))?;

        let mut alerts = self.load_alerts()?;
        let alert = Alert {
            id: Uuid::new_v4(),
            created: Utc::now(),
            message: message.to_string(),
            payload,
        };
        alerts.push(alert.clone());
        write_atomic(&self.alerts_path(), &serde_json::to_string_pretty(&alerts)?)?;

        info!(alert_id = %alert.id, message = %alert.message, "Alert saved");
        Ok(alert)
    }

    pub fn load_alerts(&self) -> Result<Vec<Alert>> {
        let path = self.alerts_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl PyramidSink for JsonStore {
    fn save(&self, pyramid: &Pyramid) -> Result<()> {
        let path = self.pyramid_path(&pyramid.instrument);
        write_atomic(&path, &serde_json::to_string_pretty(pyramid)?)?;
        debug!(instrument = %pyramid.instrument, path = %path.display(), "Pyramid saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use shared::models::PyramidStyle;
    use tempfile::TempDir;

    #[test]
    fn test_pyramid_save_and_load() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path().join("nested"));
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let pyramid = Pyramid::empty("EURUSD", PyramidStyle::Intraday, generated_at);

        assert!(store.load_pyramid("EURUSD").unwrap().is_none());
        store.save(&pyramid).unwrap();
        assert!(dir.path().join("nested/pyramid_EURUSD.json").exists());
        assert_eq!(store.load_pyramid("eur/usd").unwrap(), Some(pyramid));
    }

    #[test]
    fn test_repeated_saves_of_one_instrument_from_many_threads() {
        let dir = TempDir::new().unwrap();
        let store = std::sync::Arc::new(JsonStore::new(dir.path()));
        let generated_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();

        let savers: Vec<_> = (0..4)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    let pyramid = Pyramid::empty("EURUSD", PyramidStyle::Daily, generated_at);
                    for _ in 0..50 {
                        store.save(&pyramid).unwrap();
                    }
                })
            })
            .collect();
        for saver in savers {
            saver.join().unwrap();
        }

        let loaded = store.load_pyramid("EURUSD").unwrap().unwrap();
        assert_eq!(loaded.instrument, "EURUSD");
    }

    #[test]
    fn test_alerts_append() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::new(dir.path());

        assert!(store.load_alerts().unwrap().is_empty());
        let first = store.save_alert("Potential BUY signal", serde_json::json!({"instrument": "EURUSD"})).unwrap();
        let second = store.save_alert("Potential SELL signal", serde_json::Value::Null).unwrap();

        let alerts = store.load_alerts().unwrap();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0], first);
        assert_eq!(alerts[1].message, "Potential SELL signal");
        assert_ne!(first.id, second.id);
    }

    #[test]
    fn test_corrupt_alert_log_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("alerts.json"), "not json").unwrap();
        let store = JsonStore::new(dir.path());
        assert!(matches!(store.load_alerts(), Err(EngineError::JsonError { .. })));
    }
}
