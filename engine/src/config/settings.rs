// Engine settings, loaded from the user settings file with defaults merged underneath
use serde::{Deserialize, Serialize};
use shared::models::{PyramidStyle, TimeFrame};
use shared::utils::normalize_instrument;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub instrument: String,
    pub pyramid_style: PyramidStyle,
    pub fetch_interval_secs: u64,
    pub extract_count: usize,
    pub candle_count: usize,
    /// Hours added to source timestamps.
    pub utc_offset: i64,
    pub auto_suffix: bool,
    pub error_backoff_secs: u64,
    pub data_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            instrument: "EURUSD".to_string(),
            pyramid_style: PyramidStyle::Daily,
            fetch_interval_secs: 30,
            extract_count: 10,
            candle_count: 200,
            utc_offset: 0,
            auto_suffix: true,
            error_backoff_secs: 60,
            data_dir: PathBuf::from("data"),
        }
    }
}

impl Settings {
    pub fn instrument(&self) -> String {
        normalize_instrument(&self.instrument)
    }

    pub fn structure(&self) -> Vec<TimeFrame> {
        self.pyramid_style.structure()
    }

    pub fn fetch_interval(&self) -> Duration {
        Duration::from_secs(self.fetch_interval_secs.max(1))
    }

    /// Pause after a failed cycle; never shorter than the normal interval.
    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs).max(self.fetch_interval())
    }

    pub fn candles_dir(&self) -> PathBuf {
        self.data_dir.join("candles")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"instrument": "GBP/USD", "extract_count": 4}"#).unwrap();
        assert_eq!(settings.instrument(), "GBPUSD");
        assert_eq!(settings.extract_count, 4);
        assert_eq!(settings.fetch_interval_secs, 30);
        assert_eq!(settings.pyramid_style, PyramidStyle::Daily);
    }

    #[test]
    fn test_unknown_style_uses_default_structure() {
        let settings: Settings = serde_json::from_str(r#"{"pyramid_style": "monthly"}"#).unwrap();
        assert_eq!(settings.structure(), PyramidStyle::Daily.structure());
    }

    #[test]
    fn test_backoff_never_below_interval() {
        let settings = Settings { fetch_interval_secs: 90, error_backoff_secs: 60, ..Settings::default() };
        assert_eq!(settings.error_backoff(), Duration::from_secs(90));
        assert_eq!(Settings::default().error_backoff(), Duration::from_secs(60));
    }
}
