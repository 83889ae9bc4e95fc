use super::market_data::MarketDataSource;
use crate::config::settings::Settings;
use crate::error::{EngineError, Result};
use chrono::{DateTime, Duration, Utc};
use csv::{ReaderBuilder, StringRecord};
use shared::models::{Candle, TimeFrame};
use shared::utils::normalize_instrument;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Broker symbol variants tried when the plain name has no file.
const SYMBOL_SUFFIXES: [&str; 2] = ["m", "c"];

// Timestamp handling for exported candle files
pub mod time_format {
    use crate::error::{EngineError, Result};
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

    /// Accepts unix seconds, RFC 3339, or `YYYY-MM-DD HH:MM:SS` read as UTC.
    pub fn parse_time(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(secs) = s.parse::<i64>() {
            return Utc
                .timestamp_opt(secs, 0)
                .single()
                .ok_or_else(|| EngineError::MarketDataError(format!("Unix time '{}' out of range", s)));
        }
        if let Ok(time) = DateTime::parse_from_rfc3339(s) {
            return Ok(time.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .map(|naive| naive.and_utc())
            .map_err(|e| EngineError::MarketDataError(format!("Failed to parse time '{}': {}", s, e)))
    }

}

/// Reads `<dir>/<INSTRUMENT>_<TF>.csv` exports with header
/// `time,open,high,low,close,tick_volume`.
pub struct CsvMarketDataSource {
    dir: PathBuf,
    candle_count: usize,
    utc_offset: Duration,
    auto_suffix: bool,
}

impl CsvMarketDataSource {
    pub fn new(dir: impl Into<PathBuf>, candle_count: usize, utc_offset_hours: i64, auto_suffix: bool) -> Self {
        CsvMarketDataSource {
            dir: dir.into(),
            candle_count,
            utc_offset: Duration::hours(utc_offset_hours),
            auto_suffix,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.candles_dir(),
            settings.candle_count,
            settings.utc_offset,
            settings.auto_suffix,
        )
    }

    fn resolve_file(&self, instrument: &str, timeframe: TimeFrame) -> Option<PathBuf> {
        let base = normalize_instrument(instrument);
        let plain = self.dir.join(format!("{}_{}.csv", base, timeframe));
        if plain.is_file() {
            return Some(plain);
        }
        if !self.auto_suffix {
            return None;
        }
        SYMBOL_SUFFIXES
            .iter()
            .map(|suffix| self.dir.join(format!("{}{}_{}.csv", base, suffix, timeframe)))
            .find(|path| path.is_file())
    }

    /// All rows of one file, newest first, at most `candle_count` of them.
    pub fn load_candles_from_csv(&self, file_path: &Path) -> Result<Vec<Candle>> {
        let file = File::open(file_path)?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let mut candles = Vec::new();

        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result?;

            let time_str = Self::require_field(&record, &headers, "time", line)?;
            let timestamp = time_format::parse_time(time_str)
                .map_err(|e| EngineError::MarketDataError(format!("Error parsing time at line {}: {}", line, e)))?
                + self.utc_offset;

            let open = Self::parse_price(&record, &headers, "open", line)?;
            let high = Self::parse_price(&record, &headers, "high", line)?;
            let low = Self::parse_price(&record, &headers, "low", line)?;
            let close = Self::parse_price(&record, &headers, "close", line)?;

            // Exports without a volume column still load
            let volume = match Self::get_field(&record, &headers, "tick_volume")
                .or_else(|| Self::get_field(&record, &headers, "volume"))
            {
                Some(raw) if !raw.is_empty() => raw
                    .parse::<u64>()
                    .map_err(|e| {
                        EngineError::MarketDataError(format!("Error parsing 'tick_volume' at line {}: {}", line, e))
                    })?,
                _ => 0,
            };

            candles.push(Candle { timestamp, open, high, low, close, volume });
        }

        candles.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        candles.dedup_by_key(|c| c.timestamp);
        candles.truncate(self.candle_count);
        Ok(candles)
    }

    fn get_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .position(|header| header.eq_ignore_ascii_case(name))
            .and_then(|pos| record.get(pos))
    }

    fn require_field<'a>(record: &'a StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<&'a str> {
        Self::get_field(record, headers, name)
            .ok_or_else(|| {
                EngineError::MarketDataError(format!("Missing '{}' field in CSV record at line {}", name, line))
            })
    }

    fn parse_price(record: &StringRecord, headers: &StringRecord, name: &str, line: usize) -> Result<f64> {
        let raw = Self::require_field(record, headers, name, line)?;
        raw.parse::<f64>()
            .map_err(|e| EngineError::MarketDataError(format!("Error parsing '{}' at line {}: {}", name, line, e)))
    }
}

impl MarketDataSource for CsvMarketDataSource {
    fn fetch(&self, instrument: &str, timeframe: TimeFrame) -> Result<Option<Vec<Candle>>> {
        let Some(path) = self.resolve_file(instrument, timeframe) else {
            debug!(instrument = %instrument, timeframe = %timeframe, dir = %self.dir.display(), "No candle file");
            return Ok(None);
        };
        self.load_candles_from_csv(&path).map(Some)
    }

    fn is_connected(&self) -> bool {
        self.dir.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    const HEADER: &str = "time,open,high,low,close,tick_volume";

    fn write_csv(dir: &TempDir, name: &str, rows: &[&str]) {
        let mut content = String::from(HEADER);
        for row in rows {
            content.push('\n');
            content.push_str(row);
        }
        fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn test_fetch_returns_newest_first_with_limit() {
        let dir = TempDir::new().unwrap();
        write_csv(
            &dir,
            "EURUSD_H1.csv",
            &[
                "1704067200,1.1000,1.1010,1.0990,1.1005,120",
                "1704070800,1.1005,1.1020,1.1000,1.1015,80",
                "1704074400,1.1015,1.1030,1.1010,1.1012,95",
            ],
        );
        let source = CsvMarketDataSource::new(dir.path(), 2, 0, false);

        let candles = source.fetch("EUR/USD", TimeFrame::H1).unwrap().unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap());
        assert_eq!(candles[0].volume, 95);
        assert_eq!(candles[1].close, 1.1015);
        assert!(source.is_connected());
    }

    #[test]
    fn test_utc_offset_is_applied() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "GBPUSD_D1.csv", &["2024-01-01T00:00:00Z,1.27,1.28,1.26,1.275,1000"]);
        let source = CsvMarketDataSource::new(dir.path(), 200, 3, false);

        let candles = source.fetch("GBPUSD", TimeFrame::D1).unwrap().unwrap();
        assert_eq!(candles[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = TempDir::new().unwrap();
        let source = CsvMarketDataSource::new(dir.path(), 200, 0, true);
        assert_eq!(source.fetch("EURUSD", TimeFrame::M5).unwrap(), None);
    }

    #[test]
    fn test_suffixed_symbol_file_is_found() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "EURUSDm_M5.csv", &["1704067200,1.1,1.1,1.1,1.1,1"]);

        let plain = CsvMarketDataSource::new(dir.path(), 200, 0, false);
        assert_eq!(plain.fetch("EURUSD", TimeFrame::M5).unwrap(), None);

        let suffixed = CsvMarketDataSource::new(dir.path(), 200, 0, true);
        assert_eq!(suffixed.fetch("EURUSD", TimeFrame::M5).unwrap().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_volume_column_defaults_to_zero() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("EURUSD_M1.csv"), "time,open,high,low,close\n1704067200,1.1,1.2,1.0,1.15").unwrap();
        let source = CsvMarketDataSource::new(dir.path(), 200, 0, false);
        assert_eq!(source.fetch("EURUSD", TimeFrame::M1).unwrap().unwrap()[0].volume, 0);
    }

    #[test]
    fn test_invalid_price_is_an_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "EURUSD_M15.csv", &["1704067200,abc,1.1,1.1,1.1,1"]);
        let source = CsvMarketDataSource::new(dir.path(), 200, 0, false);

        match source.fetch("EURUSD", TimeFrame::M15) {
            Err(EngineError::MarketDataError(msg)) => assert!(msg.contains("Error parsing 'open' at line 2")),
            other => panic!("expected MarketDataError, got {:?}", other),
        }
    }

    #[test]
    fn test_unopenable_file_is_an_io_error() {
        let dir = TempDir::new().unwrap();
        let source = CsvMarketDataSource::new(dir.path(), 200, 0, false);
        let err = source.load_candles_from_csv(&dir.path().join("EURUSD_H4.csv")).unwrap_err();
        assert!(matches!(err, EngineError::IoError { .. }));
    }

    #[test]
    fn test_ragged_row_is_a_csv_error() {
        let dir = TempDir::new().unwrap();
        write_csv(&dir, "EURUSD_H4.csv", &["1704067200,1.1,1.2,1.0,1.15,10", "1704081600,1.15,1.2"]);
        let source = CsvMarketDataSource::new(dir.path(), 200, 0, false);

        let err = source.fetch("EURUSD", TimeFrame::H4).unwrap_err();
        assert!(matches!(err, EngineError::CsvSystemError { .. }));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_missing_directory_is_disconnected() {
        let source = CsvMarketDataSource::new("/nonexistent/candles", 200, 0, false);
        assert!(!source.is_connected());
    }
}
