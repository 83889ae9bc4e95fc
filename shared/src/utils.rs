// Small pure helpers shared by the engine and any consumer of its output.
use chrono::{DateTime, Utc};

use crate::models::TimeFrame;

/// Broker-style instrument names are stored without separators, upper-cased.
pub fn normalize_instrument(name: &str) -> String {
    name.trim().replace('/', "").to_uppercase()
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Prices inside blocks are rounded to 5 decimals.
pub fn round_price(value: f64) -> f64 {
    round_to(value, 5)
}

/// Label shown on a block: a date for daily buckets, a clock range for
/// intraday buckets and a single clock stamp for the finest timeframe.
pub fn display_range(time: DateTime<Utc>, timeframe: TimeFrame) -> String {
    if timeframe.is_daily() {
        return format!("[{}]", time.format("%Y-%m-%d"));
    }
    let start = time.format("%H:%M");
    if timeframe.is_finest() {
        return format!("[{}]", start);
    }
    let end = (time + timeframe.closing_offset()).format("%H:%M");
    format!("[{}-{}]", start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_instrument() {
        assert_eq!(normalize_instrument("EUR/USD"), "EURUSD");
        assert_eq!(normalize_instrument(" xauusd "), "XAUUSD");
    }

    #[test]
    fn test_round_price() {
        assert_eq!(round_price(1.100004), 1.1);
        assert_eq!(round_price(1.105006), 1.10501);
    }

    #[test]
    fn test_display_range_per_timeframe() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 4, 0, 0).unwrap();
        assert_eq!(display_range(t, TimeFrame::D1), "[2024-01-01]");
        assert_eq!(display_range(t, TimeFrame::H4), "[04:00-07:59]");
        assert_eq!(display_range(t, TimeFrame::H1), "[04:00-04:59]");
        assert_eq!(display_range(t, TimeFrame::M15), "[04:00-04:14]");
        assert_eq!(display_range(t, TimeFrame::M5), "[04:00-04:04]");
        assert_eq!(display_range(t, TimeFrame::M1), "[04:00]");
    }
}
