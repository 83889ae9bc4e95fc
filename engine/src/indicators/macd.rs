// Moving Average Convergence Divergence (MACD) indicator implementation
use super::rolling::{effective_window, ewm, to_column};
use super::{closes, require_period, ColumnValues, IndicatorCalculator, IndicatorColumn};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Macd {
    name: String,
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            name: format!("MACD({},{},{})", fast, slow, signal),
            fast,
            slow,
            signal,
        }
    }
}

impl IndicatorCalculator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "fast": self.fast, "slow": self.slow, "signal": self.signal })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("MACD fast", self.fast)?;
        require_period("MACD slow", self.slow)?;
        require_period("MACD signal", self.signal)?;

        let closes = closes(data);
        let len = closes.len();
        let fast = ewm(&closes, effective_window(self.fast, len));
        let slow = ewm(&closes, effective_window(self.slow, len));

        let macd: Vec<f64> = fast.iter().zip(slow.iter()).map(|(f, s)| f - s).collect();
        let signal = ewm(&macd, effective_window(self.signal, len));
        let histogram: Vec<f64> = macd.iter().zip(signal.iter()).map(|(m, s)| m - s).collect();

        Ok(vec![
            (IndicatorColumn::Macd, to_column(macd)),
            (IndicatorColumn::MacdSignal, to_column(signal)),
            (IndicatorColumn::MacdHistogram, to_column(histogram)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, candles_from_closes};

    #[test]
    fn test_macd_columns_and_identity() {
        let closes: Vec<f64> = (1..=40).map(|i| (i as f64).sqrt() * 10.0).collect();
        let candles = candles_from_closes(&closes);
        let outputs = Macd::new(12, 26, 9).calculate(&candles).unwrap();
        assert_eq!(outputs.len(), 3);
        let macd = &outputs[0].1;
        let signal = &outputs[1].1;
        let histogram = &outputs[2].1;
        for i in 0..closes.len() {
            assert_close(histogram[i], macd[i].unwrap() - signal[i].unwrap());
        }
        // Rising series: fast EMA sits above the slow one
        assert!(macd[39].unwrap() > 0.0);
        // First row: both EMAs are seeded with the same close
        assert_close(macd[0], 0.0);
    }

    #[test]
    fn test_macd_rejects_zero_span() {
        let candles = candles_from_closes(&[1.0, 2.0]);
        assert!(Macd::new(12, 0, 9).calculate(&candles).is_err());
    }
}
