// Simple Moving Average (SMA) indicator implementation
use super::rolling::{effective_window, rolling_mean, to_column};
use super::{closes, require_period, ColumnValues, IndicatorCalculator, IndicatorColumn};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Sma {
    name: String,
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("SMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("SMA", self.period)?;
        let window = effective_window(self.period, data.len());
        let values = rolling_mean(&closes(data), window);
        Ok(vec![(IndicatorColumn::Sma(self.period), to_column(values))])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, candles_from_closes};

    #[test]
    fn test_sma_calculation() {
        let candles = candles_from_closes(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let outputs = Sma::new(3).calculate(&candles).unwrap();
        let (column, values) = &outputs[0];
        assert_eq!(*column, IndicatorColumn::Sma(3));
        // Partial windows at the start: 1, (1+2)/2, then full windows
        assert_close(values[0], 1.0);
        assert_close(values[1], 1.5);
        assert_close(values[2], 2.0);
        assert_close(values[3], 3.0);
        assert_close(values[4], 4.0);
    }

    #[test]
    fn test_sma_period_larger_than_series_is_clamped() {
        let candles = candles_from_closes(&[2.0, 4.0, 6.0]);
        let outputs = Sma::new(50).calculate(&candles).unwrap();
        // Column keeps the requested period in its name
        assert_eq!(outputs[0].0, IndicatorColumn::Sma(50));
        assert_close(outputs[0].1[2], 4.0);
    }

    #[test]
    fn test_sma_empty_data() {
        let outputs = Sma::new(3).calculate(&[]).unwrap();
        assert!(outputs[0].1.is_empty());
    }

    #[test]
    fn test_sma_period_zero_is_an_error() {
        let candles = candles_from_closes(&[1.0]);
        assert!(Sma::new(0).calculate(&candles).is_err());
        assert_eq!(Sma::new(20).name(), "SMA(20)");
    }
}
