// Stochastic Oscillator (%K / %D) indicator implementation
use super::rolling::{effective_window, rolling_max, rolling_mean, rolling_min, to_column};
use super::{require_period, ColumnValues, IndicatorCalculator, IndicatorColumn, EPSILON};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Stochastic {
    name: String,
    k_period: usize,
    d_period: usize,
}

impl Stochastic {
    pub fn new(k_period: usize, d_period: usize) -> Self {
        Self {
            name: format!("STOCH({},{})", k_period, d_period),
            k_period,
            d_period,
        }
    }
}

impl IndicatorCalculator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "k": self.k_period, "d": self.d_period })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("Stochastic %K", self.k_period)?;
        require_period("Stochastic %D", self.d_period)?;

        let len = data.len();
        let highs: Vec<f64> = data.iter().map(|c| c.high).collect();
        let lows: Vec<f64> = data.iter().map(|c| c.low).collect();
        let k_window = effective_window(self.k_period, len);
        let lowest = rolling_min(&lows, k_window);
        let highest = rolling_max(&highs, k_window);

        let k: Vec<f64> = data
            .iter()
            .enumerate()
            .map(|(i, candle)| {
                let range = highest[i] - lowest[i];
                let range = if range == 0.0 { EPSILON } else { range };
                100.0 * (candle.close - lowest[i]) / range
            })
            .collect();
        let d = rolling_mean(&k, effective_window(self.d_period, len));

        Ok(vec![
            (IndicatorColumn::StochK, to_column(k)),
            (IndicatorColumn::StochD, to_column(d)),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::{assert_close, candle};

    #[test]
    fn test_stochastic_range_position() {
        let candles = vec![
            candle(0, 10.0, 12.0, 8.0, 10.0),
            candle(1, 10.0, 14.0, 9.0, 14.0),
            candle(2, 14.0, 15.0, 10.0, 11.0),
        ];
        let outputs = Stochastic::new(3, 2).calculate(&candles).unwrap();
        let k = &outputs[0].1;
        let d = &outputs[1].1;
        // Row 1: low 8, high 14, close 14
        assert_close(k[1], 100.0);
        // Row 2: low 8, high 15, close 11
        assert_close(k[2], 100.0 * 3.0 / 7.0);
        assert_close(d[2], (100.0 + 100.0 * 3.0 / 7.0) / 2.0);
    }

    #[test]
    fn test_stochastic_flat_range_is_finite() {
        let candles = vec![candle(0, 1.0, 1.0, 1.0, 1.0), candle(1, 1.0, 1.0, 1.0, 1.0)];
        let outputs = Stochastic::new(14, 3).calculate(&candles).unwrap();
        assert!(outputs[0].1.iter().all(|v| v.map_or(false, f64::is_finite)));
        assert_close(outputs[0].1[1], 0.0);
    }
}
