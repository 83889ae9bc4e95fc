// Bollinger Bands indicator implementation
use super::rolling::{effective_window, rolling_mean, rolling_std, to_column};
use super::{closes, require_period, ColumnValues, IndicatorCalculator, IndicatorColumn};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Bollinger {
    name: String,
    period: usize,
    std_dev: f64,
}

impl Bollinger {
    pub fn new(period: usize, std_dev: f64) -> Self {
        Self {
            name: format!("BB({},{})", period, std_dev),
            period,
            std_dev,
        }
    }
}

impl IndicatorCalculator for Bollinger {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period, "std_dev": self.std_dev })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("Bollinger", self.period)?;
        let closes = closes(data);
        let window = effective_window(self.period, closes.len());
        let middle = rolling_mean(&closes, window);
        // A single-sample window has no deviation yet: the band collapses onto the mean
        let deviation: Vec<f64> = rolling_std(&closes, window)
            .into_iter()
            .map(|std| std.unwrap_or(0.0) * self.std_dev)
            .collect();

        let upper = middle.iter().zip(deviation.iter()).map(|(m, d)| m + d).collect();
        let lower = middle.iter().zip(deviation.iter()).map(|(m, d)| m - d).collect();

        Ok(vec![
            (IndicatorColumn::BollingerUpper, to_column(upper)),
            (IndicatorColumn::BollingerMiddle, to_column(middle)),
            (IndicatorColumn::BollingerLower, to_column(lower)),
        ])
    }
}
