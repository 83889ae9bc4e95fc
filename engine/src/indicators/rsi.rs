// Relative Strength Index (RSI) indicator implementation
use super::rolling::{effective_window, rolling_mean};
use super::{closes, require_period, ColumnValues, IndicatorCalculator, IndicatorColumn, EPSILON};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Rsi {
    name: String,
    period: usize,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("RSI({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("RSI", self.period)?;
        let closes = closes(data);
        let window = effective_window(self.period, closes.len());

        // The first row has no previous close: it counts as neither gain nor loss
        let mut gains = Vec::with_capacity(closes.len());
        let mut losses = Vec::with_capacity(closes.len());
        for i in 0..closes.len() {
            let change = if i == 0 { 0.0 } else { closes[i] - closes[i - 1] };
            gains.push(change.max(0.0));
            losses.push((-change).max(0.0));
        }

        let avg_gain = rolling_mean(&gains, window);
        let avg_loss = rolling_mean(&losses, window);

        let values = avg_gain
            .iter()
            .zip(avg_loss.iter())
            .map(|(&gain, &loss)| {
                let denominator = if loss > 0.0 { loss } else { EPSILON };
                let rs = gain / denominator;
                let rsi = 100.0 - (100.0 / (1.0 + rs));
                if rsi.is_finite() {
                    Some(rsi.clamp(0.0, 100.0))
                } else {
                    None
                }
            })
            .collect();

        Ok(vec![(IndicatorColumn::Rsi, values)])
    }
}
