// Exponential Moving Average (EMA) indicator implementation
use super::rolling::{effective_window, ewm, to_column};
use super::{closes, require_period, ColumnValues, IndicatorCalculator, IndicatorColumn};
use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

pub struct Ema {
    name: String,
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self {
            name: format!("EMA({})", period),
            period,
        }
    }
}

impl IndicatorCalculator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn parameters(&self) -> Value {
        serde_json::json!({ "period": self.period })
    }

    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>> {
        require_period("EMA", self.period)?;
        let span = effective_window(self.period, data.len());
        let values = ewm(&closes(data), span);
        Ok(vec![(IndicatorColumn::Ema(self.period), to_column(values))])
    }
}
