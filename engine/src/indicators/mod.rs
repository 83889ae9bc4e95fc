// Technical indicators module
pub mod bollinger;
pub mod calculator;
pub mod ema;
pub mod macd;
pub mod momentum;
pub mod periods;
pub mod rolling;
pub mod rsi;
pub mod sma;
pub mod stochastic;
pub mod support_resistance;

pub use bollinger::Bollinger;
pub use calculator::{compute, MIN_CANDLES_FOR_INDICATORS};
pub use ema::Ema;
pub use macd::Macd;
pub use momentum::MomentumColumns;
pub use periods::IndicatorPeriods;
pub use rsi::Rsi;
pub use sma::Sma;
pub use stochastic::Stochastic;
pub use support_resistance::SupportResistance;

use crate::error::Result;
use serde_json::Value;
use shared::models::Candle;

/// Substituted for zero denominators (doji candles, flat ranges, no losses).
pub const EPSILON: f64 = 1e-5;

/// Row-aligned indicator values; `None` marks a gap.
pub type ColumnValues = Vec<Option<f64>>;

/// Every column the configurable indicators can attach to a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorColumn {
    Sma(usize),
    Ema(usize),
    Macd,
    MacdSignal,
    MacdHistogram,
    Rsi,
    BollingerUpper,
    BollingerMiddle,
    BollingerLower,
    StochK,
    StochD,
}

impl IndicatorColumn {
    /// Stable key used in chart payloads, e.g. `sma_20` or `bb_upper`.
    pub fn key(&self) -> String {
        match self {
            IndicatorColumn::Sma(period) => format!("sma_{}", period),
            IndicatorColumn::Ema(period) => format!("ema_{}", period),
            IndicatorColumn::Macd => "macd".to_string(),
            IndicatorColumn::MacdSignal => "macd_signal".to_string(),
            IndicatorColumn::MacdHistogram => "macd_histogram".to_string(),
            IndicatorColumn::Rsi => "rsi".to_string(),
            IndicatorColumn::BollingerUpper => "bb_upper".to_string(),
            IndicatorColumn::BollingerMiddle => "bb_middle".to_string(),
            IndicatorColumn::BollingerLower => "bb_lower".to_string(),
            IndicatorColumn::StochK => "stoch_k".to_string(),
            IndicatorColumn::StochD => "stoch_d".to_string(),
        }
    }

    pub fn is_bollinger(&self) -> bool {
        matches!(
            self,
            IndicatorColumn::BollingerUpper | IndicatorColumn::BollingerMiddle | IndicatorColumn::BollingerLower
        )
    }
}

// Common trait for all configurable indicators.
// `data` is always in chronological (oldest-first) order.
pub trait IndicatorCalculator: Send + Sync {
    fn name(&self) -> &str;
    fn parameters(&self) -> Value;
    fn calculate(&self, data: &[Candle]) -> Result<Vec<(IndicatorColumn, ColumnValues)>>;
}

pub(crate) fn closes(data: &[Candle]) -> Vec<f64> {
    data.iter().map(|c| c.close).collect()
}

pub(crate) fn require_period(indicator: &str, period: usize) -> Result<()> {
    if period == 0 {
        return Err(crate::error::EngineError::IndicatorError(format!(
            "{} period must be greater than 0",
            indicator
        )));
    }
    Ok(())
}
