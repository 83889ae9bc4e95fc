// Indicator pipeline: annotates one candle series with momentum columns,
// the configurable indicators and support/resistance levels.
use super::momentum::scatter;
use super::rolling::fill_gaps;
use super::support_resistance::{find_levels, DEFAULT_LOOKBACK};
use super::{IndicatorPeriods, MomentumColumns};
use crate::models::series::{chronological_order, AnnotatedSeries};
use shared::models::{Candle, TimeFrame};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Shorter series only receive the momentum columns.
pub const MIN_CANDLES_FOR_INDICATORS: usize = 20;

/// Annotates `candles` (any storage order) without touching the input.
///
/// Columns are computed over a chronological working copy and written back
/// to the row each value belongs to, so every column lines up with
/// `candles` as given. A failing indicator is logged and skipped; the
/// remaining columns are still returned.
pub fn compute(timeframe: TimeFrame, candles: &[Candle], periods: Option<&IndicatorPeriods>) -> AnnotatedSeries {
    let order = chronological_order(candles);
    let working: Vec<Candle> = order.iter().map(|&row| candles[row].clone()).collect();

    let mut series = AnnotatedSeries {
        timeframe,
        candles: candles.to_vec(),
        momentum: MomentumColumns::compute(&working).scatter(&order),
        indicators: BTreeMap::new(),
        levels: Default::default(),
    };

    if working.len() < MIN_CANDLES_FOR_INDICATORS {
        debug!(
            timeframe = %timeframe,
            candles = working.len(),
            "Series too short for configurable indicators, skipping"
        );
        return series;
    }

    let defaults = IndicatorPeriods::default();
    let periods = periods.unwrap_or(&defaults);

    for calculator in periods.calculators() {
        match calculator.calculate(&working) {
            Ok(outputs) => {
                for (column, mut values) in outputs {
                    fill_gaps(&mut values);
                    series.indicators.insert(column, scatter(values, &order));
                }
            }
            Err(e) => {
                warn!(
                    timeframe = %timeframe,
                    indicator = calculator.name(),
                    parameters = %calculator.parameters(),
                    error_detail = ?e,
                    "Indicator calculation failed, column skipped"
                );
            }
        }
    }

    series.levels = find_levels(&working, DEFAULT_LOOKBACK);
    series
}
