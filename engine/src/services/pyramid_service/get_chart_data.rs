// Handler for chart requests
use crate::cache::CacheEntry;
use crate::chart::{current_indicator_values, format_points, indicator_plot_data, ChartData, IndicatorPlotData};
use crate::indicators::{compute, IndicatorPeriods};
use shared::models::TimeFrame;
use std::collections::BTreeMap;

/// Chart payload for one timeframe of a cached entry. Indicators are
/// recomputed with `periods` on a copy of the cached candles; the cached
/// series keeps its default-period columns.
pub fn handle_get_chart_data(entry: &CacheEntry, timeframe: TimeFrame, periods: &IndicatorPeriods) -> ChartData {
    let instrument = entry.pyramid.instrument.clone();
    let points = format_points(&entry.series, timeframe);

    let (indicators, indicators_data) = match entry.series(timeframe).filter(|s| !s.is_empty()) {
        Some(series) => {
            let annotated = compute(timeframe, &series.candles, Some(periods));
            (current_indicator_values(&annotated), indicator_plot_data(&annotated))
        }
        None => {
            tracing::debug!(instrument = %instrument, timeframe = %timeframe, "No cached candles for chart");
            (BTreeMap::new(), IndicatorPlotData::default())
        }
    };

    ChartData {
        instrument,
        timeframe,
        total_candles: points.len(),
        points,
        indicators,
        indicators_data,
    }
}
