// Plot-ready readouts of cached series
use crate::indicators::IndicatorColumn;
use crate::models::series::{AnnotatedSeries, SeriesMap};
use serde::{Deserialize, Serialize};
use shared::models::{ChartPoint, TimeFrame};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    /// Epoch milliseconds.
    pub x: i64,
    pub y: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BollingerPlot {
    pub upper: Vec<PlotPoint>,
    pub middle: Vec<PlotPoint>,
    pub lower: Vec<PlotPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelsPlot {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub time_range: TimeRange,
}

/// Indicator series keyed like `sma_20` or `rsi`, with the grouped extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPlotData {
    #[serde(flatten)]
    pub lines: BTreeMap<String, Vec<PlotPoint>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bollinger: Option<BollingerPlot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_resistance: Option<LevelsPlot>,
}

impl IndicatorPlotData {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty() && self.bollinger.is_none() && self.support_resistance.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub instrument: String,
    pub timeframe: TimeFrame,
    pub points: Vec<ChartPoint>,
    pub total_candles: usize,
    pub indicators: BTreeMap<String, f64>,
    pub indicators_data: IndicatorPlotData,
}

/// OHLCV points of `timeframe`, oldest first. Empty when the timeframe is
/// absent or has no candles.
pub fn format_points(series: &SeriesMap, timeframe: TimeFrame) -> Vec<ChartPoint> {
    match series.get(&timeframe) {
        Some(series) => series
            .chronological_order()
            .into_iter()
            .map(|row| ChartPoint::from(&series.candles[row]))
            .collect(),
        None => Vec::new(),
    }
}

/// Value of every indicator column at the most recent candle.
pub fn current_indicator_values(series: &AnnotatedSeries) -> BTreeMap<String, f64> {
    let Some(row) = series.latest_row() else {
        return BTreeMap::new();
    };

    series
        .indicators
        .iter()
        .filter_map(|(column, values)| {
            values
                .get(row)
                .copied()
                .flatten()
                .filter(|v| v.is_finite())
                .map(|v| (column.key(), v))
        })
        .collect()
}

pub fn indicator_plot_data(series: &AnnotatedSeries) -> IndicatorPlotData {
    let mut plot = IndicatorPlotData::default();
    if !series.has_indicators() {
        return plot;
    }

    let order = series.chronological_order();
    let points = |column: IndicatorColumn| -> Vec<PlotPoint> {
        let Some(values) = series.indicator(column) else {
            return Vec::new();
        };
        order
            .iter()
            .filter_map(|&row| {
                values[row].filter(|v| v.is_finite()).map(|y| PlotPoint {
                    x: series.candles[row].timestamp.timestamp_millis(),
                    y,
                })
            })
            .collect()
    };

    for &column in series.indicators.keys() {
        if !column.is_bollinger() {
            plot.lines.insert(column.key(), points(column));
        }
    }

    if series.indicator(IndicatorColumn::BollingerMiddle).is_some() {
        plot.bollinger = Some(BollingerPlot {
            upper: points(IndicatorColumn::BollingerUpper),
            middle: points(IndicatorColumn::BollingerMiddle),
            lower: points(IndicatorColumn::BollingerLower),
        });
    }

    if let (Some(&first), Some(&last)) = (order.first(), order.last()) {
        plot.support_resistance = Some(LevelsPlot {
            support: series.levels.support.clone(),
            resistance: series.levels.resistance.clone(),
            time_range: TimeRange {
                start: series.candles[first].timestamp.timestamp_millis(),
                end: series.candles[last].timestamp.timestamp_millis(),
            },
        });
    }

    plot
}
