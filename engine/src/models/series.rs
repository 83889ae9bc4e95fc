use crate::indicators::{ColumnValues, IndicatorColumn, MomentumColumns, SupportResistance};
use shared::models::{Candle, TimeFrame};
use std::collections::BTreeMap;

/// Annotated series for every timeframe of one instrument.
pub type SeriesMap = BTreeMap<TimeFrame, AnnotatedSeries>;

/// A candle series in its storage order (newest-first as fetched) with
/// indicator columns aligned row for row.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedSeries {
    pub timeframe: TimeFrame,
    pub candles: Vec<Candle>,
    pub momentum: MomentumColumns,
    /// Configurable columns; absent when the series was too short.
    pub indicators: BTreeMap<IndicatorColumn, ColumnValues>,
    /// Applies uniformly to every row of the series.
    pub levels: SupportResistance,
}

impl AnnotatedSeries {
    pub fn empty(timeframe: TimeFrame) -> Self {
        AnnotatedSeries {
            timeframe,
            candles: Vec::new(),
            momentum: MomentumColumns::default(),
            indicators: BTreeMap::new(),
            levels: SupportResistance::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn has_indicators(&self) -> bool {
        !self.indicators.is_empty()
    }

    /// Row indices sorted oldest-first.
    pub fn chronological_order(&self) -> Vec<usize> {
        chronological_order(&self.candles)
    }

    /// Row index of the most recent candle.
    pub fn latest_row(&self) -> Option<usize> {
        self.candles
            .iter()
            .enumerate()
            .max_by_key(|(_, candle)| candle.timestamp)
            .map(|(row, _)| row)
    }

    pub fn indicator(&self, column: IndicatorColumn) -> Option<&ColumnValues> {
        self.indicators.get(&column)
    }

    /// One-line readout of a row's momentum columns.
    pub fn momentum_summary(&self, row: usize) -> String {
        let value = |column: &ColumnValues| column.get(row).copied().flatten().filter(|v| v.is_finite());

        let mom = value(&self.momentum.acceleration)
            .map_or_else(|| "MOM: --".to_string(), |v| format!("MOM: {:+.5}", v));
        let wick = value(&self.momentum.wick_ratio)
            .map_or_else(|| "WICK: --".to_string(), |v| format!("WICK: {:.2}x", v));
        let body = value(&self.momentum.body_strength)
            .map_or_else(|| "BODY: --".to_string(), |v| format!("BODY: {:.0}%", v * 100.0));
        let atr = value(&self.momentum.atr)
            .map_or_else(|| "ATR: --".to_string(), |v| format!("ATR: {:.5}", v));

        format!("{} | {} | {} | {}", mom, wick, body, atr)
    }
}

/// Indices of `candles` sorted by timestamp, oldest first. Ties keep storage order.
pub fn chronological_order(candles: &[Candle]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candles.len()).collect();
    order.sort_by_key(|&row| candles[row].timestamp);
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::test_support::candle;

    #[test]
    fn test_chronological_order_of_newest_first_rows() {
        let candles = vec![candle(2, 1.0, 1.0, 1.0, 1.0), candle(1, 1.0, 1.0, 1.0, 1.0), candle(0, 1.0, 1.0, 1.0, 1.0)];
        assert_eq!(chronological_order(&candles), vec![2, 1, 0]);
    }

    #[test]
    fn test_latest_row_and_summary() {
        let mut series = AnnotatedSeries::empty(TimeFrame::M1);
        series.candles = vec![candle(5, 1.0, 1.2, 0.9, 1.1), candle(3, 1.0, 1.2, 0.9, 1.1)];
        series.momentum = MomentumColumns {
            momentum: vec![Some(0.1), Some(0.1)],
            acceleration: vec![Some(0.00012), None],
            wick_ratio: vec![Some(0.5), Some(0.5)],
            body_strength: vec![Some(0.333), Some(0.333)],
            atr: vec![Some(0.3), Some(0.3)],
        };
        assert_eq!(series.latest_row(), Some(0));
        assert_eq!(series.momentum_summary(0), "MOM: +0.00012 | WICK: 0.50x | BODY: 33% | ATR: 0.30000");
        assert_eq!(series.momentum_summary(1), "MOM: -- | WICK: 0.50x | BODY: 33% | ATR: 0.30000");
    }

    #[test]
    fn test_summary_of_unannotated_row() {
        let mut series = AnnotatedSeries::empty(TimeFrame::H1);
        series.candles = vec![candle(0, 1.0, 1.0, 1.0, 1.0)];
        assert_eq!(series.momentum_summary(0), "MOM: -- | WICK: -- | BODY: -- | ATR: --");
    }
}
