// Per-candle momentum analysis: direction strength, acceleration, wick/body shape and ATR(14)
use super::rolling::{effective_window, rolling_mean};
use super::{ColumnValues, EPSILON};
use shared::models::Candle;

pub const ATR_PERIOD: usize = 14;

/// Base columns computed for every series regardless of its length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MomentumColumns {
    pub momentum: ColumnValues,
    pub acceleration: ColumnValues,
    pub wick_ratio: ColumnValues,
    pub body_strength: ColumnValues,
    pub atr: ColumnValues,
}

impl MomentumColumns {
    /// Computes the columns over chronological (oldest-first) candles.
    pub fn compute(data: &[Candle]) -> Self {
        let mut columns = MomentumColumns::default();
        let mut true_ranges = Vec::with_capacity(data.len());

        for (i, candle) in data.iter().enumerate() {
            columns.momentum.push(Some(candle.close - candle.open));

            let acceleration = if i >= 2 {
                let (c0, c1, c2) = (data[i - 2].close, data[i - 1].close, candle.close);
                Some((c2 - c1) - (c1 - c0))
            } else {
                None
            };
            columns.acceleration.push(acceleration);

            let wick_denominator = (candle.close - candle.low).max(EPSILON);
            columns.wick_ratio.push(Some((candle.high - candle.close).abs() / wick_denominator));

            let range_denominator = (candle.high - candle.low).max(EPSILON);
            columns.body_strength.push(Some((candle.close - candle.open).abs() / range_denominator));

            let high_low = candle.high - candle.low;
            let true_range = match i.checked_sub(1).map(|p| data[p].close) {
                Some(prev_close) => high_low
                    .max((candle.high - prev_close).abs())
                    .max((candle.low - prev_close).abs()),
                None => high_low,
            };
            true_ranges.push(true_range);
        }

        let window = effective_window(ATR_PERIOD, true_ranges.len());
        columns.atr = rolling_mean(&true_ranges, window).into_iter().map(Some).collect();
        columns
    }

    /// Moves every column from chronological order back to the series' storage order.
    pub fn scatter(self, order: &[usize]) -> Self {
        MomentumColumns {
            momentum: scatter(self.momentum, order),
            acceleration: scatter(self.acceleration, order),
            wick_ratio: scatter(self.wick_ratio, order),
            body_strength: scatter(self.body_strength, order),
            atr: scatter(self.atr, order),
        }
    }

    pub fn len(&self) -> usize {
        self.momentum.len()
    }

    pub fn is_empty(&self) -> bool {
        self.momentum.is_empty()
    }
}

/// `values[k]` belongs to storage row `order[k]`.
pub fn scatter(values: ColumnValues, order: &[usize]) -> ColumnValues {
    let mut aligned = vec![None; values.len()];
    for (value, &row) in values.into_iter().zip(order.iter()) {
        aligned[row] = value;
    }
    aligned
}
