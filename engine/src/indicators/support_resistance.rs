// Support/resistance levels from swing highs and lows
use super::EPSILON;
use shared::models::Candle;

pub const DEFAULT_LOOKBACK: usize = 20;
pub const MAX_LEVELS: usize = 5;
/// Levels closer than this relative distance to a recorded one are duplicates.
pub const DUPLICATE_TOLERANCE: f64 = 0.001;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

impl SupportResistance {
    pub fn is_empty(&self) -> bool {
        self.support.is_empty() && self.resistance.is_empty()
    }
}

/// Scans chronological candles for strict local extrema within `lookback`
/// candles on both sides. Candle direction plays no part: flat candles count.
pub fn find_levels(data: &[Candle], lookback: usize) -> SupportResistance {
    let mut levels = SupportResistance::default();
    if lookback == 0 || data.len() < lookback * 2 {
        return levels;
    }

    for i in lookback..data.len() - lookback {
        let neighbours = (1..=lookback).flat_map(|j| [i - j, i + j]);

        let high = data[i].high;
        if neighbours.clone().all(|n| high > data[n].high) {
            record_level(&mut levels.resistance, high);
        }

        let low = data[i].low;
        if neighbours.clone().all(|n| low < data[n].low) {
            record_level(&mut levels.support, low);
        }
    }

    levels.support.sort_by(f64::total_cmp);
    levels.resistance.sort_by(f64::total_cmp);
    // Highest supports and lowest resistances sit nearest to price
    let excess = levels.support.len().saturating_sub(MAX_LEVELS);
    levels.support.drain(..excess);
    levels.resistance.truncate(MAX_LEVELS);
    levels
}

fn record_level(levels: &mut Vec<f64>, level: f64) {
    let duplicate = levels
        .iter()
        .any(|existing| (level - existing).abs() / existing.abs().max(EPSILON) < DUPLICATE_TOLERANCE);
    if !duplicate {
        levels.push(level);
    }
}
