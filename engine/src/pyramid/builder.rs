// Time-nested block tree over a coarse-to-fine timeframe hierarchy
use crate::error::{EngineError, Result};
use crate::models::series::{AnnotatedSeries, SeriesMap};
use chrono::{DateTime, Utc};
use shared::models::{Block, Pyramid, PyramidStyle, TimeFrame};
use shared::utils::{display_range, round_price};
use tracing::debug;

/// Parameters of one pyramid build.
#[derive(Debug, Clone, PartialEq)]
pub struct PyramidSpec {
    pub instrument: String,
    pub style: PyramidStyle,
    /// Coarsest first.
    pub structure: Vec<TimeFrame>,
    /// Timeframe of the root blocks; must be part of `structure`.
    pub base: TimeFrame,
    pub extract_count: usize,
}

impl PyramidSpec {
    /// The style's own hierarchy, rooted at its coarsest timeframe.
    pub fn for_style(instrument: &str, style: PyramidStyle, extract_count: usize) -> Self {
        let structure = style.structure();
        let base = structure.first().copied().unwrap_or(TimeFrame::D1);
        PyramidSpec {
            instrument: instrument.to_string(),
            style,
            structure,
            base,
            extract_count,
        }
    }

    fn validate(&self) -> Result<usize> {
        if self.structure.is_empty() {
            return Err(EngineError::InvalidStructure("timeframe hierarchy is empty".to_string()));
        }
        if !self.structure.windows(2).all(|pair| pair[0] > pair[1]) {
            return Err(EngineError::InvalidStructure(format!(
                "hierarchy {:?} is not ordered coarsest to finest",
                self.structure
            )));
        }
        self.structure
            .iter()
            .position(|&tf| tf == self.base)
            .ok_or_else(|| {
                EngineError::InvalidStructure(format!(
                    "base timeframe {} is not part of {:?}",
                    self.base, self.structure
                ))
            })
    }
}

/// Builds the pyramid for `spec` from annotated series.
///
/// Missing or empty series are not errors: an absent base series gives a
/// pyramid with metadata only, an absent finer series leaves that branch
/// without children. Only a malformed hierarchy fails.
pub fn build(spec: &PyramidSpec, data: &SeriesMap, generated_at: DateTime<Utc>) -> Result<Pyramid> {
    let base_level = spec.validate()?;

    let mut pyramid = Pyramid {
        instrument: spec.instrument.clone(),
        style: spec.style,
        structure: spec.structure.clone(),
        generated_at,
        blocks: Vec::new(),
    };

    let base = match data.get(&spec.base).filter(|series| !series.is_empty()) {
        Some(series) => series,
        None => {
            debug!(
                instrument = %spec.instrument,
                timeframe = %spec.base,
                "No base timeframe data, returning empty pyramid"
            );
            return Ok(pyramid);
        }
    };

    // Newest first
    pyramid.blocks = base
        .chronological_order()
        .into_iter()
        .rev()
        .take(spec.extract_count)
        .map(|row| make_block(&spec.structure, base_level, base, row, data))
        .collect();

    Ok(pyramid)
}

fn make_block(structure: &[TimeFrame], level: usize, series: &AnnotatedSeries, row: usize, data: &SeriesMap) -> Block {
    let candle = &series.candles[row];
    let timeframe = series.timeframe;

    Block {
        timeframe,
        time: candle.timestamp,
        display_range: display_range(candle.timestamp, timeframe),
        open: round_price(candle.open),
        high: round_price(candle.high),
        low: round_price(candle.low),
        close: round_price(candle.close),
        volume: candle.volume,
        direction: candle.direction(),
        momentum_summary: series.momentum_summary(row),
        children: collect_children(structure, level, timeframe, candle.timestamp, data),
    }
}

/// Blocks of the next finer level whose time falls in `[parent_time, parent_time + duration)`,
/// ascending by time.
fn collect_children(
    structure: &[TimeFrame],
    level: usize,
    parent_tf: TimeFrame,
    parent_time: DateTime<Utc>,
    data: &SeriesMap,
) -> Vec<Block> {
    let next = level + 1;
    let Some(&child_tf) = structure.get(next) else {
        return Vec::new();
    };
    let Some(series) = data.get(&child_tf).filter(|series| !series.is_empty()) else {
        return Vec::new();
    };

    let end = parent_time + parent_tf.duration();
    let mut rows: Vec<usize> = (0..series.len())
        .filter(|&row| {
            let time = series.candles[row].timestamp;
            time >= parent_time && time < end
        })
        .collect();
    rows.sort_by_key(|&row| series.candles[row].timestamp);

    rows.into_iter()
        .map(|row| make_block(structure, next, series, row, data))
        .collect()
}
