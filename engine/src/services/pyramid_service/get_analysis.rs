// Handler for the technical summary of an instrument's latest pyramid
use crate::cache::CacheEntry;
use serde::{Deserialize, Serialize};
use shared::models::{Block, Direction};

/// Body share of the candle range above which a root block is a signal.
pub const STRONG_BODY_STRENGTH: f64 = 0.70;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub technical_summary: String,
    pub trading_signals: Vec<String>,
    pub market_structure: String,
}

pub fn handle_get_analysis(entry: &CacheEntry) -> Analysis {
    let pyramid = &entry.pyramid;
    let Some(latest) = pyramid.blocks.first() else {
        return Analysis {
            technical_summary: "No data available for analysis".to_string(),
            trading_signals: vec!["No strong signals detected".to_string()],
            market_structure: "Waiting for market data...".to_string(),
        };
    };

    let labels: Vec<&str> = pyramid.structure.iter().map(|tf| tf.label()).collect();
    let market_structure = format!("Monitoring {} timeframes: {}", labels.len(), labels.join(" → "));

    let mut trading_signals = Vec::new();
    if body_strength(entry, latest).is_some_and(|strength| strength >= STRONG_BODY_STRENGTH) {
        match latest.direction {
            Direction::Up => trading_signals.push("Potential BUY signal - Strong bullish momentum".to_string()),
            Direction::Down => trading_signals.push("Potential SELL signal - Strong bearish momentum".to_string()),
            Direction::Flat => {}
        }
    }
    if trading_signals.is_empty() {
        trading_signals.push("No strong signals detected".to_string());
    }

    Analysis {
        technical_summary: format!(
            "Latest {} block: {} - {}",
            latest.timeframe,
            latest.direction.symbol(),
            latest.momentum_summary
        ),
        trading_signals,
        market_structure,
    }
}

fn body_strength(entry: &CacheEntry, block: &Block) -> Option<f64> {
    let series = entry.series(block.timeframe)?;
    let row = series.candles.iter().position(|c| c.timestamp == block.time)?;
    series.momentum.body_strength.get(row).copied().flatten()
}
