use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn direction(&self) -> Direction {
        Direction::from_momentum(self.close - self.open)
    }
}

/// Timeframe labels, declared finest first so that `Ord` sorts M1 < ... < D1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeFrame {
    M1,
    M5,
    M15,
    H1,
    H4,
    D1,
}

impl TimeFrame {
    /// Every timeframe the collector fetches, coarsest first.
    pub const ALL: [TimeFrame; 6] = [
        TimeFrame::D1,
        TimeFrame::H4,
        TimeFrame::H1,
        TimeFrame::M15,
        TimeFrame::M5,
        TimeFrame::M1,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TimeFrame::M1 => "M1",
            TimeFrame::M5 => "M5",
            TimeFrame::M15 => "M15",
            TimeFrame::H1 => "H1",
            TimeFrame::H4 => "H4",
            TimeFrame::D1 => "D1",
        }
    }

    pub fn minutes(&self) -> i64 {
        match self {
            TimeFrame::M1 => 1,
            TimeFrame::M5 => 5,
            TimeFrame::M15 => 15,
            TimeFrame::H1 => 60,
            TimeFrame::H4 => 240,
            TimeFrame::D1 => 1440,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }

    /// Offset of the last minute inside a bucket, used for `[start-end]` labels.
    pub fn closing_offset(&self) -> Duration {
        Duration::minutes(self.minutes() - 1)
    }

    pub fn is_daily(&self) -> bool {
        matches!(self, TimeFrame::D1)
    }

    /// The finest granularity renders a single clock stamp rather than a range.
    pub fn is_finest(&self) -> bool {
        matches!(self, TimeFrame::M1)
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeFrame {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "M1" => Ok(TimeFrame::M1),
            "M5" => Ok(TimeFrame::M5),
            "M15" => Ok(TimeFrame::M15),
            "H1" => Ok(TimeFrame::H1),
            "H4" => Ok(TimeFrame::H4),
            "D1" => Ok(TimeFrame::D1),
            other => Err(anyhow!("Unknown timeframe label '{}'", other)),
        }
    }
}

/// Named coarse-to-fine timeframe hierarchies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PyramidStyle {
    Scalper,
    Intraday,
    Swing,
    #[default]
    Daily,
}

impl PyramidStyle {
    pub fn key(&self) -> &'static str {
        match self {
            PyramidStyle::Scalper => "scalper",
            PyramidStyle::Intraday => "intraday",
            PyramidStyle::Swing => "swing",
            PyramidStyle::Daily => "daily",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PyramidStyle::Scalper => "Scalper",
            PyramidStyle::Intraday => "Intraday",
            PyramidStyle::Swing => "Swing",
            PyramidStyle::Daily => "Daily",
        }
    }

    pub fn structure(&self) -> Vec<TimeFrame> {
        use TimeFrame::*;
        match self {
            PyramidStyle::Scalper => vec![M15, M5, M1],
            PyramidStyle::Intraday => vec![H1, M15, M5, M1],
            PyramidStyle::Swing => vec![H4, H1, M15, M5, M1],
            PyramidStyle::Daily => vec![D1, H4, H1, M15, M5, M1],
        }
    }

    /// Unknown names fall back to the default style instead of failing.
    pub fn parse_or_default(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "scalper" => PyramidStyle::Scalper,
            "intraday" => PyramidStyle::Intraday,
            "swing" => PyramidStyle::Swing,
            "daily" => PyramidStyle::Daily,
            _ => PyramidStyle::default(),
        }
    }
}

impl From<String> for PyramidStyle {
    fn from(name: String) -> Self {
        PyramidStyle::parse_or_default(&name)
    }
}

impl From<PyramidStyle> for String {
    fn from(style: PyramidStyle) -> Self {
        style.key().to_string()
    }
}

impl fmt::Display for PyramidStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    /// Flat only on exact equality of close and open.
    pub fn from_momentum(momentum: f64) -> Self {
        if momentum > 0.0 {
            Direction::Up
        } else if momentum < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Flat => "flat",
        }
    }
}

/// One node of the pyramid tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(rename = "tf")]
    pub timeframe: TimeFrame,
    pub time: DateTime<Utc>,
    #[serde(rename = "range")]
    pub display_range: String,
    #[serde(rename = "O")]
    pub open: f64,
    #[serde(rename = "H")]
    pub high: f64,
    #[serde(rename = "L")]
    pub low: f64,
    #[serde(rename = "C")]
    pub close: f64,
    pub volume: u64,
    #[serde(rename = "dir")]
    pub direction: Direction,
    pub momentum_summary: String,
    pub children: Vec<Block>,
}

impl Block {
    /// End of this block's bucket (exclusive).
    pub fn end_time(&self) -> DateTime<Utc> {
        self.time + self.timeframe.duration()
    }

    /// Number of levels below this block along its deepest path.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pyramid {
    pub instrument: String,
    pub style: PyramidStyle,
    pub structure: Vec<TimeFrame>,
    pub generated_at: DateTime<Utc>,
    pub blocks: Vec<Block>,
}

impl Pyramid {
    /// Metadata-only pyramid used when there is nothing to show yet.
    pub fn empty(instrument: &str, style: PyramidStyle, generated_at: DateTime<Utc>) -> Self {
        Pyramid {
            instrument: instrument.to_string(),
            style,
            structure: style.structure(),
            generated_at,
            blocks: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

/// Flat OHLCV point for charting libraries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub time: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl From<&Candle> for ChartPoint {
    fn from(candle: &Candle) -> Self {
        ChartPoint {
            time: candle.timestamp,
            open: candle.open,
            high: candle.high,
            low: candle.low,
            close: candle.close,
            volume: candle.volume,
        }
    }
}
