// Market data collaborators: the source contract and an in-memory store
use crate::error::{EngineError, Result};
use shared::models::{Candle, TimeFrame};
use shared::utils::normalize_instrument;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Supplies candles per instrument and timeframe. Calls may block; the
/// collector runs them on a blocking task.
pub trait MarketDataSource: Send + Sync {
    /// Candles newest first, or `None` when the timeframe is unavailable.
    fn fetch(&self, instrument: &str, timeframe: TimeFrame) -> Result<Option<Vec<Candle>>>;

    fn is_connected(&self) -> bool;
}

/// Fetches every timeframe the engine knows about. Unavailable timeframes
/// come back as empty series; a source error aborts the whole fetch.
pub fn fetch_all_timeframes(
    source: &dyn MarketDataSource,
    instrument: &str,
) -> Result<BTreeMap<TimeFrame, Vec<Candle>>> {
    let mut fetched = BTreeMap::new();
    for timeframe in TimeFrame::ALL {
        let candles = source.fetch(instrument, timeframe).map_err(|e| {
            warn!(instrument = %instrument, timeframe = %timeframe, error_detail = ?e, "Fetch failed");
            e
        })?;
        let candles = match candles {
            Some(candles) => {
                debug!(instrument = %instrument, timeframe = %timeframe, candles = candles.len(), "Fetched timeframe");
                candles
            }
            None => {
                warn!(instrument = %instrument, timeframe = %timeframe, "Timeframe unavailable, using empty series");
                Vec::new()
            }
        };
        fetched.insert(timeframe, candles);
    }
    Ok(fetched)
}

/// Candles kept in memory per instrument and timeframe, oldest first internally.
pub struct InMemoryMarketData {
    data: RwLock<HashMap<String, HashMap<TimeFrame, Vec<Candle>>>>,
    connected: AtomicBool,
}

impl InMemoryMarketData {
    pub fn new() -> Self {
        InMemoryMarketData {
            data: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Merges candles into the stored series; a timestamp already present is kept once.
    pub fn add_candles(&self, instrument: &str, timeframe: TimeFrame, new_candles: Vec<Candle>) -> Result<()> {
        let mut data = self
            .data
            .write()
            .map_err(|_| EngineError::MarketDataError("market data store lock poisoned".to_string()))?;
        let series = data
            .entry(normalize_instrument(instrument))
            .or_default()
            .entry(timeframe)
            .or_default();

        series.extend(new_candles);
        series.sort_by_key(|c| c.timestamp);
        series.dedup_by_key(|c| c.timestamp);
        Ok(())
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for InMemoryMarketData {
    fn default() -> Self {
        Self::new()
    }
}

impl MarketDataSource for InMemoryMarketData {
    fn fetch(&self, instrument: &str, timeframe: TimeFrame) -> Result<Option<Vec<Candle>>> {
        if !self.is_connected() {
            return Err(EngineError::MarketDataError("market data source is disconnected".to_string()));
        }
        let data = self
            .data
            .read()
            .map_err(|_| EngineError::MarketDataError("market data store lock poisoned".to_string()))?;
        Ok(data
            .get(&normalize_instrument(instrument))
            .and_then(|series| series.get(&timeframe))
            .map(|candles| candles.iter().rev().cloned().collect()))
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}
