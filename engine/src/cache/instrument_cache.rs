// Per-instrument snapshot cache shared by the collector and readers
use crate::models::series::{AnnotatedSeries, SeriesMap};
use chrono::Utc;
use shared::models::{Pyramid, PyramidStyle, TimeFrame};
use shared::utils::normalize_instrument;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// The pyramid and the series it was built from, always swapped together.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub pyramid: Pyramid,
    pub series: SeriesMap,
}

impl CacheEntry {
    /// Placeholder for an instrument nothing has been produced for yet.
    pub fn empty(instrument: &str, style: PyramidStyle) -> Self {
        CacheEntry {
            pyramid: Pyramid::empty(instrument, style, Utc::now()),
            series: TimeFrame::ALL
                .iter()
                .map(|&tf| (tf, AnnotatedSeries::empty(tf)))
                .collect(),
        }
    }

    pub fn series(&self, timeframe: TimeFrame) -> Option<&AnnotatedSeries> {
        self.series.get(&timeframe)
    }
}

/// Entries are immutable `Arc` snapshots; a replace swaps the pointer under
/// the write lock, so readers holding the old snapshot keep a consistent view.
pub struct InstrumentCache {
    entries: RwLock<HashMap<String, Arc<CacheEntry>>>,
    placeholder_style: RwLock<PyramidStyle>,
    active: RwLock<Option<String>>,
    // Last connection state the producer observed
    source_connected: AtomicBool,
}

impl InstrumentCache {
    pub fn new(placeholder_style: PyramidStyle) -> Self {
        InstrumentCache {
            entries: RwLock::new(HashMap::new()),
            placeholder_style: RwLock::new(placeholder_style),
            active: RwLock::new(None),
            source_connected: AtomicBool::new(false),
        }
    }

    /// Style used for the metadata of lazily created entries.
    pub async fn set_placeholder_style(&self, style: PyramidStyle) {
        *self.placeholder_style.write().await = style;
    }

    pub async fn get(&self, instrument: &str) -> Option<Arc<CacheEntry>> {
        let key = normalize_instrument(instrument);
        self.entries.read().await.get(&key).cloned()
    }

    /// Existing entry, or a freshly inserted empty one. Never does I/O.
    pub async fn get_or_create(&self, instrument: &str) -> Arc<CacheEntry> {
        let key = normalize_instrument(instrument);
        if let Some(entry) = self.entries.read().await.get(&key) {
            return Arc::clone(entry);
        }

        let style = *self.placeholder_style.read().await;
        let mut entries = self.entries.write().await;
        // Another task may have inserted between the two locks
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| {
                debug!(instrument = %key, "Creating empty cache entry");
                Arc::new(CacheEntry::empty(&key, style))
            });
        Arc::clone(entry)
    }

    pub async fn replace(&self, instrument: &str, pyramid: Pyramid, series: SeriesMap) {
        let key = normalize_instrument(instrument);
        let entry = Arc::new(CacheEntry { pyramid, series });
        let blocks = entry.pyramid.blocks.len();
        self.entries.write().await.insert(key.clone(), entry);
        debug!(instrument = %key, blocks, "Cache entry replaced");
    }

    pub async fn evict(&self, instrument: &str) -> bool {
        let key = normalize_instrument(instrument);
        let removed = self.entries.write().await.remove(&key).is_some();
        if removed {
            info!(instrument = %key, "Cache entry evicted");
        }
        removed
    }

    pub async fn list_instruments(&self) -> BTreeSet<String> {
        self.entries.read().await.keys().cloned().collect()
    }

    pub async fn instrument_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Advisory pointer for single-instrument consumers.
    pub async fn set_active(&self, instrument: &str) {
        *self.active.write().await = Some(normalize_instrument(instrument));
    }

    pub async fn active(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    pub fn set_source_connected(&self, connected: bool) {
        self.source_connected.store(connected, Ordering::SeqCst);
    }

    /// `false` until the first cycle has run.
    pub fn is_source_connected(&self) -> bool {
        self.source_connected.load(Ordering::SeqCst)
    }
}

impl Default for InstrumentCache {
    fn default() -> Self {
        InstrumentCache::new(PyramidStyle::default())
    }
}
