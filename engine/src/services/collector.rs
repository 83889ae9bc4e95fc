// Background producer: fetch, annotate, build, swap into the cache
use crate::cache::InstrumentCache;
use crate::config::settings::Settings;
use crate::data::market_data::{fetch_all_timeframes, MarketDataSource};
use crate::error::{EngineError, Result};
use crate::indicators::compute;
use crate::models::series::SeriesMap;
use crate::pyramid::{build, PyramidSpec};
use crate::storage::PyramidSink;
use chrono::Utc;
use shared::models::Pyramid;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, Notify, RwLock};
use tracing::{debug, error, info, warn};

/// Outcome of one successful cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub instrument: String,
    pub blocks: usize,
    /// Timeframes that returned at least one candle.
    pub timeframes: usize,
}

pub struct Collector {
    source: Arc<dyn MarketDataSource>,
    cache: Arc<InstrumentCache>,
    sink: Arc<dyn PyramidSink>,
    settings: Arc<RwLock<Settings>>,
    cycle_lock: Mutex<()>,
    wake: Notify,
}

impl Collector {
    pub fn new(
        source: Arc<dyn MarketDataSource>,
        cache: Arc<InstrumentCache>,
        sink: Arc<dyn PyramidSink>,
        settings: Arc<RwLock<Settings>>,
    ) -> Self {
        Collector {
            source,
            cache,
            sink,
            settings,
            cycle_lock: Mutex::new(()),
            wake: Notify::new(),
        }
    }

    /// Runs cycles until `shutdown` turns true or its sender is dropped.
    /// A failed cycle leaves the cache untouched and delays the next one by
    /// the error backoff. A target switch has already cycled the new
    /// instrument, so its wake-up only restarts the wait.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!("Collector started");
        'cycles: loop {
            if *shutdown.borrow() {
                break;
            }

            let settings = self.settings.read().await.clone();
            let mut delay = match self.run_cycle(&settings).await {
                Ok(report) => {
                    info!(
                        instrument = %report.instrument,
                        blocks = report.blocks,
                        timeframes = report.timeframes,
                        "Collector cycle complete"
                    );
                    settings.fetch_interval()
                }
                Err(e) => {
                    error!(
                        instrument = %settings.instrument(),
                        error_detail = ?e,
                        "Collector cycle failed, backing off"
                    );
                    settings.error_backoff()
                }
            };

            loop {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => break,
                    _ = self.wake.notified() => {
                        delay = self.settings.read().await.fetch_interval();
                        debug!(delay_secs = delay.as_secs(), "Target switched, wait restarted");
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break 'cycles;
                        }
                    }
                }
            }
        }
        info!("Collector stopped");
    }

    /// One full cycle for `settings.instrument`. The cache entry is replaced
    /// only after every step succeeded; the source's connection state is
    /// recorded either way.
    pub async fn run_cycle(&self, settings: &Settings) -> Result<CycleReport> {
        let _cycle = self.cycle_lock.lock().await;
        let instrument = settings.instrument();
        let spec = PyramidSpec::for_style(&instrument, settings.pyramid_style, settings.extract_count);
        let source = Arc::clone(&self.source);

        let fetch_instrument = instrument.clone();
        let (connected, built) = tokio::task::spawn_blocking(move || {
            let built = fetch_and_build(source.as_ref(), &fetch_instrument, &spec);
            (source.is_connected(), built)
        })
        .await
        .map_err(|e| EngineError::MarketDataError(format!("collector task failed: {}", e)))?;
        self.cache.set_source_connected(connected);
        let (pyramid, series) = built?;

        let report = CycleReport {
            instrument: instrument.clone(),
            blocks: pyramid.blocks.len(),
            timeframes: series.values().filter(|s| !s.is_empty()).count(),
        };
        if report.timeframes == 0 {
            warn!(instrument = %instrument, "No timeframe returned data");
        }

        self.cache.replace(&instrument, pyramid.clone(), series).await;
        self.cache.set_active(&instrument).await;
        self.persist(pyramid);

        Ok(report)
    }

    /// Re-targets the collector and runs a cycle for the new instrument right
    /// away. Entries of other instruments stay cached.
    pub async fn switch_instrument(&self, settings: Settings) -> Result<CycleReport> {
        info!(
            instrument = %settings.instrument(),
            style = settings.pyramid_style.display_name(),
            "Switching collector target"
        );
        self.cache.set_placeholder_style(settings.pyramid_style).await;
        *self.settings.write().await = settings.clone();
        let report = self.run_cycle(&settings).await;
        self.wake.notify_one();
        report
    }

    fn persist(&self, pyramid: Pyramid) {
        let sink = Arc::clone(&self.sink);
        tokio::task::spawn_blocking(move || {
            if let Err(e) = sink.save(&pyramid) {
                warn!(instrument = %pyramid.instrument, error_detail = ?e, "Failed to persist pyramid");
            }
        });
    }
}

fn fetch_and_build(source: &dyn MarketDataSource, instrument: &str, spec: &PyramidSpec) -> Result<(Pyramid, SeriesMap)> {
    let fetched = fetch_all_timeframes(source, instrument)?;
    let series: SeriesMap = fetched
        .into_iter()
        .map(|(timeframe, candles)| (timeframe, compute(timeframe, &candles, None)))
        .collect();
    let pyramid = build(spec, &series, Utc::now())?;
    Ok((pyramid, series))
}
