// Engine main entry point
use engine::cache::InstrumentCache;
use engine::data::{CsvMarketDataSource, MarketDataSource};
use engine::services::{Collector, PyramidService};
use engine::storage::{JsonStore, SettingsStore};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tracing::info;

const HEALTH_LOG_INTERVAL: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    info!("Starting Pyramid Engine...");

    let settings = SettingsStore::in_dir(Path::new("data")).load();
    info!(
        instrument = %settings.instrument(),
        style = %settings.pyramid_style,
        interval_secs = settings.fetch_interval().as_secs(),
        "Settings loaded"
    );

    let source: Arc<dyn MarketDataSource> = Arc::new(CsvMarketDataSource::from_settings(&settings));
    let cache = Arc::new(InstrumentCache::new(settings.pyramid_style));
    let store = Arc::new(JsonStore::new(settings.data_dir.clone()));
    let settings = Arc::new(RwLock::new(settings));

    let service = PyramidService::new(Arc::clone(&cache), Arc::clone(&settings));
    let collector = Arc::new(Collector::new(source, Arc::clone(&cache), store, settings));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector_task = {
        let collector = Arc::clone(&collector);
        tokio::spawn(async move { collector.run(shutdown_rx).await })
    };

    let mut health_rx = shutdown_tx.subscribe();
    let health_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(HEALTH_LOG_INTERVAL) => {
                    let health = service.get_health().await;
                    info!(
                        connected = health.connected,
                        cached = health.cached_instruments.len(),
                        active = ?health.active_instrument,
                        "Health check"
                    );
                }
                _ = health_rx.changed() => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown_tx.send(true)?;

    collector_task.await?;
    health_task.await?;
    info!("Pyramid Engine stopped");
    Ok(())
}
