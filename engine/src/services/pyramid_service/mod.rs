// Read side of the engine: everything the presentation layer asks for.
// Handlers live in their own files and work on a cache snapshot.

mod get_analysis;
mod get_chart_data;

pub use get_analysis::{handle_get_analysis, Analysis};
pub use get_chart_data::handle_get_chart_data;

use crate::cache::InstrumentCache;
use crate::chart::ChartData;
use crate::config::settings::Settings;
use crate::error::Result;
use crate::indicators::IndicatorPeriods;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::models::{Pyramid, PyramidStyle, TimeFrame};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub connected: bool,
    pub cached_instruments: BTreeSet<String>,
    pub current_structure: Vec<TimeFrame>,
    pub active_instrument: Option<String>,
    pub timestamp: DateTime<Utc>,
}

pub struct PyramidService {
    cache: Arc<InstrumentCache>,
    settings: Arc<RwLock<Settings>>,
}

impl PyramidService {
    pub fn new(cache: Arc<InstrumentCache>, settings: Arc<RwLock<Settings>>) -> Self {
        PyramidService { cache, settings }
    }

    /// Never fails; unseen instruments get an empty pyramid.
    pub async fn get_pyramid(&self, instrument: &str, style: Option<PyramidStyle>) -> Pyramid {
        let entry = self.cache.get_or_create(instrument).await;
        if let Some(style) = style.filter(|s| *s != entry.pyramid.style) {
            tracing::debug!(
                instrument = %entry.pyramid.instrument,
                requested = %style,
                cached = %entry.pyramid.style,
                "Requested style differs from cached pyramid, serving cached"
            );
        }
        entry.pyramid.clone()
    }

    /// Fails only when `overrides` holds a malformed period.
    pub async fn get_chart_data(
        &self,
        instrument: &str,
        timeframe: TimeFrame,
        overrides: &BTreeMap<String, i64>,
    ) -> Result<ChartData> {
        let periods = IndicatorPeriods::from_overrides(overrides)?;
        let entry = self.cache.get_or_create(instrument).await;
        Ok(handle_get_chart_data(&entry, timeframe, &periods))
    }

    pub async fn get_cached_instruments(&self) -> BTreeSet<String> {
        self.cache.list_instruments().await
    }

    /// Reads cached state only; `connected` is what the last cycle saw.
    pub async fn get_health(&self) -> HealthStatus {
        let current_structure = self.settings.read().await.structure();
        HealthStatus {
            connected: self.cache.is_source_connected(),
            cached_instruments: self.cache.list_instruments().await,
            current_structure,
            active_instrument: self.cache.active().await,
            timestamp: Utc::now(),
        }
    }

    pub async fn get_analysis(&self, instrument: &str) -> Analysis {
        let entry = self.cache.get_or_create(instrument).await;
        handle_get_analysis(&entry)
    }
}
