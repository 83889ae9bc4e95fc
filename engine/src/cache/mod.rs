pub mod instrument_cache;

pub use instrument_cache::{CacheEntry, InstrumentCache};
