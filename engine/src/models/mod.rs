// Engine-side models. Plain candles and pyramid nodes live in `shared::models`;
// this module adds the indicator-annotated series the engine works with.
pub mod series;

pub use series::{chronological_order, AnnotatedSeries, SeriesMap};
