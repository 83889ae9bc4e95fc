pub mod collector;
pub mod pyramid_service;

pub use collector::{Collector, CycleReport};
pub use pyramid_service::{Analysis, HealthStatus, PyramidService};
