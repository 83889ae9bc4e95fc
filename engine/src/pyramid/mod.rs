pub mod builder;

pub use builder::{build, PyramidSpec};
