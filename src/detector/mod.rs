//! Detection driver: parameters, match-set expansion and the RANSAC loop.

mod matchset;
mod params;
mod pipeline;
mod workspace;

pub use matchset::MatchSetFinder;
pub use params::{ConfigError, DetectorParams};
pub use pipeline::ShapeDetector;
