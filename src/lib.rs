#![doc = include_str!("../README.md")]

// Public modules (stable-ish surface)
pub mod cloud;
pub mod config;
pub mod detector;
pub mod types;

// Lower-level building blocks, public for tooling and tests.
pub mod geom;
pub mod octree;
pub mod shapes;

// --- High-level re-exports -------------------------------------------------

// Main entry points: detector + results.
pub use crate::detector::{ConfigError, DetectorParams, ShapeDetector};
pub use crate::types::{DetectedShape, DetectionResult, ShapeType};

// Cloud construction.
pub use crate::cloud::{CloudError, PointNormal, PointNormalCloud};

// Fitted models, for callers that want typed parameters.
pub use crate::shapes::{CylinderModel, PlaneModel, ShapeModel, SphereModel};

// --- Prelude ---------------------------------------------------------------

/// Small prelude for quick experiments.
///
/// ```no_run
/// use shape_detector::prelude::*;
/// use nalgebra::{Point3, Vector3};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let points = vec![Point3::new(0.0, 0.0, 0.0); 100];
/// let normals = vec![Vector3::z(); 100];
///
/// let params = DetectorParams::default();
/// let cloud = PointNormalCloud::build(points, normals, params.neighbors)?;
///
/// let mut detector = ShapeDetector::new(params)?;
/// let result = detector.detect(&cloud, None);
/// println!(
///     "shapes={} unmatched={} latency_ms={:.3}",
///     result.shapes.len(),
///     result.unmatched.len(),
///     result.latency_ms
/// );
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::cloud::PointNormalCloud;
    pub use crate::{DetectionResult, DetectorParams, ShapeDetector, ShapeType};
}
