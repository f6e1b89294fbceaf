//! Public result types returned by the detector.

use crate::shapes::ShapeModel;
use serde::{Deserialize, Serialize};

/// Primitive types the detector can search for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeType {
    Plane,
    Sphere,
    Cylinder,
}

/// One accepted primitive: type tag, fitted model, encoded parameters and
/// the member points. Immutable once returned.
#[derive(Clone, Debug, Serialize)]
pub struct DetectedShape {
    pub shape: ShapeType,
    pub model: ShapeModel,
    /// Flat parameter vector (see the per-shape codecs).
    pub parameters: Vec<f64>,
    /// Member point indices into the input cloud.
    pub indices: Vec<u32>,
}

/// Output of one detection run. The shape member lists and `unmatched`
/// together partition the input; removal is greedy in acceptance order, so
/// a boundary point goes to whichever shape claimed it first.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DetectionResult {
    pub shapes: Vec<DetectedShape>,
    /// Indices of points no accepted shape claimed.
    pub unmatched: Vec<u32>,
    /// Total sampling iterations spent across all searches.
    pub iterations: usize,
    pub latency_ms: f64,
}
