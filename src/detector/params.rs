//! Detector configuration and eager validation.
//!
//! All tunables live in [`DetectorParams`]. Inconsistent configurations are
//! construction-time errors: [`ShapeDetector`](super::ShapeDetector) refuses
//! to build rather than degrade silently.

use crate::shapes::{FitParams, ShapeDescription};
use crate::types::ShapeType;
use serde::{Deserialize, Serialize};

/// Detector-wide parameters.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Primitive types to search for, evaluated in order for each sample.
    pub shapes: Vec<ShapeType>,
    /// Maximum refinement iterations per accepted candidate.
    pub fit_iterations: usize,
    /// Refinement exits once the parameter delta falls below this.
    pub fit_convergence: f64,
    /// An octree cell subdivides when it holds more points than this.
    /// Data dependent; try 50-100.
    pub octree_split: usize,
    /// Minimum inlier count for a candidate to be accepted as a shape.
    pub min_model_accept: usize,
    /// Iterations added to the sampling budget whenever a new best candidate
    /// appears.
    pub ransac_extension: usize,
    /// Hard ceiling on sampling iterations per shape search; extensions are
    /// clamped to it.
    pub max_iterations: usize,
    /// Seed for all randomized sampling.
    pub seed: u64,
    /// Angle tolerance (radians) for minimal-sample validation and the
    /// normal gate in distance evaluation.
    pub tol_angle_rad: f64,
    /// Distance tolerance for minimal-sample validation.
    pub tol_distance: f64,
    /// Euclidean distance below which a point counts as an inlier.
    pub inlier_threshold: f64,
    /// Neighbor count for the cloud's k-nearest-neighbor graph.
    pub neighbors: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            shapes: vec![ShapeType::Plane, ShapeType::Sphere, ShapeType::Cylinder],
            fit_iterations: 100,
            fit_convergence: 1e-8,
            octree_split: 100,
            min_model_accept: 50,
            ransac_extension: 15,
            max_iterations: 1000,
            seed: 0xDEAD_BEEF,
            tol_angle_rad: 0.2,
            tol_distance: 0.2,
            inlier_threshold: 0.2,
            neighbors: 8,
        }
    }
}

impl DetectorParams {
    /// Convenience constructor covering the knobs that vary most between
    /// datasets; everything else keeps its default.
    pub fn standard(
        fit_iterations: usize,
        tol_angle_rad: f64,
        tol_distance: f64,
        inlier_threshold: f64,
    ) -> Self {
        Self {
            fit_iterations,
            tol_angle_rad,
            tol_distance,
            inlier_threshold,
            ..Self::default()
        }
    }

    /// Checks internal consistency. Called by the detector constructor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shapes.is_empty() {
            return Err(ConfigError::NoShapes);
        }
        if self.octree_split < self.min_model_accept {
            return Err(ConfigError::SplitBelowMinAccept {
                octree_split: self.octree_split,
                min_model_accept: self.min_model_accept,
            });
        }
        if self.min_model_accept < 3 {
            return Err(ConfigError::MinAcceptBelowSampleSize {
                min_model_accept: self.min_model_accept,
            });
        }
        if self.fit_iterations == 0 || self.max_iterations == 0 || self.ransac_extension == 0 {
            return Err(ConfigError::ZeroIterations);
        }
        if self.neighbors == 0 {
            return Err(ConfigError::ZeroNeighbors);
        }
        for (name, value) in [
            ("fit_convergence", self.fit_convergence),
            ("tol_angle_rad", self.tol_angle_rad),
            ("tol_distance", self.tol_distance),
            ("inlier_threshold", self.inlier_threshold),
        ] {
            if !(value > 0.0) {
                return Err(ConfigError::NonPositiveTolerance { name });
            }
        }
        Ok(())
    }

    pub(crate) fn fit_params(&self) -> FitParams {
        FitParams {
            max_iterations: self.fit_iterations,
            convergence: self.fit_convergence,
        }
    }

    pub(crate) fn descriptions(&self) -> Vec<ShapeDescription> {
        self.shapes
            .iter()
            .map(|&shape| {
                ShapeDescription::new(
                    shape,
                    self.tol_angle_rad,
                    self.tol_distance,
                    self.inlier_threshold,
                )
            })
            .collect()
    }
}

/// Reasons a configuration fails validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A cell must be able to contain a full candidate before subdividing is
    /// worthwhile.
    SplitBelowMinAccept {
        octree_split: usize,
        min_model_accept: usize,
    },
    MinAcceptBelowSampleSize {
        min_model_accept: usize,
    },
    NoShapes,
    ZeroIterations,
    ZeroNeighbors,
    NonPositiveTolerance {
        name: &'static str,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::SplitBelowMinAccept {
                octree_split,
                min_model_accept,
            } => write!(
                f,
                "octree_split ({octree_split}) must be at least min_model_accept ({min_model_accept})"
            ),
            ConfigError::MinAcceptBelowSampleSize { min_model_accept } => write!(
                f,
                "min_model_accept ({min_model_accept}) is below the minimal sample size (3)"
            ),
            ConfigError::NoShapes => write!(f, "no shape types configured"),
            ConfigError::ZeroIterations => {
                write!(f, "iteration counts must be non-zero")
            }
            ConfigError::ZeroNeighbors => write!(f, "neighbor count must be non-zero"),
            ConfigError::NonPositiveTolerance { name } => {
                write!(f, "{name} must be positive")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
