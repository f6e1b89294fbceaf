//! Per-primitive algorithm bundles.
//!
//! Each supported primitive (plane, sphere, cylinder) contributes four
//! operations over point-normal data:
//!
//! - **generate**: minimal-sample model estimation from 3 point-normals,
//!   returning `None` for degenerate or inconsistent samples,
//! - **refine**: iterative fitting against a full inlier set,
//! - **distance**: normal-gated point-to-surface distance; points whose
//!   normal disagrees with the model get the [`REJECT_DISTANCE`] sentinel so
//!   the inlier test downstream stays a single numeric comparison,
//! - **codec**: encode/decode of model parameters to a flat vector.
//!
//! The supported shape set is fixed and known at compile time, so dispatch
//! happens over the closed [`ShapeModel`] sum type rather than through trait
//! objects.

pub mod cylinder;
pub mod plane;
pub mod sphere;

pub use cylinder::CylinderModel;
pub use plane::PlaneModel;
pub use sphere::SphereModel;

use crate::cloud::{PointNormal, PointNormalCloud};
use crate::types::ShapeType;
use serde::Serialize;

/// Sentinel distance for points failing the normal-consistency gate:
/// definitely not an inlier under any finite threshold.
pub const REJECT_DISTANCE: f64 = f64::MAX;

/// Fitted parameters of one candidate or accepted shape.
#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeModel {
    Plane(PlaneModel),
    Sphere(SphereModel),
    Cylinder(CylinderModel),
}

impl ShapeModel {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            ShapeModel::Plane(_) => ShapeType::Plane,
            ShapeModel::Sphere(_) => ShapeType::Sphere,
            ShapeModel::Cylinder(_) => ShapeType::Cylinder,
        }
    }

    /// Flat parameter vector: plane `[nx, ny, nz, d]`, sphere
    /// `[cx, cy, cz, r]`, cylinder `[px, py, pz, ax, ay, az, r]`.
    pub fn encode(&self) -> Vec<f64> {
        match self {
            ShapeModel::Plane(m) => m.encode(),
            ShapeModel::Sphere(m) => m.encode(),
            ShapeModel::Cylinder(m) => m.encode(),
        }
    }

    /// Inverse of [`ShapeModel::encode`]. Returns `None` on a wrong-length
    /// vector or a zero direction.
    pub fn decode(shape: ShapeType, parameters: &[f64]) -> Option<ShapeModel> {
        match shape {
            ShapeType::Plane => plane::decode(parameters).map(ShapeModel::Plane),
            ShapeType::Sphere => sphere::decode(parameters).map(ShapeModel::Sphere),
            ShapeType::Cylinder => cylinder::decode(parameters).map(ShapeModel::Cylinder),
        }
    }
}

/// Iteration budget shared by the per-shape refiners.
#[derive(Clone, Copy, Debug)]
pub struct FitParams {
    /// Hard cap on refinement iterations.
    pub max_iterations: usize,
    /// Stop once the parameter delta falls below this.
    pub convergence: f64,
}

/// Binds a primitive type to its tolerances and inlier threshold.
///
/// Stateless; precomputes the cosine thresholds once so the hot distance
/// path compares cosines directly instead of calling `acos`.
#[derive(Clone, Copy, Debug)]
pub struct ShapeDescription {
    pub shape: ShapeType,
    /// cos(tolAngle); gate between a point normal and the model surface
    /// normal direction.
    pub tol_angle_cos: f64,
    /// cos(pi/2 - tolAngle); cylinder-only check of a sample normal against
    /// the axis, which normals should be perpendicular to.
    pub tol_axis_cos: f64,
    /// Distance tolerance validating minimal-sample models.
    pub tol_distance: f64,
    /// Inlier acceptance distance used by match-set expansion.
    pub fit_threshold: f64,
}

impl ShapeDescription {
    pub fn new(shape: ShapeType, tol_angle: f64, tol_distance: f64, fit_threshold: f64) -> Self {
        Self {
            shape,
            tol_angle_cos: tol_angle.cos(),
            tol_axis_cos: (std::f64::consts::FRAC_PI_2 - tol_angle).cos(),
            tol_distance,
            fit_threshold,
        }
    }

    /// Minimal sample size; 3 for every supported primitive.
    pub fn minimum_points(&self) -> usize {
        3
    }

    /// Attempts to estimate a model from a minimal sample. `None` signals an
    /// unproductive sample (degenerate geometry or tolerance violation), not
    /// an error.
    pub fn generate(&self, sample: [&PointNormal; 3]) -> Option<ShapeModel> {
        match self.shape {
            ShapeType::Plane => {
                plane::generate(sample, self.tol_angle_cos).map(ShapeModel::Plane)
            }
            ShapeType::Sphere => {
                sphere::generate(sample, self.tol_angle_cos, self.tol_distance)
                    .map(ShapeModel::Sphere)
            }
            ShapeType::Cylinder => {
                cylinder::generate(sample, self.tol_axis_cos, self.tol_distance)
                    .map(ShapeModel::Cylinder)
            }
        }
    }

    /// Normal-gated point-to-surface distance. A model of the wrong variant
    /// yields the sentinel.
    pub fn distance(&self, model: &ShapeModel, node: &PointNormal) -> f64 {
        match (self.shape, model) {
            (ShapeType::Plane, ShapeModel::Plane(m)) => {
                plane::distance(m, node, self.tol_angle_cos)
            }
            (ShapeType::Sphere, ShapeModel::Sphere(m)) => {
                sphere::distance(m, node, self.tol_angle_cos)
            }
            (ShapeType::Cylinder, ShapeModel::Cylinder(m)) => {
                cylinder::distance(m, node, self.tol_angle_cos)
            }
            _ => {
                debug_assert!(false, "shape/model variant mismatch");
                REJECT_DISTANCE
            }
        }
    }

    /// Refines a model against its full inlier set. Falls back to the input
    /// model when the set is too small or fitting degenerates.
    pub fn refine(
        &self,
        model: &ShapeModel,
        cloud: &PointNormalCloud,
        members: &[u32],
        fit: FitParams,
    ) -> ShapeModel {
        match model {
            ShapeModel::Plane(m) => ShapeModel::Plane(plane::refine(m, cloud, members, fit)),
            ShapeModel::Sphere(m) => ShapeModel::Sphere(sphere::refine(m, cloud, members, fit)),
            ShapeModel::Cylinder(m) => {
                ShapeModel::Cylinder(cylinder::refine(m, cloud, members, fit))
            }
        }
    }
}
