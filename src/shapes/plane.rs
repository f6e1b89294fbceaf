//! Plane model: generation from three point-normals, scatter-matrix refit,
//! normal-gated distance.

use super::FitParams;
use crate::cloud::{PointNormal, PointNormalCloud};
use nalgebra::{Matrix3, Unit, Vector3};
use serde::Serialize;

/// Plane in Hessian normal form `normal . x = offset`.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PlaneModel {
    pub normal: Unit<Vector3<f64>>,
    pub offset: f64,
}

impl PlaneModel {
    /// Signed distance from `p` to the plane.
    pub fn signed_distance(&self, p: &nalgebra::Point3<f64>) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    pub fn encode(&self) -> Vec<f64> {
        vec![self.normal.x, self.normal.y, self.normal.z, self.offset]
    }
}

pub fn decode(parameters: &[f64]) -> Option<PlaneModel> {
    let &[nx, ny, nz, offset] = parameters else {
        return None;
    };
    let normal = Unit::try_new(Vector3::new(nx, ny, nz), 1e-12)?;
    Some(PlaneModel { normal, offset })
}

/// Plane through the three sample positions. Fails on collinear samples or
/// when any sample normal deviates from the plane normal beyond the angle
/// tolerance.
pub fn generate(sample: [&PointNormal; 3], tol_angle_cos: f64) -> Option<PlaneModel> {
    let [a, b, c] = sample;
    let cross = (b.position - a.position).cross(&(c.position - a.position));
    let normal = Unit::try_new(cross, 1e-12)?;

    for s in sample {
        if normal.dot(&s.normal).abs() < tol_angle_cos {
            return None;
        }
    }

    Some(PlaneModel {
        offset: normal.dot(&a.position.coords),
        normal,
    })
}

/// Normal-gated distance. The point-to-plane vector is along the plane
/// normal, so the gate compares the two normals directly.
pub fn distance(model: &PlaneModel, node: &PointNormal, tol_angle_cos: f64) -> f64 {
    if model.normal.dot(&node.normal).abs() < tol_angle_cos {
        return super::REJECT_DISTANCE;
    }
    model.signed_distance(&node.position).abs()
}

/// Least-squares refit: eigenvector of the member scatter matrix with the
/// smallest eigenvalue, through the member centroid. Closed form, so the
/// iteration budget in `fit` is not consumed; the sign is kept consistent
/// with the previous model.
pub fn refine(
    model: &PlaneModel,
    cloud: &PointNormalCloud,
    members: &[u32],
    _fit: FitParams,
) -> PlaneModel {
    if members.len() < 3 {
        return *model;
    }

    let inv = 1.0 / members.len() as f64;
    let mut centroid = Vector3::zeros();
    for &i in members {
        centroid += cloud.node(i).position.coords;
    }
    centroid *= inv;

    let mut scatter = Matrix3::zeros();
    for &i in members {
        let d = cloud.node(i).position.coords - centroid;
        scatter += d * d.transpose();
    }

    let eigen = scatter.symmetric_eigen();
    let mut smallest = 0;
    for k in 1..3 {
        if eigen.eigenvalues[k] < eigen.eigenvalues[smallest] {
            smallest = k;
        }
    }
    let direction = eigen.eigenvectors.column(smallest).into_owned();
    let Some(mut normal) = Unit::try_new(direction, 1e-12) else {
        return *model;
    };
    if normal.dot(&model.normal) < 0.0 {
        normal = -normal;
    }

    PlaneModel {
        offset: normal.dot(&centroid),
        normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::REJECT_DISTANCE;
    use nalgebra::Point3;

    fn node(position: Point3<f64>, normal: Vector3<f64>) -> PointNormal {
        PointNormal {
            position,
            normal: Unit::new_normalize(normal),
            neighbors: Vec::new(),
        }
    }

    fn fit() -> FitParams {
        FitParams {
            max_iterations: 100,
            convergence: 1e-10,
        }
    }

    #[test]
    fn generates_the_z_plane_from_three_points() {
        let a = node(Point3::new(0.0, 0.0, 2.0), Vector3::z());
        let b = node(Point3::new(1.0, 0.0, 2.0), Vector3::z());
        let c = node(Point3::new(0.0, 1.0, 2.0), Vector3::z());
        let model = generate([&a, &b, &c], 0.95).expect("valid sample");
        assert!(model.normal.dot(&Vector3::z()).abs() > 1.0 - 1e-12);
        assert!((model.offset.abs() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn generation_survives_flipped_sample_normals() {
        let a = node(Point3::new(0.0, 0.0, 2.0), -Vector3::z());
        let b = node(Point3::new(1.0, 0.0, 2.0), Vector3::z());
        let c = node(Point3::new(0.0, 1.0, 2.0), -Vector3::z());
        assert!(generate([&a, &b, &c], 0.95).is_some());
    }

    #[test]
    fn collinear_samples_fail() {
        let a = node(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        let b = node(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        let c = node(Point3::new(2.0, 0.0, 0.0), Vector3::z());
        assert!(generate([&a, &b, &c], 0.95).is_none());
    }

    #[test]
    fn inconsistent_sample_normal_fails() {
        let a = node(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        let b = node(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        let c = node(Point3::new(0.0, 1.0, 0.0), Vector3::x());
        assert!(generate([&a, &b, &c], 0.95).is_none());
    }

    #[test]
    fn distance_gates_on_the_point_normal() {
        let model = PlaneModel {
            normal: Unit::new_unchecked(Vector3::z()),
            offset: 0.0,
        };
        let aligned = node(Point3::new(0.0, 0.0, 0.5), Vector3::z());
        assert!((distance(&model, &aligned, 0.9) - 0.5).abs() < 1e-12);

        let perpendicular = node(Point3::new(0.0, 0.0, 0.5), Vector3::x());
        assert_eq!(distance(&model, &perpendicular, 0.9), REJECT_DISTANCE);
    }

    #[test]
    fn refine_recovers_a_plane_from_noise_free_members() {
        let mut nodes = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                nodes.push(node(
                    Point3::new(i as f64 * 0.3, j as f64 * 0.3, 1.5),
                    Vector3::z(),
                ));
            }
        }
        let members: Vec<u32> = (0..nodes.len() as u32).collect();
        let cloud = PointNormalCloud::from_nodes(nodes);

        // start from a slightly tilted model
        let rough = PlaneModel {
            normal: Unit::new_normalize(Vector3::new(0.05, -0.03, 1.0)),
            offset: 1.45,
        };
        let refined = refine(&rough, &cloud, &members, fit());
        assert!(refined.normal.dot(&Vector3::z()) > 1.0 - 1e-9);
        assert!((refined.offset - 1.5).abs() < 1e-9);
    }
}
