//! Cylinder model: cross-product axis generation, damped Gauss-Newton
//! refinement, normal-gated radial distance.

use super::FitParams;
use crate::cloud::{PointNormal, PointNormalCloud};
use crate::geom::closest_point_between_lines;
use nalgebra::{Point3, SMatrix, SVector, Unit, Vector3};
use serde::Serialize;

/// Two near-parallel seed normals leave the axis ill conditioned below this
/// cross-product magnitude.
const MIN_AXIS_NORM: f64 = 1e-8;

/// Infinite cylinder: a point on the axis, the unit axis direction and the
/// radius.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct CylinderModel {
    pub point: Point3<f64>,
    pub axis: Unit<Vector3<f64>>,
    pub radius: f64,
}

impl CylinderModel {
    /// Distance from `p` to the axis line.
    pub fn axis_distance(&self, p: &Point3<f64>) -> f64 {
        (p - self.point).cross(&self.axis).norm()
    }

    pub fn encode(&self) -> Vec<f64> {
        vec![
            self.point.x,
            self.point.y,
            self.point.z,
            self.axis.x,
            self.axis.y,
            self.axis.z,
            self.radius,
        ]
    }
}

pub fn decode(parameters: &[f64]) -> Option<CylinderModel> {
    let &[px, py, pz, ax, ay, az, radius] = parameters else {
        return None;
    };
    let axis = Unit::try_new(Vector3::new(ax, ay, az), 1e-12)?;
    Some(CylinderModel {
        point: Point3::new(px, py, pz),
        axis,
        radius,
    })
}

/// Cylinder from two point-normals plus a validation point. The axis runs
/// along cross(n0, n1); with near-parallel normals the cross product
/// collapses and the sample fails. The axis point is the closest point
/// between the two normal lines, the radius the mean of the first two axis
/// distances. All three axis distances must sit within the distance
/// tolerance, and the third normal must stay perpendicular to the axis
/// within the angle tolerance (the first two are perpendicular by
/// construction).
pub fn generate(
    sample: [&PointNormal; 3],
    tol_axis_cos: f64,
    tol_distance: f64,
) -> Option<CylinderModel> {
    let [a, b, c] = sample;

    let cross = a.normal.cross(&b.normal);
    if cross.norm() < MIN_AXIS_NORM {
        return None;
    }
    let axis = Unit::new_normalize(cross);
    let point = closest_point_between_lines(&a.position, &a.normal, &b.position, &b.normal)?;

    let model = CylinderModel {
        point,
        axis,
        radius: 0.0,
    };
    let ra = model.axis_distance(&a.position);
    let rb = model.axis_distance(&b.position);
    let rc = model.axis_distance(&c.position);
    let radius = (ra + rb) * 0.5;

    if (ra - radius).abs() > tol_distance
        || (rb - radius).abs() > tol_distance
        || (rc - radius).abs() > tol_distance
    {
        return None;
    }

    // surface normals must be perpendicular to the axis
    if axis.dot(&c.normal).abs() > tol_axis_cos {
        return None;
    }

    Some(CylinderModel {
        point,
        axis,
        radius,
    })
}

/// Normal-gated distance to the cylinder surface. The gate compares the
/// point normal against the radial component of the point-to-axis vector.
pub fn distance(model: &CylinderModel, node: &PointNormal, tol_angle_cos: f64) -> f64 {
    let w = node.position - model.point;
    let radial = w - model.axis.into_inner() * w.dot(&model.axis);
    let len = radial.norm();
    if len < 1e-12 {
        // on the axis the radial direction is undefined
        return super::REJECT_DISTANCE;
    }
    if (radial.dot(&node.normal) / len).abs() < tol_angle_cos {
        return super::REJECT_DISTANCE;
    }
    (len - model.radius).abs()
}

/// Damped Gauss-Newton over (axis point, axis direction, radius),
/// minimizing sum of (|(p - a) x d| - r)^2 with the axis renormalized and
/// re-anchored to the member centroid each step (the parametrization has two
/// gauge freedoms, hence the damping).
pub fn refine(
    model: &CylinderModel,
    cloud: &PointNormalCloud,
    members: &[u32],
    fit: FitParams,
) -> CylinderModel {
    if members.len() < 7 {
        return *model;
    }

    let mut centroid = Vector3::zeros();
    for &i in members {
        centroid += cloud.node(i).position.coords;
    }
    centroid /= members.len() as f64;

    let mut point = model.point;
    let mut axis = model.axis.into_inner();
    let mut radius = model.radius;

    for _ in 0..fit.max_iterations {
        let mut jtj: SMatrix<f64, 7, 7> = SMatrix::zeros();
        let mut jtr: SVector<f64, 7> = SVector::zeros();
        let mut used = 0usize;

        for &i in members {
            let w = cloud.node(i).position - point;
            let v = w.cross(&axis);
            let len = v.norm();
            if len < 1e-12 {
                continue;
            }
            let u = v / len;
            let grad_point = -axis.cross(&u);
            let grad_axis = u.cross(&w);

            let mut row: SVector<f64, 7> = SVector::zeros();
            row[0] = grad_point.x;
            row[1] = grad_point.y;
            row[2] = grad_point.z;
            row[3] = grad_axis.x;
            row[4] = grad_axis.y;
            row[5] = grad_axis.z;
            row[6] = -1.0;

            jtj += row * row.transpose();
            jtr += row * (len - radius);
            used += 1;
        }
        if used < 7 {
            break;
        }

        // small diagonal damping absorbs the gauge directions
        let damping = (jtj.trace() / 7.0).max(1.0) * 1e-10;
        for k in 0..7 {
            jtj[(k, k)] += damping;
        }

        let Some(delta) = jtj.cholesky().map(|ch| ch.solve(&(-jtr))) else {
            break;
        };
        point += Vector3::new(delta[0], delta[1], delta[2]);
        axis += Vector3::new(delta[3], delta[4], delta[5]);
        let axis_norm = axis.norm();
        if axis_norm < 1e-12 {
            break;
        }
        axis /= axis_norm;
        radius += delta[6];

        // re-anchor the axis point next to the centroid
        point += axis * (centroid - point.coords).dot(&axis);

        if delta.norm() < fit.convergence {
            break;
        }
    }

    CylinderModel {
        point,
        axis: Unit::new_unchecked(axis),
        radius: radius.abs(),
    }
}
