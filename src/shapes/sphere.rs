//! Sphere model: two-point-normal generation, Gauss-Newton refinement,
//! normal-gated radial distance.

use super::FitParams;
use crate::cloud::{PointNormal, PointNormalCloud};
use crate::geom::closest_point_between_lines;
use nalgebra::{Matrix4, Point3, Vector3, Vector4};
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct SphereModel {
    pub center: Point3<f64>,
    pub radius: f64,
}

impl SphereModel {
    pub fn encode(&self) -> Vec<f64> {
        vec![self.center.x, self.center.y, self.center.z, self.radius]
    }
}

pub fn decode(parameters: &[f64]) -> Option<SphereModel> {
    let &[cx, cy, cz, radius] = parameters else {
        return None;
    };
    Some(SphereModel {
        center: Point3::new(cx, cy, cz),
        radius,
    })
}

/// Sphere from the first two point-normal lines: their closest point is the
/// center, the radius is the mean of the two center distances. The third
/// sample only validates. Fails when any radial distance deviates from the
/// radius beyond the distance tolerance, or when any radial direction
/// disagrees with the sample's own normal beyond the angle tolerance.
pub fn generate(
    sample: [&PointNormal; 3],
    tol_angle_cos: f64,
    tol_distance: f64,
) -> Option<SphereModel> {
    let [a, b, c] = sample;
    let center = closest_point_between_lines(&a.position, &a.normal, &b.position, &b.normal)?;

    let ra = (a.position - center).norm();
    let rb = (b.position - center).norm();
    let rc = (c.position - center).norm();
    let radius = (ra + rb) * 0.5;

    if (ra - radius).abs() > tol_distance
        || (rb - radius).abs() > tol_distance
        || (rc - radius).abs() > tol_distance
    {
        return None;
    }

    for s in sample {
        if !radial_agrees(&center, s, tol_angle_cos) {
            return None;
        }
    }

    Some(SphereModel { center, radius })
}

fn radial_agrees(center: &Point3<f64>, node: &PointNormal, tol_angle_cos: f64) -> bool {
    let radial = node.position - center;
    let len = radial.norm();
    if len < 1e-12 {
        return false;
    }
    (radial.dot(&node.normal) / len).abs() >= tol_angle_cos
}

/// Normal-gated distance to the sphere surface.
pub fn distance(model: &SphereModel, node: &PointNormal, tol_angle_cos: f64) -> f64 {
    let radial = node.position - model.center;
    let len = radial.norm();
    if len < 1e-12 {
        // at the center the radial direction is undefined
        return super::REJECT_DISTANCE;
    }
    if (radial.dot(&node.normal) / len).abs() < tol_angle_cos {
        return super::REJECT_DISTANCE;
    }
    (len - model.radius).abs()
}

/// Gauss-Newton over (center, radius), minimizing sum of
/// (|p - center| - radius)^2.
pub fn refine(
    model: &SphereModel,
    cloud: &PointNormalCloud,
    members: &[u32],
    fit: FitParams,
) -> SphereModel {
    if members.len() < 4 {
        return *model;
    }

    let mut center = model.center;
    let mut radius = model.radius;

    for _ in 0..fit.max_iterations {
        let mut jtj = Matrix4::zeros();
        let mut jtr = Vector4::zeros();
        let mut used = 0usize;
        for &i in members {
            let d = cloud.node(i).position - center;
            let len = d.norm();
            if len < 1e-12 {
                continue;
            }
            let g: Vector3<f64> = d / len;
            let row = Vector4::new(-g.x, -g.y, -g.z, -1.0);
            jtj += row * row.transpose();
            jtr += row * (len - radius);
            used += 1;
        }
        if used < 4 {
            break;
        }

        let Some(delta) = jtj.cholesky().map(|ch| ch.solve(&(-jtr))) else {
            break;
        };
        center += Vector3::new(delta.x, delta.y, delta.z);
        radius += delta.w;
        if delta.norm() < fit.convergence {
            break;
        }
    }

    SphereModel {
        center,
        radius: radius.abs(),
    }
}
