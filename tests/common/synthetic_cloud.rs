//! Synthetic surface samplers with exact analytic normals.

use nalgebra::{Point3, Unit, Vector3};
use rand::rngs::StdRng;
use rand::Rng;

/// Two unit vectors spanning the plane orthogonal to `axis`.
pub fn orthonormal_pair(axis: &Unit<Vector3<f64>>) -> (Vector3<f64>, Vector3<f64>) {
    let helper = if axis.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let u = axis.cross(&helper).normalize();
    let v = axis.cross(&u);
    (u, v)
}

/// Uniform samples on a square planar patch centered at `center`.
pub fn plane_patch(
    rng: &mut StdRng,
    center: Point3<f64>,
    normal: Vector3<f64>,
    half_extent: f64,
    count: usize,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let normal = Unit::new_normalize(normal);
    let (u, v) = orthonormal_pair(&normal);
    let mut points = Vec::with_capacity(count);
    for _ in 0..count {
        let a: f64 = rng.gen_range(-half_extent..half_extent);
        let b: f64 = rng.gen_range(-half_extent..half_extent);
        points.push(center + u * a + v * b);
    }
    let normals = vec![normal.into_inner(); count];
    (points, normals)
}

/// Uniform samples on a full sphere; normals point outward.
pub fn sphere_surface(
    rng: &mut StdRng,
    center: Point3<f64>,
    radius: f64,
    count: usize,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let mut points = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    for _ in 0..count {
        let z: f64 = rng.gen_range(-1.0..1.0);
        let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let r = (1.0 - z * z).sqrt();
        let dir = Vector3::new(r * theta.cos(), r * theta.sin(), z);
        points.push(center + dir * radius);
        normals.push(dir);
    }
    (points, normals)
}

/// Uniform samples on a finite open cylinder; normals point radially outward.
pub fn cylinder_surface(
    rng: &mut StdRng,
    axis_point: Point3<f64>,
    axis: Vector3<f64>,
    radius: f64,
    half_length: f64,
    count: usize,
) -> (Vec<Point3<f64>>, Vec<Vector3<f64>>) {
    let axis = Unit::new_normalize(axis);
    let (u, v) = orthonormal_pair(&axis);
    let mut points = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    for _ in 0..count {
        let theta: f64 = rng.gen_range(0.0..std::f64::consts::TAU);
        let h: f64 = rng.gen_range(-half_length..half_length);
        let dir = u * theta.cos() + v * theta.sin();
        points.push(axis_point + axis.into_inner() * h + dir * radius);
        normals.push(dir);
    }
    (points, normals)
}
