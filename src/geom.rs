//! Small 3-D geometry helpers shared across the detector.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Lines are treated as parallel below this denominator value.
const PARALLEL_EPS: f64 = 1e-12;

/// Axis-aligned cube given by its minimum corner and edge length.
///
/// Containment is half-open: a point lies inside when `min <= p < min + edge`
/// on every axis. [`Cube::enclosing`] pads the edge so that boundary points of
/// the input always satisfy the strict upper bound.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cube {
    pub min: Point3<f64>,
    pub edge: f64,
}

impl Cube {
    pub fn new(min: Point3<f64>, edge: f64) -> Self {
        Self { min, edge }
    }

    pub fn center(&self) -> Point3<f64> {
        let h = self.edge * 0.5;
        Point3::new(self.min.x + h, self.min.y + h, self.min.z + h)
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        p.x >= self.min.x
            && p.y >= self.min.y
            && p.z >= self.min.z
            && p.x < self.min.x + self.edge
            && p.y < self.min.y + self.edge
            && p.z < self.min.z + self.edge
    }

    /// Child octant. Bit 0 selects the upper half along x, bit 1 along y,
    /// bit 2 along z.
    pub fn octant(&self, index: usize) -> Cube {
        let h = self.edge * 0.5;
        let min = Point3::new(
            self.min.x + if index & 1 != 0 { h } else { 0.0 },
            self.min.y + if index & 2 != 0 { h } else { 0.0 },
            self.min.z + if index & 4 != 0 { h } else { 0.0 },
        );
        Cube { min, edge: h }
    }

    /// Octant index of `p` relative to `center`, consistent with
    /// [`Cube::octant`]. Points exactly on a splitting plane go to the upper
    /// half.
    pub fn octant_of(center: &Point3<f64>, p: &Point3<f64>) -> usize {
        let mut index = 0;
        if p.x >= center.x {
            index |= 1;
        }
        if p.y >= center.y {
            index |= 2;
        }
        if p.z >= center.z {
            index |= 4;
        }
        index
    }

    /// Minimal enclosing cube of a point set, centred on the bounding box.
    ///
    /// Returns `None` for an empty input. The edge receives a small relative
    /// padding so every input point passes the half-open containment test.
    pub fn enclosing(points: &[Point3<f64>]) -> Option<Cube> {
        let first = points.first()?;
        let mut lo = *first;
        let mut hi = *first;
        for p in &points[1..] {
            lo.x = lo.x.min(p.x);
            lo.y = lo.y.min(p.y);
            lo.z = lo.z.min(p.z);
            hi.x = hi.x.max(p.x);
            hi.y = hi.y.max(p.y);
            hi.z = hi.z.max(p.z);
        }
        let extent = (hi.x - lo.x).max(hi.y - lo.y).max(hi.z - lo.z);
        let edge = (extent * (1.0 + 1e-9)).max(1e-9);
        let half = edge * 0.5;
        let center = Point3::new(
            (lo.x + hi.x) * 0.5,
            (lo.y + hi.y) * 0.5,
            (lo.z + hi.z) * 0.5,
        );
        Some(Cube {
            min: Point3::new(center.x - half, center.y - half, center.z - half),
            edge,
        })
    }
}

/// Closest point between the lines `a + t*u` and `b + s*v`, returned as the
/// midpoint of the shortest connecting segment.
///
/// Returns `None` when the lines are near parallel and the closest point is
/// ill conditioned.
pub fn closest_point_between_lines(
    a: &Point3<f64>,
    u: &Vector3<f64>,
    b: &Point3<f64>,
    v: &Vector3<f64>,
) -> Option<Point3<f64>> {
    let w = a - b;
    let uu = u.dot(u);
    let uv = u.dot(v);
    let vv = v.dot(v);
    let uw = u.dot(&w);
    let vw = v.dot(&w);

    let denom = uu * vv - uv * uv;
    if denom.abs() < PARALLEL_EPS {
        return None;
    }
    let t = (uv * vw - vv * uw) / denom;
    let s = (uu * vw - uv * uw) / denom;

    let pa = a + u * t;
    let pb = b + v * s;
    Some(Point3::from((pa.coords + pb.coords) * 0.5))
}
