//! Point-normal cloud container and neighbor-graph construction.
//!
//! The detector operates on a [`PointNormalCloud`]: positions, unit normals
//! and a k-nearest-neighbor graph built once up front. Neighbor lists are
//! immutable for the lifetime of the cloud; the match-set search keeps its
//! own visited markers in a side table so the cloud itself is never mutated
//! by a detection run.

use crate::geom::Cube;
use log::debug;
use nalgebra::{Point3, Unit, Vector3};

/// One cloud point: position, unit surface normal and the indices of its
/// nearest neighbors.
#[derive(Clone, Debug)]
pub struct PointNormal {
    pub position: Point3<f64>,
    pub normal: Unit<Vector3<f64>>,
    pub neighbors: Vec<u32>,
}

/// Errors raised while assembling a cloud.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloudError {
    LengthMismatch { points: usize, normals: usize },
}

impl std::fmt::Display for CloudError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudError::LengthMismatch { points, normals } => {
                write!(f, "point/normal count mismatch ({points} vs {normals})")
            }
        }
    }
}

impl std::error::Error for CloudError {}

/// Unorganized point cloud with per-point normals and a neighbor graph.
#[derive(Clone, Debug, Default)]
pub struct PointNormalCloud {
    nodes: Vec<PointNormal>,
}

impl PointNormalCloud {
    /// Builds the cloud and its k-nearest-neighbor graph.
    ///
    /// Normals are normalized on the way in; zero normals are replaced by an
    /// arbitrary unit vector rather than rejected, matching the tolerant
    /// behaviour expected from noisy normal estimation upstream.
    pub fn build(
        positions: Vec<Point3<f64>>,
        normals: Vec<Vector3<f64>>,
        k: usize,
    ) -> Result<Self, CloudError> {
        if positions.len() != normals.len() {
            return Err(CloudError::LengthMismatch {
                points: positions.len(),
                normals: normals.len(),
            });
        }

        // bucket size must exceed the number of points sharing a coordinate
        // on one axis, or kiddo panics; flat clouds make the default of 32
        // far too small
        let mut kdtree: kiddo::float::kdtree::KdTree<f64, u64, 3, 1024, u32> =
            kiddo::float::kdtree::KdTree::new();
        for (i, p) in positions.iter().enumerate() {
            kdtree.add(&[p.x, p.y, p.z], i as u64);
        }

        let mut nodes = Vec::with_capacity(positions.len());
        for (i, (p, n)) in positions.iter().zip(normals.iter()).enumerate() {
            // +1 because the query point itself comes back first
            let found = kdtree.nearest_n::<kiddo::SquaredEuclidean>(&[p.x, p.y, p.z], k + 1);
            let neighbors: Vec<u32> = found
                .into_iter()
                .map(|nb| nb.item as u32)
                .filter(|&idx| idx as usize != i)
                .take(k)
                .collect();
            let normal = Unit::try_new(*n, 1e-12)
                .unwrap_or_else(|| Unit::new_unchecked(Vector3::new(1.0, 0.0, 0.0)));
            nodes.push(PointNormal {
                position: *p,
                normal,
                neighbors,
            });
        }
        debug!(
            "PointNormalCloud::build points={} k={}",
            nodes.len(),
            k
        );
        Ok(Self { nodes })
    }

    /// Wraps nodes whose neighbor lists were produced elsewhere.
    pub fn from_nodes(nodes: Vec<PointNormal>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, index: u32) -> &PointNormal {
        &self.nodes[index as usize]
    }

    pub fn nodes(&self) -> &[PointNormal] {
        &self.nodes
    }

    /// Minimal enclosing cube of the cloud, `None` when empty.
    pub fn bounding_cube(&self) -> Option<Cube> {
        let positions: Vec<Point3<f64>> = self.nodes.iter().map(|n| n.position).collect();
        Cube::enclosing(&positions)
    }
}
