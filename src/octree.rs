//! Arena-allocated octree over cloud point indices.
//!
//! Cells are stored contiguously and reference each other through integer
//! handles, so the tree carries no parent/child ownership cycles. The tree
//! holds point *indices* only; positions stay in the cloud. A cell splits
//! into 8 children once its point count exceeds the configured threshold,
//! unless its extent can no longer be halved meaningfully. Leaves, the
//! "smallest" cells, are what the detector samples from: three points drawn
//! from one small cell are far more likely to lie on the same surface than
//! three points drawn uniformly from the whole cloud.

use crate::cloud::PointNormalCloud;
use crate::geom::Cube;

/// A cell only splits while its edge stays above this fraction of the root
/// edge. Guards against unbounded recursion on duplicate points.
const MIN_EDGE_FRACTION: f64 = 1e-6;

/// One octree cell. `children` is `None` for leaves; `points` is only
/// meaningful at leaves (interior cells hand their list down on split).
#[derive(Clone, Debug)]
pub struct OctreeCell {
    pub cube: Cube,
    pub children: Option<[u32; 8]>,
    pub points: Vec<u32>,
}

impl OctreeCell {
    pub fn is_smallest(&self) -> bool {
        self.children.is_none()
    }
}

/// Octree built once per detection pass over the active working set.
#[derive(Clone, Debug)]
pub struct Octree {
    cells: Vec<OctreeCell>,
}

impl Octree {
    /// Builds the hierarchy in one pass over `indices` (cloud point handles).
    ///
    /// `cube` must contain every referenced point; use
    /// [`Cube::enclosing`](crate::geom::Cube::enclosing) or
    /// [`PointNormalCloud::bounding_cube`] when the caller has no prior
    /// bounds. Points outside the cube are clamped into the root rather than
    /// dropped, so the tree always accounts for every input index.
    pub fn build(
        cloud: &PointNormalCloud,
        indices: Vec<u32>,
        cube: Cube,
        split_threshold: usize,
    ) -> Self {
        let min_edge = cube.edge * MIN_EDGE_FRACTION;
        let mut cells = vec![OctreeCell {
            cube,
            children: None,
            points: indices,
        }];

        let mut stack = vec![0usize];
        while let Some(cell_index) = stack.pop() {
            let (cell_cube, count) = {
                let cell = &cells[cell_index];
                (cell.cube, cell.points.len())
            };
            if count <= split_threshold || cell_cube.edge * 0.5 < min_edge {
                continue;
            }

            let points = std::mem::take(&mut cells[cell_index].points);
            let center = cell_cube.center();
            let mut buckets: [Vec<u32>; 8] = Default::default();
            for index in points {
                // clamp out-of-cube points into the nearest octant
                let octant = Cube::octant_of(&center, &cloud.node(index).position);
                buckets[octant].push(index);
            }

            let first_child = cells.len() as u32;
            let mut children = [0u32; 8];
            for (octant, bucket) in buckets.into_iter().enumerate() {
                let child_index = first_child + octant as u32;
                children[octant] = child_index;
                if bucket.len() > split_threshold {
                    stack.push(child_index as usize);
                }
                cells.push(OctreeCell {
                    cube: cell_cube.octant(octant),
                    children: None,
                    points: bucket,
                });
            }
            cells[cell_index].children = Some(children);
        }

        Self { cells }
    }

    pub fn cell(&self, index: u32) -> &OctreeCell {
        &self.cells[index as usize]
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Handles of all smallest (leaf) cells.
    pub fn smallest_cells(&self) -> Vec<u32> {
        (0..self.cells.len() as u32)
            .filter(|&i| self.cells[i as usize].is_smallest())
            .collect()
    }

    /// Handles of leaves holding at least `min_points` points, the cells the
    /// sampler may draw from. Smaller leaves are skipped, not deleted.
    pub fn sampling_cells(&self, min_points: usize) -> Vec<u32> {
        (0..self.cells.len() as u32)
            .filter(|&i| {
                let cell = &self.cells[i as usize];
                cell.is_smallest() && cell.points.len() >= min_points
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloud::PointNormal;
    use nalgebra::{Point3, Unit, Vector3};

    fn cloud_of(positions: Vec<Point3<f64>>) -> PointNormalCloud {
        let nodes = positions
            .into_iter()
            .map(|position| PointNormal {
                position,
                normal: Unit::new_unchecked(Vector3::z()),
                neighbors: Vec::new(),
            })
            .collect();
        PointNormalCloud::from_nodes(nodes)
    }

    fn dense_cloud(n_per_axis: usize) -> PointNormalCloud {
        let mut positions = Vec::new();
        for i in 0..n_per_axis {
            for j in 0..n_per_axis {
                for k in 0..n_per_axis {
                    positions.push(Point3::new(i as f64, j as f64, k as f64));
                }
            }
        }
        cloud_of(positions)
    }

    #[test]
    fn leaves_respect_the_split_threshold() {
        let cloud = dense_cloud(6);
        let cube = cloud.bounding_cube().unwrap();
        let indices: Vec<u32> = (0..cloud.len() as u32).collect();
        let tree = Octree::build(&cloud, indices, cube, 10);
        for handle in tree.smallest_cells() {
            let cell = tree.cell(handle);
            assert!(
                cell.points.len() <= 10,
                "leaf holds {} points",
                cell.points.len()
            );
        }
    }

    #[test]
    fn leaves_partition_the_input_indices() {
        let cloud = dense_cloud(5);
        let cube = cloud.bounding_cube().unwrap();
        let indices: Vec<u32> = (0..cloud.len() as u32).collect();
        let tree = Octree::build(&cloud, indices.clone(), cube, 8);

        let mut seen = vec![false; cloud.len()];
        for handle in tree.smallest_cells() {
            for &p in &tree.cell(handle).points {
                assert!(!seen[p as usize], "index {p} appears in two leaves");
                seen[p as usize] = true;
            }
        }
        assert!(seen.iter().all(|&s| s), "some indices missing from leaves");
    }

    #[test]
    fn interior_cells_hold_no_points() {
        let cloud = dense_cloud(5);
        let cube = cloud.bounding_cube().unwrap();
        let indices: Vec<u32> = (0..cloud.len() as u32).collect();
        let tree = Octree::build(&cloud, indices, cube, 8);
        for i in 0..tree.len() as u32 {
            let cell = tree.cell(i);
            if cell.children.is_some() {
                assert!(cell.points.is_empty());
            }
        }
    }

    #[test]
    fn small_input_stays_a_single_leaf() {
        let cloud = cloud_of(vec![Point3::origin(), Point3::new(1.0, 1.0, 1.0)]);
        let cube = cloud.bounding_cube().unwrap();
        let tree = Octree::build(&cloud, vec![0, 1], cube, 10);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.smallest_cells(), vec![0]);
    }

    #[test]
    fn duplicate_points_terminate_via_the_edge_floor() {
        let positions = vec![Point3::new(0.5, 0.5, 0.5); 64];
        let cloud = cloud_of(positions);
        let cube = Cube::new(Point3::origin(), 1.0);
        let indices: Vec<u32> = (0..64).collect();
        // threshold below the duplicate count forces repeated splits until
        // the edge floor stops them
        let tree = Octree::build(&cloud, indices, cube, 4);
        let total: usize = tree
            .smallest_cells()
            .iter()
            .map(|&h| tree.cell(h).points.len())
            .sum();
        assert_eq!(total, 64);
    }

    #[test]
    fn sampling_cells_skip_underfilled_leaves() {
        let cloud = dense_cloud(4);
        let cube = cloud.bounding_cube().unwrap();
        let indices: Vec<u32> = (0..cloud.len() as u32).collect();
        let tree = Octree::build(&cloud, indices, cube, 8);
        for handle in tree.sampling_cells(3) {
            assert!(tree.cell(handle).points.len() >= 3);
        }
    }
}
