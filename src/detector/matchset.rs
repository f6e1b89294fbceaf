//! Connectivity-constrained match-set expansion.
//!
//! Given seed points already believed to match a candidate model, the finder
//! grows the full inlier set by flood fill over the cloud's neighbor graph:
//! a point joins only when it is graph-reachable from a seed through
//! neighbors that each pass the distance gate. A plain global distance
//! threshold would merge coplanar but physically disjoint patches (two
//! parallel walls, say) into one shape; connectivity keeps them apart.
//!
//! Visited tracking uses a monotonically increasing generation marker in a
//! side table: each search bumps the counter and compares stamps against it,
//! so the table is never cleared between the thousands of expansions one
//! RANSAC run performs. Not re-entrant; callers serialize runs.

use crate::cloud::PointNormalCloud;
use crate::shapes::{ShapeDescription, ShapeModel};

/// Reusable match-set search state.
#[derive(Clone, Debug, Default)]
pub struct MatchSetFinder {
    markers: Vec<u64>,
    generation: u64,
    open: Vec<u32>,
}

impl MatchSetFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes the marker table for a cloud of `len` points and restarts the
    /// generation counter. Must be called before the first search on a new
    /// cloud.
    pub fn reset(&mut self, len: usize) {
        self.markers.clear();
        self.markers.resize(len, 0);
        self.generation = 0;
        self.open.clear();
    }

    /// Expands `seeds` into `out` over the neighbor graph.
    ///
    /// Seeds enter the output unconditionally (the caller vouches for them);
    /// their unvisited neighbors are distance-tested against `model` and
    /// pushed when at or below `threshold`. Points where `active` is false
    /// are stamped but never expanded or emitted, which is how the driver
    /// keeps already-claimed points out of later shapes. Traversal order is
    /// LIFO; any complete order yields the same set.
    pub fn select(
        &mut self,
        cloud: &PointNormalCloud,
        description: &ShapeDescription,
        model: &ShapeModel,
        threshold: f64,
        active: &[bool],
        seeds: &[u32],
        out: &mut Vec<u32>,
    ) {
        debug_assert_eq!(self.markers.len(), cloud.len());
        debug_assert!(self.open.is_empty());
        out.clear();

        self.generation += 1;
        let generation = self.generation;

        for &seed in seeds {
            if self.markers[seed as usize] != generation {
                self.markers[seed as usize] = generation;
                self.open.push(seed);
            }
        }

        while let Some(index) = self.open.pop() {
            out.push(index);
            for &neighbor in &cloud.node(index).neighbors {
                if self.markers[neighbor as usize] == generation {
                    continue;
                }
                self.markers[neighbor as usize] = generation;
                if !active[neighbor as usize] {
                    continue;
                }
                if description.distance(model, cloud.node(neighbor)) <= threshold {
                    self.open.push(neighbor);
                }
            }
        }
    }
}
