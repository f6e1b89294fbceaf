//! Reusable buffers amortising allocations inside the RANSAC loop.
//!
//! Match-set expansion runs up to thousands of times per detection; the
//! candidate and best-set buffers are recycled across iterations instead of
//! reallocated, the Rust rendition of the reference design's model pool.

/// Scratch buffers owned by one in-flight detection run.
#[derive(Clone, Debug, Default)]
pub(crate) struct DetectorWorkspace {
    /// Minimal-sample indices drawn from an octree leaf.
    pub sample: Vec<u32>,
    /// Match set of the candidate under evaluation.
    pub candidate: Vec<u32>,
    /// Largest match set seen so far in the current search.
    pub best: Vec<u32>,
    /// Distance-filtered seeds for the post-refinement re-expansion.
    pub seeds: Vec<u32>,
}

impl DetectorWorkspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the current candidate the best set without copying.
    pub fn promote_candidate(&mut self) {
        std::mem::swap(&mut self.best, &mut self.candidate);
    }

    pub fn clear(&mut self) {
        self.sample.clear();
        self.candidate.clear();
        self.best.clear();
        self.seeds.clear();
    }
}
