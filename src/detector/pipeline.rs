//! RANSAC driver orchestrating octree-biased sampling, match-set expansion
//! and greedy shape acceptance.
//!
//! One `detect` call runs to completion synchronously:
//!
//! 1. build the octree over the active working set,
//! 2. repeatedly draw a minimal sample from a random leaf, generate a
//!    candidate per configured shape type, expand it through the neighbor
//!    graph and keep the largest match set; every new best extends the
//!    remaining budget by the configured increment, clamped to the absolute
//!    iteration cap,
//! 3. once the budget runs out, refine the best candidate against its match
//!    set, re-expand against the refined model (membership can shift at the
//!    boundary), emit the shape and strip its members from the working set,
//! 4. repeat from 1 until no candidate reaches the minimum accept count or
//!    too few points remain.
//!
//! All sampling draws from one seeded generator: identical seed, parameters
//! and cloud reproduce identical results. State is exclusively owned by the
//! run; concurrent detections need separate detectors.
//!
//! ```no_run
//! use shape_detector::{DetectorParams, PointNormalCloud, ShapeDetector};
//! # fn example(cloud: PointNormalCloud) {
//! let mut detector = ShapeDetector::new(DetectorParams::default()).unwrap();
//! let result = detector.detect(&cloud, None);
//! println!("shapes={} unmatched={}", result.shapes.len(), result.unmatched.len());
//! # }
//! ```

use super::matchset::MatchSetFinder;
use super::params::{ConfigError, DetectorParams};
use super::workspace::DetectorWorkspace;
use crate::cloud::PointNormalCloud;
use crate::geom::Cube;
use crate::octree::Octree;
use crate::shapes::{ShapeDescription, ShapeModel};
use crate::types::{DetectedShape, DetectionResult};
use log::debug;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

/// Minimal sample size shared by all supported primitives.
const SAMPLE_SIZE: usize = 3;

/// Shape detector. Construct once, call [`ShapeDetector::detect`] per cloud.
pub struct ShapeDetector {
    params: DetectorParams,
    descriptions: Vec<ShapeDescription>,
    finder: MatchSetFinder,
    workspace: DetectorWorkspace,
}

impl ShapeDetector {
    /// Validates the configuration and builds the detector. Inconsistent
    /// parameters fail here, never inside a detection run.
    pub fn new(params: DetectorParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let descriptions = params.descriptions();
        Ok(Self {
            params,
            descriptions,
            finder: MatchSetFinder::new(),
            workspace: DetectorWorkspace::new(),
        })
    }

    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Detects shapes in `cloud`. When `cube` is omitted the minimal
    /// enclosing cube of the cloud is used; a supplied cube need not contain
    /// every point (outliers are clamped into the octree root).
    pub fn detect(&mut self, cloud: &PointNormalCloud, cube: Option<Cube>) -> DetectionResult {
        let start = Instant::now();
        let mut result = DetectionResult::default();

        let point_count = cloud.len();
        let Some(cube) = cube.or_else(|| cloud.bounding_cube()) else {
            return result;
        };
        debug!(
            "ShapeDetector::detect start points={} shapes={:?} seed={:#x}",
            point_count, self.params.shapes, self.params.seed
        );

        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut active = vec![true; point_count];
        let mut active_count = point_count;
        self.finder.reset(point_count);
        self.workspace.clear();

        while active_count >= self.params.min_model_accept {
            let indices: Vec<u32> =
                (0..point_count as u32).filter(|&i| active[i as usize]).collect();
            let octree = Octree::build(cloud, indices, cube, self.params.octree_split);
            let leaves = octree.sampling_cells(SAMPLE_SIZE);
            if leaves.is_empty() {
                debug!("ShapeDetector::detect no sampleable octree leaves left");
                break;
            }

            let (iterations, best) = self.run_search(cloud, &octree, &leaves, &active, &mut rng);
            result.iterations += iterations;

            let Some((description_index, model)) = best else {
                debug!("ShapeDetector::detect no candidate generated this pass");
                break;
            };
            if self.workspace.best.len() < self.params.min_model_accept {
                debug!(
                    "ShapeDetector::detect best candidate too small ({} < {})",
                    self.workspace.best.len(),
                    self.params.min_model_accept
                );
                break;
            }

            let description = self.descriptions[description_index];
            let members = std::mem::take(&mut self.workspace.best);
            let refined = description.refine(&model, cloud, &members, self.params.fit_params());

            // membership can shift at the boundary after refinement; re-expand
            // from the surviving seeds
            self.workspace.seeds.clear();
            for &i in &members {
                if description.distance(&refined, cloud.node(i)) <= description.fit_threshold {
                    self.workspace.seeds.push(i);
                }
            }
            self.finder.select(
                cloud,
                &description,
                &refined,
                description.fit_threshold,
                &active,
                &self.workspace.seeds,
                &mut self.workspace.candidate,
            );

            let (final_model, final_members) =
                if self.workspace.candidate.len() >= self.params.min_model_accept {
                    (refined, self.workspace.candidate.clone())
                } else {
                    debug!(
                        "ShapeDetector::detect refinement shrank the match set ({} -> {}), keeping sampled model",
                        members.len(),
                        self.workspace.candidate.len()
                    );
                    (model, members)
                };

            for &i in &final_members {
                if active[i as usize] {
                    active[i as usize] = false;
                    active_count -= 1;
                }
            }
            debug!(
                "ShapeDetector::detect accepted {:?} inliers={} remaining={}",
                description.shape,
                final_members.len(),
                active_count
            );
            result.shapes.push(DetectedShape {
                shape: description.shape,
                parameters: final_model.encode(),
                model: final_model,
                indices: final_members,
            });
        }

        result.unmatched = (0..point_count as u32)
            .filter(|&i| active[i as usize])
            .collect();
        result.latency_ms = start.elapsed().as_secs_f64() * 1000.0;
        debug!(
            "ShapeDetector::detect done shapes={} unmatched={} iterations={} latency_ms={:.3}",
            result.shapes.len(),
            result.unmatched.len(),
            result.iterations,
            result.latency_ms
        );
        result
    }

    /// One shape search: samples until the (possibly extended) budget is
    /// exhausted, leaving the best match set in `workspace.best`.
    fn run_search(
        &mut self,
        cloud: &PointNormalCloud,
        octree: &Octree,
        leaves: &[u32],
        active: &[bool],
        rng: &mut StdRng,
    ) -> (usize, Option<(usize, ShapeModel)>) {
        let cap = self.params.max_iterations;
        let mut budget = self.params.ransac_extension.min(cap);
        let mut iteration = 0usize;
        let mut best: Option<(usize, ShapeModel)> = None;
        self.workspace.best.clear();

        while iteration < budget {
            iteration += 1;

            let Some(&leaf) = leaves.choose(rng) else {
                break;
            };
            let cell = octree.cell(leaf);
            self.workspace.sample.clear();
            self.workspace
                .sample
                .extend(cell.points.choose_multiple(rng, SAMPLE_SIZE).copied());
            if self.workspace.sample.len() < SAMPLE_SIZE {
                continue;
            }
            let sample = [
                cloud.node(self.workspace.sample[0]),
                cloud.node(self.workspace.sample[1]),
                cloud.node(self.workspace.sample[2]),
            ];

            for description_index in 0..self.descriptions.len() {
                let description = self.descriptions[description_index];
                let Some(model) = description.generate(sample) else {
                    continue;
                };
                self.finder.select(
                    cloud,
                    &description,
                    &model,
                    description.fit_threshold,
                    active,
                    &self.workspace.sample,
                    &mut self.workspace.candidate,
                );
                if self.workspace.candidate.len() > self.workspace.best.len() {
                    self.workspace.promote_candidate();
                    best = Some((description_index, model));
                    budget = (budget + self.params.ransac_extension).min(cap);
                    debug!(
                        "ShapeDetector::search iter={} new best {:?} inliers={} budget={}",
                        iteration,
                        description.shape,
                        self.workspace.best.len(),
                        budget
                    );
                }
            }
        }

        (iteration, best)
    }
}
