//! RANSAC homography estimation.
//!
//! Minimal four-point samples are drawn with a seeded generator, each
//! hypothesis is scored by its inlier count, the iteration budget shrinks as
//! the best inlier ratio grows, and the winner is refitted on all its inliers.

use log::debug;
use nalgebra::Point2;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use starloc_core::{Estimate, Homography, RansacConfig, TransformEstimator};

use crate::dlt::{estimate_dlt, homography_from_4pt};
use crate::error::{GeometryError, GeometryResult};

/// Correspondences needed to fix a homography
pub const MIN_CORRESPONDENCES: usize = 4;

/// RANSAC estimator for robust homography fitting.
#[derive(Debug, Clone, Default)]
pub struct RansacEstimator {
    config: RansacConfig,
}

impl RansacEstimator {
    pub fn new(config: RansacConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    /// Estimate H with `dst ~ H * src` from matched point pairs.
    pub fn estimate_homography(
        &self,
        src: &[Point2<f32>],
        dst: &[Point2<f32>],
    ) -> GeometryResult<Estimate> {
        if src.len() != dst.len() {
            return Err(GeometryError::MismatchedPoints {
                src: src.len(),
                dst: dst.len(),
            });
        }
        let n = src.len();
        if n < MIN_CORRESPONDENCES {
            return Err(GeometryError::InsufficientMatches {
                found: n,
                required: MIN_CORRESPONDENCES,
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let threshold = self.config.reproj_threshold;

        let mut best: Option<(Homography, Vec<usize>)> = None;
        let mut sample = Vec::with_capacity(MIN_CORRESPONDENCES);
        let mut max_iter = self.config.max_iterations;
        let mut iterations = 0;

        while iterations < max_iter {
            iterations += 1;

            random_sample_into(&mut rng, n, MIN_CORRESPONDENCES, &mut sample);
            let s = [src[sample[0]], src[sample[1]], src[sample[2]], src[sample[3]]];
            let d = [dst[sample[0]], dst[sample[1]], dst[sample[2]], dst[sample[3]]];

            let Some(h) = homography_from_4pt(&s, &d) else {
                continue;
            };

            let inliers = count_inliers(src, dst, &h, threshold);
            let best_len = best.as_ref().map_or(0, |(_, b)| b.len());
            if inliers.len() > best_len {
                let ratio = inliers.len() as f64 / n as f64;
                max_iter = max_iter.min(adaptive_iterations(
                    ratio,
                    MIN_CORRESPONDENCES,
                    self.config.confidence,
                ));
                best = Some((h, inliers));
            }
        }

        let Some((model, inliers)) = best else {
            debug!("ransac: no non-degenerate sample among {} correspondences", n);
            return Err(GeometryError::DegenerateTransform);
        };

        // Final refinement with least squares on all inliers
        let (homography, inliers) = refine(src, dst, model, inliers, threshold);
        debug!(
            "ransac: {} of {} inliers after {} iterations",
            inliers.len(),
            n,
            iterations
        );

        Ok(Estimate {
            homography,
            inliers,
            iterations,
        })
    }
}

impl TransformEstimator for RansacEstimator {
    type Error = GeometryError;

    fn estimate(&self, src: &[Point2<f32>], dst: &[Point2<f32>]) -> GeometryResult<Estimate> {
        self.estimate_homography(src, dst)
    }
}

fn refine(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    model: Homography,
    inliers: Vec<usize>,
    threshold: f64,
) -> (Homography, Vec<usize>) {
    if inliers.len() <= MIN_CORRESPONDENCES {
        return (model, inliers);
    }
    let inlier_src: Vec<Point2<f32>> = inliers.iter().map(|&i| src[i]).collect();
    let inlier_dst: Vec<Point2<f32>> = inliers.iter().map(|&i| dst[i]).collect();

    match estimate_dlt(&inlier_src, &inlier_dst) {
        Some(refined) => {
            let refined_inliers = count_inliers(src, dst, &refined, threshold);
            if refined_inliers.len() >= inliers.len() {
                (refined, refined_inliers)
            } else {
                (model, inliers)
            }
        }
        None => (model, inliers),
    }
}

/// Floyd's algorithm for sampling `k` distinct indices out of `n`.
fn random_sample_into<R: Rng>(rng: &mut R, n: usize, k: usize, buffer: &mut Vec<usize>) {
    debug_assert!(k <= n, "Cannot sample {} indices from {}", k, n);
    buffer.clear();
    for j in (n - k)..n {
        let t = rng.random_range(0..=j);
        if buffer.contains(&t) {
            buffer.push(j);
        } else {
            buffer.push(t);
        }
    }
}

/// Indices whose reprojection error is within `threshold` pixels.
pub fn count_inliers(
    src: &[Point2<f32>],
    dst: &[Point2<f32>],
    h: &Homography,
    threshold: f64,
) -> Vec<usize> {
    let thr_sq = threshold * threshold;
    src.iter()
        .zip(dst)
        .enumerate()
        .filter_map(|(i, (s, d))| {
            let p = h.try_apply(*s)?;
            let dx = p.x as f64 - d.x as f64;
            let dy = p.y as f64 - d.y as f64;
            (dx * dx + dy * dy <= thr_sq).then_some(i)
        })
        .collect()
}

/// Compute adaptive iteration count for early termination.
///
/// N = log(1 - confidence) / log(1 - w^n), w = inlier ratio, n = sample size
pub(crate) fn adaptive_iterations(inlier_ratio: f64, sample_size: usize, confidence: f64) -> usize {
    if inlier_ratio <= 0.0 {
        return usize::MAX;
    }
    if inlier_ratio >= 1.0 {
        return 1;
    }

    let w_n = inlier_ratio.powi(sample_size as i32);
    let log_conf = (1.0 - confidence).ln();
    let log_outlier = (1.0 - w_n).ln();
    if log_outlier >= 0.0 {
        return usize::MAX;
    }

    (log_conf / log_outlier).ceil().max(1.0) as usize
}
