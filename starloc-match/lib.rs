use log::debug;
use rayon::prelude::*;
use starloc_core::{hamming_distance, Descriptor, DescriptorMatcher, Match, MatcherConfig};

/// Brute-force Hamming matcher applying Lowe's ratio test to the two nearest
/// reference descriptors of every query descriptor.
#[derive(Debug, Clone, Default)]
pub struct BruteForceMatcher {
    cfg: MatcherConfig,
}

impl BruteForceMatcher {
    pub fn new(cfg: MatcherConfig) -> Self {
        Self { cfg }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.cfg
    }

    /// The `k` nearest reference descriptors of each query descriptor, closest
    /// first. Lists are shorter than `k` when `train` has fewer entries; equal
    /// distances keep the lower reference index first.
    pub fn knn_match(&self, query: &[Descriptor], train: &[Descriptor], k: usize) -> Vec<Vec<Match>> {
        query
            .par_iter()
            .enumerate()
            .map(|(query_idx, q)| nearest(query_idx, q, train, k))
            .collect()
    }

    /// Matches every query descriptor against `train`, keeping only
    /// unambiguous best candidates.
    pub fn ratio_match(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        let knn = self.knn_match(query, train, 2);
        let (matches, skipped) = ratio_filter(&knn, self.cfg.ratio);
        if skipped > 0 {
            debug!(
                "{} of {} query descriptors had fewer than two neighbours and were skipped",
                skipped,
                query.len()
            );
        }
        debug!(
            "ratio test kept {} of {} query descriptors (ratio {:.2})",
            matches.len(),
            query.len(),
            self.cfg.ratio
        );
        matches
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match> {
        self.ratio_match(query, train)
    }
}

fn nearest(query_idx: usize, q: &Descriptor, train: &[Descriptor], k: usize) -> Vec<Match> {
    let mut best: Vec<Match> = Vec::with_capacity(k + 1);
    if k == 0 {
        return best;
    }
    for (train_idx, t) in train.iter().enumerate() {
        let distance = hamming_distance(q, t);
        if best.len() == k && distance >= best[k - 1].distance {
            continue;
        }
        let pos = best.partition_point(|m| m.distance <= distance);
        best.insert(
            pos,
            Match {
                query_idx,
                train_idx,
                distance,
            },
        );
        best.truncate(k);
    }
    best
}

/// Applies the ratio test to k-nearest-neighbour lists: the closest candidate
/// is kept when `best < ratio * second_best`.
///
/// Lists with fewer than two candidates cannot be tested and are excluded;
/// their count is returned alongside the accepted matches.
pub fn ratio_filter(knn: &[Vec<Match>], ratio: f32) -> (Vec<Match>, usize) {
    let mut skipped = 0;
    let mut good = Vec::new();
    for candidates in knn {
        match candidates.as_slice() {
            [best, second, ..] => {
                if (best.distance as f64) < ratio as f64 * second.distance as f64 {
                    good.push(*best);
                }
            }
            _ => skipped += 1,
        }
    }
    (good, skipped)
}
