use log::debug;
use nalgebra::Point2;
use starloc_core::{Homography, Keypoint, Match, TransformEstimator};

use crate::error::{GeometryError, GeometryResult};
use crate::ransac::MIN_CORRESPONDENCES;

/// Where a query patch sits inside the reference image.
#[derive(Debug, Clone)]
pub struct Localization {
    /// Maps query coordinates to reference coordinates
    pub homography: Homography,
    /// Projected query corners (0,0), (w,0), (w,h), (0,h)
    pub corners: [Point2<f32>; 4],
    /// Indices into the match list that support `homography`
    pub inliers: Vec<usize>,
}

/// Matched point pairs `(query, reference)`; every index is checked.
pub fn correspondences(
    matches: &[Match],
    query_kps: &[Keypoint],
    train_kps: &[Keypoint],
) -> GeometryResult<(Vec<Point2<f32>>, Vec<Point2<f32>>)> {
    let invalid = |index| GeometryError::InvalidMatchIndex {
        index,
        query_len: query_kps.len(),
        train_len: train_kps.len(),
    };

    let mut src = Vec::with_capacity(matches.len());
    let mut dst = Vec::with_capacity(matches.len());
    for m in matches {
        let q = query_kps.get(m.query_idx).ok_or_else(|| invalid(m.query_idx))?;
        let t = train_kps.get(m.train_idx).ok_or_else(|| invalid(m.train_idx))?;
        src.push(q.pt());
        dst.push(t.pt());
    }
    Ok((src, dst))
}

/// Fits a homography from `matches` and projects the corners of a
/// `query_size` rectangle into the reference image.
pub fn localize<T>(
    matches: &[Match],
    query_kps: &[Keypoint],
    train_kps: &[Keypoint],
    query_size: (u32, u32),
    estimator: &T,
) -> GeometryResult<Localization>
where
    T: TransformEstimator<Error = GeometryError>,
{
    if matches.len() < MIN_CORRESPONDENCES {
        return Err(GeometryError::InsufficientMatches {
            found: matches.len(),
            required: MIN_CORRESPONDENCES,
        });
    }

    let (src, dst) = correspondences(matches, query_kps, train_kps)?;
    let estimate = estimator.estimate(&src, &dst)?;
    if estimate.homography.is_degenerate() {
        return Err(GeometryError::DegenerateTransform);
    }

    let (w, h) = query_size;
    let corners = estimate
        .homography
        .project_corners(w, h)
        .ok_or(GeometryError::DegenerateTransform)?;

    debug!(
        "localized {}x{} query with {}/{} inlier matches: {:?}",
        w,
        h,
        estimate.inliers.len(),
        matches.len(),
        corners.map(|c| (c.x, c.y))
    );

    Ok(Localization {
        homography: estimate.homography,
        corners,
        inliers: estimate.inliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RansacEstimator;
    use approx::assert_relative_eq;
    use starloc_core::{corners_of, Estimate};

    fn kp(x: f32, y: f32) -> Keypoint {
        Keypoint {
            x,
            y,
            angle: 0.0,
            size: 31.0,
            response: 1.0,
            octave: 0,
        }
    }

    fn identity_matches(n: usize) -> Vec<Match> {
        (0..n)
            .map(|i| Match {
                query_idx: i,
                train_idx: i,
                distance: 0,
            })
            .collect()
    }

    fn scattered(n: usize, offset: (f32, f32)) -> Vec<Keypoint> {
        (0..n)
            .map(|i| {
                let x = ((i * 37) % 150) as f32 + offset.0;
                let y = ((i * 53) % 110) as f32 + offset.1;
                kp(x, y)
            })
            .collect()
    }

    /// Always returns the same model, whatever the input
    struct Fixed(Homography);

    impl TransformEstimator for Fixed {
        type Error = GeometryError;

        fn estimate(&self, src: &[Point2<f32>], _dst: &[Point2<f32>]) -> GeometryResult<Estimate> {
            Ok(Estimate {
                homography: self.0,
                inliers: (0..src.len()).collect(),
                iterations: 1,
            })
        }
    }

    #[test]
    fn translated_patch_corners_are_shifted() {
        let query = scattered(30, (0.0, 0.0));
        let train = scattered(30, (120.0, 90.0));
        let loc = localize(
            &identity_matches(30),
            &query,
            &train,
            (160, 120),
            &RansacEstimator::default(),
        )
        .unwrap();

        let expected = corners_of(160, 120).map(|c| Point2::new(c.x + 120.0, c.y + 90.0));
        for (got, want) in loc.corners.iter().zip(expected.iter()) {
            assert_relative_eq!(got.x, want.x, epsilon = 0.5);
            assert_relative_eq!(got.y, want.y, epsilon = 0.5);
        }
        assert_eq!(loc.inliers.len(), 30);
    }

    #[test]
    fn identity_keeps_query_corners() {
        let kps = scattered(10, (0.0, 0.0));
        let loc = localize(
            &identity_matches(10),
            &kps,
            &kps,
            (64, 48),
            &Fixed(Homography::identity()),
        )
        .unwrap();
        assert_eq!(loc.corners, corners_of(64, 48));
    }

    #[test]
    fn three_matches_are_not_enough() {
        let kps = scattered(3, (0.0, 0.0));
        let err = localize(
            &identity_matches(3),
            &kps,
            &kps,
            (10, 10),
            &RansacEstimator::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            GeometryError::InsufficientMatches {
                found: 3,
                required: 4
            }
        );
    }

    #[test]
    fn out_of_range_index_is_reported() {
        let kps = scattered(5, (0.0, 0.0));
        let mut matches = identity_matches(5);
        matches[2].train_idx = 9;
        let err = localize(&matches, &kps, &kps, (10, 10), &RansacEstimator::default())
            .unwrap_err();
        assert_eq!(
            err,
            GeometryError::InvalidMatchIndex {
                index: 9,
                query_len: 5,
                train_len: 5
            }
        );
    }

    #[test]
    fn singular_model_is_degenerate() {
        let kps = scattered(8, (0.0, 0.0));
        let singular = Homography::from_array([[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]]);
        let err = localize(&identity_matches(8), &kps, &kps, (20, 20), &Fixed(singular))
            .unwrap_err();
        assert_eq!(err, GeometryError::DegenerateTransform);
    }

    #[test]
    fn corner_at_infinity_is_degenerate() {
        let kps = scattered(8, (0.0, 0.0));
        // w = x - 20 vanishes on the right edge of a 20-wide query
        let h = Homography::from_array([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, -20.0]]);
        let err = localize(&identity_matches(8), &kps, &kps, (20, 20), &Fixed(h)).unwrap_err();
        assert_eq!(err, GeometryError::DegenerateTransform);
    }
}
