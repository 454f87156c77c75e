mod error;
pub mod loader;
pub mod render;
#[cfg(feature = "viewer")]
pub mod viewer;

use std::time::Instant;

use log::info;
use starloc_core::{
    DescriptorMatcher, FeatureExtractor, Features, GrayImage, LocateConfig, Match,
    TransformEstimator,
};
use starloc_geometry::{localize, GeometryError, Localization, RansacEstimator};
use starloc_match::BruteForceMatcher;
use starloc_orb::OrbExtractor;

pub use error::{LocateError, LocateResult};
pub use loader::load_grayscale;
pub use render::{draw_diamond_marker, draw_matches, render_localization, resize_for_display};
pub use starloc_core;

/// Outcome of locating one query image in the reference.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    pub features: Features,
    /// Ratio-test survivors, in query order
    pub matches: Vec<Match>,
    pub localization: Localization,
}

/// Feature extraction, matching and robust fitting composed into one pipeline
pub struct Locator<X, M, T> {
    extractor: X,
    matcher: M,
    estimator: T,
}

/// The default stack: ORB features, brute-force Hamming matching, RANSAC
pub type OrbLocator = Locator<OrbExtractor, BruteForceMatcher, RansacEstimator>;

impl OrbLocator {
    /// Create the default stack from a validated configuration
    pub fn orb(cfg: &LocateConfig) -> LocateResult<Self> {
        cfg.validate()?;
        Ok(Locator::new(
            OrbExtractor::new(cfg.orb.clone())?,
            BruteForceMatcher::new(cfg.matcher.clone()),
            RansacEstimator::new(cfg.ransac.clone()),
        ))
    }
}

impl<X, M, T> Locator<X, M, T>
where
    X: FeatureExtractor,
    LocateError: From<X::Error>,
    M: DescriptorMatcher,
    T: TransformEstimator<Error = GeometryError>,
{
    pub fn new(extractor: X, matcher: M, estimator: T) -> Self {
        Self {
            extractor,
            matcher,
            estimator,
        }
    }

    /// Detect keypoints and compute descriptors for one image
    pub fn extract(&self, img: &GrayImage) -> LocateResult<Features> {
        let t0 = Instant::now();
        let features = self.extractor.detect_and_compute(img)?;
        info!(
            "{} features from {}x{} image in {:.2?}",
            features.len(),
            img.width(),
            img.height(),
            t0.elapsed()
        );
        Ok(features)
    }

    /// Match `query` against already extracted reference features and
    /// project the query corners into the reference image.
    pub fn locate(&self, query: &GrayImage, reference: &Features) -> LocateResult<QueryMatch> {
        let features = self.extract(query)?;

        let t0 = Instant::now();
        let matches = self
            .matcher
            .match_descriptors(features.descriptors(), reference.descriptors());
        info!("{} good matches in {:.2?}", matches.len(), t0.elapsed());

        let localization = localize(
            &matches,
            features.keypoints(),
            reference.keypoints(),
            query.dimensions(),
            &self.estimator,
        )?;
        info!(
            "corners: {}",
            localization
                .corners
                .iter()
                .map(|c| format!("({:.1}, {:.1})", c.x, c.y))
                .collect::<Vec<_>>()
                .join(" ")
        );

        Ok(QueryMatch {
            features,
            matches,
            localization,
        })
    }
}
