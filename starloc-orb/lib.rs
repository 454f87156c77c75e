mod brief;
mod error;
mod fast;
mod pyramid;

pub use brief::{intensity_centroid_angle, BriefPattern};
pub use error::{OrbError, OrbResult};
pub use fast::{Corner, CornerDetector};
pub use pyramid::{ImagePyramid, ScaleLevel};

use imageproc::filter::gaussian_blur_f32;
use log::{debug, warn};
use rayon::prelude::*;
use starloc_core::{Descriptor, FeatureExtractor, Features, GrayImage, Keypoint, OrbConfig};

/// Multi-scale ORB detector: FAST-9 corners ranked by Harris response,
/// intensity-centroid orientation and rotated BRIEF descriptors.
#[derive(Debug, Clone)]
pub struct OrbExtractor {
    cfg: OrbConfig,
    pattern: BriefPattern,
}

impl OrbExtractor {
    /// Create a new extractor, validating the configuration
    pub fn new(cfg: OrbConfig) -> OrbResult<Self> {
        cfg.validate()
            .map_err(|e| OrbError::InvalidConfig(e.to_string()))?;
        let pattern = BriefPattern::new(cfg.patch_size);
        Ok(Self { cfg, pattern })
    }

    /// Get extractor configuration
    pub fn config(&self) -> &OrbConfig {
        &self.cfg
    }

    /// Detect keypoints and compute their descriptors in one pass.
    ///
    /// Keypoints are returned level by level, strongest first within a level.
    /// Images too small for a single detection window yield no features.
    pub fn detect_and_describe(&self, img: &GrayImage) -> OrbResult<Features> {
        let (w, h) = img.dimensions();
        let levels = ImagePyramid::generate_scale_levels(w, h, &self.cfg);
        if levels.is_empty() {
            warn!(
                "image {}x{} is too small for ORB (edge threshold {}), no features extracted",
                w, h, self.cfg.edge_threshold
            );
            return Ok(Features::default());
        }

        let pyramid = ImagePyramid::build(img, &levels);
        let per_level: Vec<Vec<(Keypoint, Descriptor)>> = levels
            .par_iter()
            .zip(pyramid.par_iter())
            .map(|(level, level_img)| self.process_level(level, level_img))
            .collect();

        let (keypoints, descriptors): (Vec<_>, Vec<_>) = per_level.into_iter().flatten().unzip();
        debug!(
            "extracted {} features from {}x{} image over {} levels",
            keypoints.len(),
            w,
            h,
            levels.len()
        );
        Ok(Features::new(keypoints, descriptors)?)
    }

    fn process_level(&self, level: &ScaleLevel, img: &GrayImage) -> Vec<(Keypoint, Descriptor)> {
        let mut corners = CornerDetector::detect(
            img,
            self.cfg.fast_threshold,
            self.cfg.edge_threshold as u32,
            self.cfg.harris_k,
        );
        let detected = corners.len();

        // Stable sort keeps scan order among equal responses
        corners.sort_by(|a, b| b.response.total_cmp(&a.response));
        corners.truncate(level.n_features);

        let smoothed = gaussian_blur_f32(img, self.cfg.blur_sigma);
        let radius = self.pattern.radius();
        let size = self.cfg.patch_size as f32 * level.scale;

        let features: Vec<(Keypoint, Descriptor)> = corners
            .iter()
            .map(|corner| {
                let angle = intensity_centroid_angle(img, corner.x, corner.y, radius);
                let descriptor =
                    self.pattern
                        .describe(&smoothed, corner.x as f32, corner.y as f32, angle);
                let keypoint = Keypoint {
                    x: corner.x as f32 * level.scale,
                    y: corner.y as f32 * level.scale,
                    angle,
                    size,
                    response: corner.response,
                    octave: level.level as u8,
                };
                (keypoint, descriptor)
            })
            .collect();

        debug!(
            "level {} ({}x{}): {} corners, kept {}",
            level.level,
            level.width,
            level.height,
            detected,
            features.len()
        );
        features
    }
}

impl FeatureExtractor for OrbExtractor {
    type Error = OrbError;

    fn detect_and_compute(&self, img: &GrayImage) -> OrbResult<Features> {
        self.detect_and_describe(img)
    }
}
