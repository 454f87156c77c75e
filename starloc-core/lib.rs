mod config;
mod error;
mod homography;

pub use config::{LocateConfig, MatcherConfig, OrbConfig, RansacConfig, RenderConfig};
pub use error::{CoreError, CoreResult};
pub use homography::{corners_of, Homography};

pub use image::GrayImage;
pub use nalgebra::Point2;

/// Key-point ≙ ORB corner, position in full-resolution pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    /// Orientation in radians
    pub angle: f32,
    /// Diameter of the described patch at full resolution
    pub size: f32,
    pub response: f32,
    /// Pyramid level the keypoint was detected on
    pub octave: u8,
}

impl Keypoint {
    pub fn pt(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

/// 256-bit binary descriptor = 32 bytes
pub type Descriptor = [u8; 32];

/// Number of bits that differ between two descriptors.
#[inline]
pub fn hamming_distance(a: &Descriptor, b: &Descriptor) -> u32 {
    a.chunks_exact(8)
        .zip(b.chunks_exact(8))
        .map(|(x, y)| {
            let x = u64::from_le_bytes([x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7]]);
            let y = u64::from_le_bytes([y[0], y[1], y[2], y[3], y[4], y[5], y[6], y[7]]);
            (x ^ y).count_ones()
        })
        .sum()
}

/// Keypoints with their descriptors, index-aligned.
#[derive(Debug, Clone, Default)]
pub struct Features {
    keypoints: Vec<Keypoint>,
    descriptors: Vec<Descriptor>,
}

impl Features {
    pub fn new(keypoints: Vec<Keypoint>, descriptors: Vec<Descriptor>) -> CoreResult<Self> {
        if keypoints.len() != descriptors.len() {
            return Err(CoreError::LengthMismatch {
                keypoints: keypoints.len(),
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            keypoints,
            descriptors,
        })
    }

    pub fn keypoints(&self) -> &[Keypoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Correspondence between a query descriptor and a reference ("train") descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: u32,
}

/// Output of a robust transform fit.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub homography: Homography,
    /// Indices into the correspondence arrays that agree with `homography`
    pub inliers: Vec<usize>,
    pub iterations: usize,
}

/// Detects keypoints and computes one binary descriptor per keypoint.
pub trait FeatureExtractor {
    type Error: std::error::Error + Send + Sync + 'static;

    fn detect_and_compute(&self, img: &GrayImage) -> Result<Features, Self::Error>;
}

/// Pairs query descriptors with reference descriptors.
pub trait DescriptorMatcher {
    /// Returned matches are in query order, at most one per query descriptor.
    fn match_descriptors(&self, query: &[Descriptor], train: &[Descriptor]) -> Vec<Match>;
}

/// Fits a homography mapping `src` onto `dst` while tolerating outliers.
pub trait TransformEstimator {
    type Error: std::error::Error + Send + Sync + 'static;

    fn estimate(&self, src: &[Point2<f32>], dst: &[Point2<f32>]) -> Result<Estimate, Self::Error>;
}

/// Initialize Rayon thread pool with the specified number of threads
pub fn init_thread_pool(n_threads: usize) -> Result<(), rayon::ThreadPoolBuildError> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build_global()
}
