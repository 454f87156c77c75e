use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use starloc_core::{Descriptor, GrayImage};

const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x0b5e_55ed;

/// Fixed sampling pattern of 256 point pairs for rotated BRIEF.
#[derive(Debug, Clone)]
pub struct BriefPattern {
    pairs: Vec<[(f32, f32); 2]>,
    radius: i32,
}

impl BriefPattern {
    /// Draws the pairs from an isotropic Gaussian (sigma = patch / 5), keeping
    /// only points inside the patch disk so any rotation stays in the patch.
    pub fn new(patch_size: usize) -> Self {
        let radius = (patch_size / 2) as i32;
        let sigma = patch_size as f32 / 5.0;
        let limit = (radius * radius) as f32;
        let mut rng = ChaCha8Rng::seed_from_u64(PATTERN_SEED);

        let mut sample = || loop {
            // Box-Muller
            let u1: f32 = rng.random_range(f32::EPSILON..1.0);
            let u2: f32 = rng.random::<f32>();
            let mag = sigma * (-2.0 * u1.ln()).sqrt();
            let (s, c) = (std::f32::consts::TAU * u2).sin_cos();
            let (x, y) = ((mag * c).round(), (mag * s).round());
            if x * x + y * y <= limit {
                return (x, y);
            }
        };

        let pairs = (0..DESCRIPTOR_BITS).map(|_| [sample(), sample()]).collect();
        Self { pairs, radius }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn pairs(&self) -> &[[(f32, f32); 2]] {
        &self.pairs
    }

    /// Computes the descriptor of the keypoint at (`x`, `y`) with orientation
    /// `angle` on a pre-smoothed image.
    pub fn describe(&self, smoothed: &GrayImage, x: f32, y: f32, angle: f32) -> Descriptor {
        let (w, h) = smoothed.dimensions();
        let (s, c) = angle.sin_cos();
        let sample = |(dx, dy): (f32, f32)| {
            let rx = (x + c * dx - s * dy).round().clamp(0.0, (w - 1) as f32) as u32;
            let ry = (y + s * dx + c * dy).round().clamp(0.0, (h - 1) as f32) as u32;
            smoothed.get_pixel(rx, ry)[0]
        };

        let mut d = [0u8; 32];
        for (i, &[p1, p2]) in self.pairs.iter().enumerate() {
            let bit = (sample(p1) < sample(p2)) as u8;
            d[i / 8] |= bit << (i % 8);
        }
        d
    }
}

/// Orientation of the patch around (`x`, `y`) from its intensity centroid,
/// measured over the disk of the given radius.
pub fn intensity_centroid_angle(img: &GrayImage, x: u32, y: u32, radius: i32) -> f32 {
    let (w, h) = img.dimensions();
    let (cx, cy) = (x as i32, y as i32);
    let mut m10 = 0i64;
    let mut m01 = 0i64;

    for dy in -radius..=radius {
        let yy = cy + dy;
        if yy < 0 || yy >= h as i32 {
            continue;
        }
        let span = ((radius * radius - dy * dy) as f32).sqrt() as i32;
        for dx in -span..=span {
            let xx = cx + dx;
            if xx < 0 || xx >= w as i32 {
                continue;
            }
            let val = img.get_pixel(xx as u32, yy as u32)[0] as i64;
            m10 += dx as i64 * val;
            m01 += dy as i64 * val;
        }
    }

    (m01 as f32).atan2(m10 as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use starloc_core::hamming_distance;

    fn gradient_image() -> GrayImage {
        GrayImage::from_fn(64, 64, |x, y| Luma([((x * 3 + y * 5) % 256) as u8]))
    }

    #[test]
    fn pattern_is_deterministic_and_inside_patch() {
        let a = BriefPattern::new(31);
        let b = BriefPattern::new(31);
        assert_eq!(a.pairs(), b.pairs());
        assert_eq!(a.pairs().len(), 256);
        assert_eq!(a.radius(), 15);
        for [p, q] in a.pairs() {
            for (x, y) in [p, q] {
                assert!(x * x + y * y <= 225.0);
            }
        }
        // Not all pairs collapse onto one point
        assert!(a.pairs().iter().any(|[p, q]| p != q));
    }

    #[test]
    fn identical_patches_give_identical_descriptors() {
        let pattern = BriefPattern::new(31);
        let img = gradient_image();
        let shifted = GrayImage::from_fn(80, 80, |x, y| {
            if x >= 10 && y >= 7 && x < 74 && y < 71 {
                *img.get_pixel(x - 10, y - 7)
            } else {
                Luma([0])
            }
        });
        let d1 = pattern.describe(&img, 32.0, 32.0, 0.0);
        let d2 = pattern.describe(&shifted, 42.0, 39.0, 0.0);
        assert_eq!(hamming_distance(&d1, &d2), 0);
    }

    #[test]
    fn uniform_patch_sets_no_bits() {
        let pattern = BriefPattern::new(31);
        let img = GrayImage::from_pixel(64, 64, Luma([77]));
        assert_eq!(pattern.describe(&img, 32.0, 32.0, 1.0), [0u8; 32]);
    }

    #[test]
    fn centroid_points_towards_bright_side() {
        let right_bright = GrayImage::from_fn(64, 64, |x, _| Luma(if x > 32 { [200] } else { [10] }));
        let angle = intensity_centroid_angle(&right_bright, 32, 32, 15);
        assert!(angle.abs() < 0.1, "angle {angle}");

        let bottom_bright = GrayImage::from_fn(64, 64, |_, y| Luma(if y > 32 { [200] } else { [10] }));
        let angle = intensity_centroid_angle(&bottom_bright, 32, 32, 15);
        assert!((angle - std::f32::consts::FRAC_PI_2).abs() < 0.1, "angle {angle}");
    }
}
