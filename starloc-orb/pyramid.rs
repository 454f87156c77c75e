use image::imageops::{self, FilterType};
use starloc_core::{GrayImage, OrbConfig};

/// Scale information for pyramid levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleLevel {
    pub level: usize,
    /// Factor mapping level coordinates back to full resolution
    pub scale: f32,
    pub width: u32,
    pub height: u32,
    /// Number of keypoints this level may keep
    pub n_features: usize,
}

/// Image pyramid operations for multi-scale feature detection
pub struct ImagePyramid;

impl ImagePyramid {
    /// Generate the scale levels an image of `width × height` supports, with the
    /// feature budget spread geometrically so finer levels keep more keypoints.
    pub fn generate_scale_levels(width: u32, height: u32, cfg: &OrbConfig) -> Vec<ScaleLevel> {
        let min_side = 2 * cfg.edge_threshold as u32;
        let mut levels = Vec::new();
        let mut scale = 1.0f32;

        for level in 0..cfg.n_levels {
            let w = (width as f32 / scale).round() as u32;
            let h = (height as f32 / scale).round() as u32;
            if w <= min_side || h <= min_side {
                break;
            }
            levels.push(ScaleLevel {
                level,
                scale,
                width: w,
                height: h,
                n_features: 0,
            });
            scale *= cfg.scale_factor;
        }

        Self::distribute_features(&mut levels, cfg.n_features, cfg.scale_factor);
        levels
    }

    fn distribute_features(levels: &mut [ScaleLevel], n_features: usize, scale_factor: f32) {
        let Some(last) = levels.len().checked_sub(1) else {
            return;
        };
        let factor = 1.0 / scale_factor as f64;
        let mut desired =
            n_features as f64 * (1.0 - factor) / (1.0 - factor.powi(levels.len() as i32));

        let mut assigned = 0usize;
        for level in levels[..last].iter_mut() {
            level.n_features = (desired.round() as usize).min(n_features - assigned);
            assigned += level.n_features;
            desired *= factor;
        }
        levels[last].n_features = n_features - assigned;
    }

    /// Build the pyramid images; level 0 is the input itself.
    pub fn build(img: &GrayImage, levels: &[ScaleLevel]) -> Vec<GrayImage> {
        levels
            .iter()
            .map(|level| {
                if level.level == 0 {
                    img.clone()
                } else {
                    imageops::resize(img, level.width, level.height, FilterType::Triangle)
                }
            })
            .collect()
    }
}
