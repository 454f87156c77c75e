use crate::error::{CoreError, CoreResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// ORB detector and descriptor settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct OrbConfig {
    /// Upper bound on features retained across all pyramid levels
    pub n_features: usize,
    pub scale_factor: f32,
    pub n_levels: usize,
    /// FAST segment-test intensity threshold
    pub fast_threshold: u8,
    /// Border (in level pixels) where no keypoint is detected
    pub edge_threshold: usize,
    /// Diameter of the oriented BRIEF patch
    pub patch_size: usize,
    /// Smoothing applied before descriptor sampling
    pub blur_sigma: f32,
    pub harris_k: f32,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            n_features: 10000,
            scale_factor: 1.2,
            n_levels: 8,
            fast_threshold: 20,
            edge_threshold: 31,
            patch_size: 31,
            blur_sigma: 2.0,
            harris_k: 0.04,
        }
    }
}

impl OrbConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if self.n_features == 0 {
            return Err(invalid("n_features must be > 0"));
        }
        if !(self.scale_factor > 1.0) {
            return Err(invalid(format!(
                "scale_factor must be > 1.0, got {}",
                self.scale_factor
            )));
        }
        if self.n_levels == 0 {
            return Err(invalid("n_levels must be >= 1"));
        }
        if self.fast_threshold == 0 || self.fast_threshold > 127 {
            return Err(invalid(format!(
                "fast_threshold must be 1-127, got {}",
                self.fast_threshold
            )));
        }
        if self.patch_size < 7 || self.patch_size % 2 == 0 {
            return Err(invalid(format!(
                "patch_size must be odd and >= 7, got {}",
                self.patch_size
            )));
        }
        if self.edge_threshold < self.patch_size / 2 + 1 {
            return Err(invalid(format!(
                "edge_threshold {} must exceed half the patch size {}",
                self.edge_threshold,
                self.patch_size / 2
            )));
        }
        if !(self.blur_sigma > 0.0) {
            return Err(invalid("blur_sigma must be > 0"));
        }
        Ok(())
    }
}

/// Ratio-test matcher settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MatcherConfig {
    /// A match is kept only when `best < ratio * second_best`
    pub ratio: f32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self { ratio: 0.7 }
    }
}

/// Robust homography fit settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RansacConfig {
    /// Maximum reprojection error (pixels) for a correspondence to count as inlier
    pub reproj_threshold: f64,
    pub max_iterations: usize,
    /// Target probability of having drawn one outlier-free sample
    pub confidence: f64,
    /// Seed of the sampling generator; fixed so runs are reproducible
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            reproj_threshold: 3.0,
            max_iterations: 2000,
            confidence: 0.995,
            seed: 0x5eed,
        }
    }
}

/// Match visualization settings
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RenderConfig {
    pub display_width: u32,
    pub display_height: u32,
    pub marker_size: u32,
    pub marker_thickness: u32,
    /// Corner marker colour (RGB)
    pub marker_color: [u8; 3],
    pub keypoint_radius: i32,
    /// Seed of the match-line colour generator
    pub color_seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            display_width: 900,
            display_height: 600,
            marker_size: 7,
            marker_thickness: 2,
            marker_color: [0, 0, 255],
            keypoint_radius: 3,
            color_seed: 12345,
        }
    }
}

/// Complete pipeline configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LocateConfig {
    pub orb: OrbConfig,
    pub matcher: MatcherConfig,
    pub ransac: RansacConfig,
    pub render: RenderConfig,
    pub n_threads: usize,
}

impl Default for LocateConfig {
    fn default() -> Self {
        Self {
            orb: OrbConfig::default(),
            matcher: MatcherConfig::default(),
            ransac: RansacConfig::default(),
            render: RenderConfig::default(),
            n_threads: num_cpus::get().max(1),
        }
    }
}

impl LocateConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> CoreResult<()> {
        self.orb.validate()?;
        if !(self.matcher.ratio > 0.0 && self.matcher.ratio <= 1.0) {
            return Err(invalid(format!(
                "ratio must be in (0, 1], got {}",
                self.matcher.ratio
            )));
        }
        if !(self.ransac.reproj_threshold > 0.0) {
            return Err(invalid("reproj_threshold must be > 0"));
        }
        if self.ransac.max_iterations == 0 {
            return Err(invalid("max_iterations must be > 0"));
        }
        if !(self.ransac.confidence > 0.0 && self.ransac.confidence < 1.0) {
            return Err(invalid(format!(
                "confidence must be in (0, 1), got {}",
                self.ransac.confidence
            )));
        }
        if self.render.display_width == 0 || self.render.display_height == 0 {
            return Err(invalid("display size must be non-zero"));
        }
        if self.n_threads == 0 {
            return Err(invalid("n_threads must be >= 1"));
        }
        Ok(())
    }

    /// Generate human-readable summary
    pub fn summary(&self) -> String {
        format!(
            "LocateConfig: features={}, levels={}x{:.2}, fast={}, ratio={:.2}, ransac=[thr:{:.1}, iters:{}, conf:{:.3}], display={}x{}, threads={}",
            self.orb.n_features,
            self.orb.n_levels,
            self.orb.scale_factor,
            self.orb.fast_threshold,
            self.matcher.ratio,
            self.ransac.reproj_threshold,
            self.ransac.max_iterations,
            self.ransac.confidence,
            self.render.display_width,
            self.render.display_height,
            self.n_threads
        )
    }

    /// Load configuration from a `.toml` or `.json` file
    #[cfg(feature = "serde")]
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            Some("json") => Self::from_json(&content),
            other => Err(CoreError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Save configuration to a `.toml` or `.json` file
    #[cfg(feature = "serde")]
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> CoreResult<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            other => {
                return Err(CoreError::UnsupportedFormat(
                    other.unwrap_or("<none>").to_string(),
                ))
            }
        };
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Serialize to JSON string
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> CoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// Deserialize from JSON string
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> CoreResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to TOML string
    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::Parse(e.to_string()))
    }

    /// Deserialize from TOML string
    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(toml_str).map_err(|e| CoreError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

fn invalid(msg: impl Into<String>) -> CoreError {
    CoreError::InvalidConfig(msg.into())
}
