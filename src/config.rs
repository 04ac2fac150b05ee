use serde::{Deserialize, Serialize};

use crate::matching::LOWES_RATIO;

/// Pixel interpolation used when warping the overlay into the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarpInterpolation {
    Nearest,
    Bilinear,
    Bicubic,
}

impl From<WarpInterpolation> for imageproc::geometric_transformations::Interpolation {
    fn from(value: WarpInterpolation) -> Self {
        use imageproc::geometric_transformations::Interpolation;
        match value {
            WarpInterpolation::Nearest => Interpolation::Nearest,
            WarpInterpolation::Bilinear => Interpolation::Bilinear,
            WarpInterpolation::Bicubic => Interpolation::Bicubic,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacConfig {
    pub max_iterations: usize,
    /// Maximum reprojection error in scene pixels for a correspondence to count as an inlier.
    pub reprojection_threshold: f64,
    /// Probability that at least one sample is outlier free, drives the adaptive iteration count.
    pub confidence: f64,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            max_iterations: 2000,
            reprojection_threshold: 3.0,
            confidence: 0.995,
            seed: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoseConfig {
    pub ransac: RansacConfig,
    /// Report a non-convex or self-intersecting projected outline as degenerate.
    pub reject_non_convex: bool,
}

impl Default for PoseConfig {
    fn default() -> Self {
        Self {
            ransac: RansacConfig::default(),
            reject_non_convex: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub akaze_threshold: f64,
    pub ratio_threshold: f32,
    pub pose: PoseConfig,
    pub interpolation: WarpInterpolation,
    pub draw_outline: bool,
    pub outline_color: [u8; 3],
    pub outline_thickness: u32,
    /// Resize factor applied to the model image before feature extraction.
    pub model_scale: f32,
    /// Resize factor applied to every scene frame before processing.
    pub scene_scale: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            akaze_threshold: 0.001,
            ratio_threshold: LOWES_RATIO,
            pose: PoseConfig::default(),
            interpolation: WarpInterpolation::Bilinear,
            draw_outline: true,
            outline_color: [0, 255, 0],
            outline_thickness: 4,
            model_scale: 0.5,
            scene_scale: 0.5,
        }
    }
}
