use std::borrow::Cow;

use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use log::{debug, info};
use serde::Serialize;

use crate::compositor::{composite_into, draw_contour};
use crate::config::PipelineConfig;
use crate::features::{AkazeExtractor, FeatureExtractor, Features};
use crate::matching::{Match, match_descriptors};
use crate::pose::{PoseEstimate, locate_object};

/// Everything learned about the model in one scene frame.
#[derive(Debug, Clone)]
pub struct FrameDetection {
    pub scene_features: Features,
    pub matches: Vec<Match>,
    pub pose: PoseEstimate,
}

#[derive(Debug, Clone)]
pub struct FrameOutput {
    pub image: RgbImage,
    pub detection: FrameDetection,
    pub composited: bool,
}

/// Per-frame summary written to the session report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameStats {
    pub index: usize,
    pub scene_keypoints: usize,
    pub matches: usize,
    pub inliers: usize,
    pub detected: bool,
    pub composited: bool,
}

impl FrameOutput {
    pub fn pose(&self) -> &PoseEstimate {
        &self.detection.pose
    }

    pub fn stats(&self, index: usize) -> FrameStats {
        let pose = self.pose();
        FrameStats {
            index,
            scene_keypoints: self.detection.scene_features.len(),
            matches: self.detection.matches.len(),
            inliers: pose.detection().map_or(0, |d| d.inliers),
            detected: pose.is_valid(),
            composited: self.composited,
        }
    }
}

pub fn scale_image(image: &RgbImage, factor: f32) -> RgbImage {
    if (factor - 1.0).abs() < f32::EPSILON || factor <= 0.0 {
        return image.clone();
    }
    let width = ((image.width() as f32 * factor).round() as u32).max(1);
    let height = ((image.height() as f32 * factor).round() as u32).max(1);
    image::imageops::resize(image, width, height, FilterType::Triangle)
}

/// Per-frame detection and compositing against a fixed model.
///
/// Model features are computed once in [`Pipeline::new`]; every other call is
/// a pure function of its arguments.
pub struct Pipeline<E: FeatureExtractor = AkazeExtractor> {
    extractor: E,
    config: PipelineConfig,
    model: RgbImage,
    model_features: Features,
}

impl Pipeline<AkazeExtractor> {
    pub fn from_config(model: RgbImage, config: PipelineConfig) -> Pipeline<AkazeExtractor> {
        let extractor = AkazeExtractor::new(config.akaze_threshold);
        Pipeline::new(model, extractor, config)
    }
}

impl<E: FeatureExtractor> Pipeline<E> {
    pub fn new(model: RgbImage, extractor: E, config: PipelineConfig) -> Pipeline<E> {
        let model_features = extractor.extract(&DynamicImage::ImageRgb8(model.clone()));
        info!(
            "model {}x{}: {} keypoints",
            model.width(),
            model.height(),
            model_features.len()
        );
        Pipeline {
            extractor,
            config,
            model,
            model_features,
        }
    }

    pub fn model(&self) -> &RgbImage {
        &self.model
    }

    pub fn model_features(&self) -> &Features {
        &self.model_features
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn detect(&self, scene: &RgbImage) -> FrameDetection {
        let scene_features = self
            .extractor
            .extract(&DynamicImage::ImageRgb8(scene.clone()));
        let matches = match_descriptors(
            &self.model_features.descriptors,
            &scene_features.descriptors,
            self.config.ratio_threshold,
        );
        let pose = locate_object(
            self.model.dimensions(),
            &self.model_features.keypoints,
            &scene_features.keypoints,
            &matches,
            &self.config.pose,
        );
        debug!(
            "scene keypoints {}, matches {}, pose {:?}",
            scene_features.len(),
            matches.len(),
            pose
        );
        FrameDetection {
            scene_features,
            matches,
            pose,
        }
    }

    /// Overlays are warped in model coordinates, anything else is resized to the model first.
    fn fit_overlay<'a>(&self, overlay: &'a RgbImage) -> Cow<'a, RgbImage> {
        let (w, h) = self.model.dimensions();
        if overlay.dimensions() == (w, h) {
            Cow::Borrowed(overlay)
        } else {
            Cow::Owned(image::imageops::resize(overlay, w, h, FilterType::Triangle))
        }
    }

    pub fn process(&self, scene: &RgbImage, overlay: Option<&RgbImage>) -> FrameOutput {
        let detection = self.detect(scene);
        let mut image = scene.clone();
        let mut composited = false;

        if let PoseEstimate::Valid(found) = &detection.pose {
            if let Some(overlay) = overlay {
                let overlay = self.fit_overlay(overlay);
                composited = composite_into(
                    scene,
                    &overlay,
                    &found.homography,
                    self.config.interpolation,
                    &mut image,
                );
            }
            if self.config.draw_outline {
                draw_contour(
                    &mut image,
                    &found.corners,
                    Rgb(self.config.outline_color),
                    self.config.outline_thickness,
                );
            }
        }

        FrameOutput {
            image,
            detection,
            composited,
        }
    }
}
