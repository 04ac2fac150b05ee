use glam::Vec2;
use image::{DynamicImage, Rgb, RgbImage};
use planar_ar::config::{PipelineConfig, WarpInterpolation};
use planar_ar::estimation::Homography;
use planar_ar::features::{FeatureExtractor, Features};
use planar_ar::pipeline::{Pipeline, scale_image};
use planar_ar::pose::{PoseEstimate, model_corners};
use planar_ar::synthetic::{place_model, rectangle_count, textured_model};

const MODEL_SIZE: u32 = 200;
const OFFSET: (u32, u32) = (48, 64);

fn assert_corners_close(found: &[Vec2; 4], expected: &[Vec2; 4], tol: f32) {
    for (f, e) in found.iter().zip(expected) {
        assert!(f.distance(*e) < tol, "{:?} vs {:?}", found, expected);
    }
}

fn translated_scene(model: &RgbImage) -> RgbImage {
    let background = RgbImage::from_pixel(320, 320, Rgb([90, 90, 90]));
    let h = Homography::from_scale_translation(1.0, OFFSET.0 as f64, OFFSET.1 as f64);
    place_model(&background, model, &h, WarpInterpolation::Nearest)
}

fn expected_translated_corners() -> [Vec2; 4] {
    let offset = Vec2::new(OFFSET.0 as f32, OFFSET.1 as f32);
    model_corners(MODEL_SIZE, MODEL_SIZE).map(|c| c + offset)
}

struct NoFeatures;

impl FeatureExtractor for NoFeatures {
    fn extract(&self, _image: &DynamicImage) -> Features {
        Features::default()
    }
}

#[test]
fn test_model_features_extracted_once() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 1);
    let pipeline = Pipeline::from_config(model.clone(), PipelineConfig::default());
    assert_eq!(pipeline.model(), &model);
    assert!(pipeline.model_features().len() >= 20);
    assert_eq!(
        pipeline.model_features().keypoints.len(),
        pipeline.model_features().descriptors.len()
    );
}

#[test]
fn test_self_match_is_identity() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 1);
    let pipeline = Pipeline::from_config(model.clone(), PipelineConfig::default());

    let detection = pipeline.detect(&model);
    assert!(!detection.matches.is_empty());
    for m in &detection.matches {
        assert_eq!(m.distance, 0.0);
    }
    let found = detection.pose.detection().expect("model should find itself");
    assert_corners_close(
        &found.corners,
        &model_corners(MODEL_SIZE, MODEL_SIZE),
        1.0,
    );
}

#[test]
fn test_translated_model_is_located() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 2);
    let pipeline = Pipeline::from_config(model.clone(), PipelineConfig::default());
    let scene = translated_scene(&model);

    let detection = pipeline.detect(&scene);
    let found = detection.pose.detection().expect("translated model");
    assert!(found.inliers >= 10);
    assert_corners_close(&found.corners, &expected_translated_corners(), 3.0);
}

#[test]
fn test_scaled_model_is_located() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 2);
    let pipeline = Pipeline::from_config(model.clone(), PipelineConfig::default());
    let background = RgbImage::from_pixel(500, 500, Rgb([90, 90, 90]));
    let h = Homography::from_scale_translation(2.0, 50.0, 50.0);
    let scene = place_model(&background, &model, &h, WarpInterpolation::Bilinear);

    let detection = pipeline.detect(&scene);
    let found = detection.pose.detection().expect("scaled model");
    let expected = [
        Vec2::new(50.0, 50.0),
        Vec2::new(450.0, 50.0),
        Vec2::new(450.0, 450.0),
        Vec2::new(50.0, 450.0),
    ];
    assert_corners_close(&found.corners, &expected, 5.0);
}

#[test]
fn test_process_composites_overlay() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 2);
    let config = PipelineConfig {
        draw_outline: false,
        ..Default::default()
    };
    let pipeline = Pipeline::from_config(model.clone(), config);
    let scene = translated_scene(&model);
    // not model sized, gets resized before warping
    let overlay = RgbImage::from_pixel(50, 80, Rgb([255, 0, 0]));

    let output = pipeline.process(&scene, Some(&overlay));
    assert!(output.pose().is_valid());
    assert!(output.composited);
    assert_eq!(output.image.dimensions(), scene.dimensions());

    let center = output.image.get_pixel(OFFSET.0 + 100, OFFSET.1 + 100);
    assert!(center[0] > 200 && center[1] < 50 && center[2] < 50, "{:?}", center);
    // outside the model nothing changes
    assert_eq!(output.image.get_pixel(5, 5), scene.get_pixel(5, 5));
    assert_eq!(output.image.get_pixel(300, 300), scene.get_pixel(300, 300));

    let stats = output.stats(3);
    assert_eq!(stats.index, 3);
    assert!(stats.detected);
    assert!(stats.composited);
    assert_eq!(stats.matches, output.detection.matches.len());
    assert!(stats.inliers <= stats.matches);
}

#[test]
fn test_process_without_overlay_draws_outline() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 2);
    let config = PipelineConfig::default();
    let green = Rgb(config.outline_color);
    let pipeline = Pipeline::from_config(model.clone(), config);
    let scene = translated_scene(&model);

    let output = pipeline.process(&scene, None);
    assert!(output.pose().is_valid());
    assert!(!output.composited);

    // top edge midpoint
    let x = OFFSET.0 + MODEL_SIZE / 2;
    assert!(
        (OFFSET.1 - 3..=OFFSET.1 + 3).any(|y| *output.image.get_pixel(x, y) == green),
        "outline missing"
    );
    // model interior is untouched
    let (cx, cy) = (OFFSET.0 + 100, OFFSET.1 + 100);
    assert_eq!(output.image.get_pixel(cx, cy), scene.get_pixel(cx, cy));
}

#[test]
fn test_textureless_scene_passes_through() {
    let model = textured_model(MODEL_SIZE, MODEL_SIZE, 3);
    let pipeline = Pipeline::from_config(model, PipelineConfig::default());
    let scene = RgbImage::from_pixel(160, 120, Rgb([128, 128, 128]));
    let overlay = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));

    let output = pipeline.process(&scene, Some(&overlay));
    assert!(output.detection.scene_features.is_empty());
    assert!(matches!(
        output.pose(),
        PoseEstimate::Insufficient { matches: 0 }
    ));
    assert!(!output.composited);
    assert_eq!(output.image, scene);

    let stats = output.stats(0);
    assert!(!stats.detected);
    assert_eq!(stats.inliers, 0);
}

#[test]
fn test_custom_extractor() {
    let model = textured_model(64, 64, 4);
    let pipeline = Pipeline::new(model.clone(), NoFeatures, PipelineConfig::default());
    assert!(pipeline.model_features().is_empty());

    let output = pipeline.process(&model, None);
    assert!(output.detection.matches.is_empty());
    assert_eq!(*output.pose(), PoseEstimate::Insufficient { matches: 0 });
    assert_eq!(output.image, model);
}

#[test]
fn test_scale_image() {
    let img = RgbImage::from_pixel(100, 50, Rgb([1, 2, 3]));
    assert_eq!(scale_image(&img, 0.5).dimensions(), (50, 25));
    assert_eq!(scale_image(&img, 2.0).dimensions(), (200, 100));
    assert_eq!(scale_image(&img, 1.0), img);
    assert_eq!(scale_image(&img, 0.001).dimensions(), (1, 1));
}

#[test]
fn test_rectangle_count_large_targets() {
    assert_eq!(rectangle_count(1, 1), 15);
    assert_eq!(rectangle_count(MODEL_SIZE, MODEL_SIZE), 60);
    // 70000 * 70000 does not fit in u32
    assert_eq!(rectangle_count(70_000, 70_000), 490_000 * 15);
}
