use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_cross_mut, draw_hollow_circle_mut, draw_line_segment_mut};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::features::Keypoint;
use crate::matching::Match;

pub fn id_to_color(id: usize) -> Rgb<u8> {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    Rgb([
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
    ])
}

/// Crosses on every keypoint, coloured by detector response.
pub fn draw_keypoints(image: &RgbImage, keypoints: &[Keypoint]) -> RgbImage {
    let mut canvas = image.clone();
    let max_response = keypoints
        .iter()
        .map(|kp| kp.response)
        .fold(f32::MIN_POSITIVE, f32::max);
    for kp in keypoints {
        let c = colorous::TURBO.eval_continuous((kp.response / max_response).clamp(0.0, 1.0) as f64);
        let color = Rgb([c.r, c.g, c.b]);
        let (x, y) = (kp.point.x.round() as i32, kp.point.y.round() as i32);
        draw_cross_mut(&mut canvas, color, x, y);
        let radius = (kp.size / 2.0).round() as i32;
        if radius > 1 {
            draw_hollow_circle_mut(&mut canvas, (x, y), radius, color);
        }
    }
    canvas
}

/// Model on the left, scene on the right, one line per match.
pub fn draw_matches(
    model: &RgbImage,
    model_kps: &[Keypoint],
    scene: &RgbImage,
    scene_kps: &[Keypoint],
    matches: &[Match],
) -> RgbImage {
    let width = model.width() + scene.width();
    let height = model.height().max(scene.height());
    let mut canvas = RgbImage::new(width, height);
    image::imageops::replace(&mut canvas, model, 0, 0);
    image::imageops::replace(&mut canvas, scene, model.width() as i64, 0);

    let x_offset = model.width() as f32;
    for (i, m) in matches.iter().enumerate() {
        let (Some(a), Some(b)) = (model_kps.get(m.model_idx), scene_kps.get(m.scene_idx)) else {
            continue;
        };
        draw_line_segment_mut(
            &mut canvas,
            (a.point.x, a.point.y),
            (b.point.x + x_offset, b.point.y),
            id_to_color(i),
        );
    }
    canvas
}
