use image::{Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::compositor::composite;
use crate::config::WarpInterpolation;
use crate::estimation::Homography;

const RECTANGLES_PER_10K_PIXELS: u64 = 15;

/// Number of rectangles drawn by [`textured_model`] for a target of this size.
pub fn rectangle_count(width: u32, height: u32) -> u64 {
    (width as u64 * height as u64 / 10_000).max(1) * RECTANGLES_PER_10K_PIXELS
}

/// Deterministic planar target made of random overlapping rectangles.
///
/// No channel is ever zero, so the whole target survives the compositing mask.
pub fn textured_model(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut img = RgbImage::from_pixel(width, height, Rgb([200, 200, 200]));
    if width == 0 || height == 0 {
        return img;
    }
    let count = rectangle_count(width, height);
    for _ in 0..count {
        let w = rng.random_range(1..=(width / 4).max(1));
        let h = rng.random_range(1..=(height / 4).max(1));
        let x = rng.random_range(0..width) as i32;
        let y = rng.random_range(0..height) as i32;
        let color = Rgb([
            rng.random_range(20..=255u8),
            rng.random_range(20..=255u8),
            rng.random_range(20..=255u8),
        ]);
        draw_filled_rect_mut(&mut img, Rect::at(x, y).of_size(w, h), color);
    }
    img
}

/// Pastes `model` into `background` through `homography` (model to background coordinates).
pub fn place_model(
    background: &RgbImage,
    model: &RgbImage,
    homography: &Homography,
    interpolation: WarpInterpolation,
) -> RgbImage {
    composite(background, model, homography, interpolation)
}

/// Similarity transform: rotate by `angle` about the model centre, scale, then move the centre to `center`.
pub fn similarity(
    model_size: (u32, u32),
    scale: f64,
    angle: f64,
    center: (f64, f64),
) -> Option<Homography> {
    let (cx, cy) = (model_size.0 as f64 / 2.0, model_size.1 as f64 / 2.0);
    let (s, c) = angle.sin_cos();
    let m = nalgebra::Matrix3::new(
        scale * c,
        -scale * s,
        center.0 - scale * (c * cx - s * cy),
        scale * s,
        scale * c,
        center.1 - scale * (s * cx + c * cy),
        0.0,
        0.0,
        1.0,
    );
    Homography::from_matrix(m)
}
