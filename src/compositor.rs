use glam::Vec2;
use image::{GrayImage, Rgb, RgbImage};
use imageproc::contrast::threshold;
use imageproc::drawing::draw_line_segment_mut;
use imageproc::geometric_transformations::{Projection, warp_into};

use crate::config::WarpInterpolation;
use crate::estimation::Homography;

/// Warps `input` through `homography` into a `width` x `height` canvas.
///
/// Pixels with no source stay black. Returns `None` when the transform cannot
/// be inverted in single precision.
pub fn warp_image(
    input: &RgbImage,
    homography: &Homography,
    width: u32,
    height: u32,
    interpolation: WarpInterpolation,
) -> Option<RgbImage> {
    let projection = Projection::from_matrix(homography.to_row_major_f32())?;
    let mut out = RgbImage::new(width, height);
    warp_into(
        input,
        &projection,
        interpolation.into(),
        Rgb([0, 0, 0]),
        &mut out,
    );
    Some(out)
}

/// 255 wherever the warped overlay has non-zero intensity.
pub fn overlay_mask(warped: &RgbImage) -> GrayImage {
    let gray = image::imageops::grayscale(warped);
    threshold(&gray, 0)
}

/// Copies `scene` into `output` and pastes the warped overlay over it.
///
/// Only `output` is modified. Returns `false`, leaving a plain copy of the
/// scene, when the overlay could not be warped.
pub fn composite_into(
    scene: &RgbImage,
    overlay: &RgbImage,
    homography: &Homography,
    interpolation: WarpInterpolation,
    output: &mut RgbImage,
) -> bool {
    output.clone_from(scene);
    let (width, height) = scene.dimensions();
    let Some(warped) = warp_image(overlay, homography, width, height, interpolation) else {
        log::debug!("overlay warp skipped, transform not invertible");
        return false;
    };
    let mask = overlay_mask(&warped);
    for ((out_px, warped_px), mask_px) in output
        .pixels_mut()
        .zip(warped.pixels())
        .zip(mask.pixels())
    {
        if mask_px[0] != 0 {
            *out_px = *warped_px;
        }
    }
    true
}

pub fn composite(
    scene: &RgbImage,
    overlay: &RgbImage,
    homography: &Homography,
    interpolation: WarpInterpolation,
) -> RgbImage {
    let mut output = RgbImage::new(scene.width(), scene.height());
    composite_into(scene, overlay, homography, interpolation, &mut output);
    output
}

pub const MAX_OUTLINE_THICKNESS: u32 = 32;

/// Draws the closed outline through the four corners.
///
/// `thickness` is clamped to `1..=MAX_OUTLINE_THICKNESS`.
pub fn draw_contour(image: &mut RgbImage, corners: &[Vec2; 4], color: Rgb<u8>, thickness: u32) {
    let thickness = thickness.clamp(1, MAX_OUTLINE_THICKNESS) as i32;
    let lo = -(thickness - 1) / 2;
    let hi = lo + thickness;
    for i in 0..4 {
        let a = corners[i];
        let b = corners[(i + 1) % 4];
        if !a.is_finite() || !b.is_finite() {
            continue;
        }
        for dy in lo..hi {
            for dx in lo..hi {
                let offset = Vec2::new(dx as f32, dy as f32);
                let (s, e) = (a + offset, b + offset);
                draw_line_segment_mut(image, (s.x, s.y), (e.x, e.y), color);
            }
        }
    }
}
