//! Locating the model plane in a scene from descriptor matches.
//!
//! The estimator never fails loudly: too few matches, a fit without
//! consensus, or an outline that cannot be the image of a rectangle all come
//! back as tagged [`PoseEstimate`] variants so the caller decides whether to
//! composite.

use glam::{DVec2, Vec2};
use log::debug;

use crate::config::PoseConfig;
use crate::estimation::{Homography, HomographyError, fit_homography_ransac};
use crate::features::Keypoint;
use crate::matching::Match;

pub const MIN_CORRESPONDENCES: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// Maps model pixel coordinates to scene pixel coordinates.
    pub homography: Homography,
    /// Model corners in the scene: top-left, top-right, bottom-right, bottom-left.
    pub corners: [Vec2; 4],
    pub inliers: usize,
    pub matches: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegenerateReason {
    /// Every sample drawn was collinear or coincident.
    DegenerateSamples,
    /// The best hypothesis was supported by fewer than four correspondences.
    NoConsensus,
    /// A model corner maps to the line at infinity.
    CornerAtInfinity,
    /// The projected outline is not a convex quadrilateral.
    NonConvex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseEstimate {
    Valid(Detection),
    Insufficient { matches: usize },
    Degenerate(DegenerateReason),
}

impl PoseEstimate {
    pub fn detection(&self) -> Option<&Detection> {
        match self {
            PoseEstimate::Valid(d) => Some(d),
            _ => None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, PoseEstimate::Valid(_))
    }
}

/// Model bounding rectangle corners: (0,0), (w,0), (w,h), (0,h).
pub fn model_corners(width: u32, height: u32) -> [Vec2; 4] {
    let (w, h) = (width as f32, height as f32);
    [
        Vec2::new(0.0, 0.0),
        Vec2::new(w, 0.0),
        Vec2::new(w, h),
        Vec2::new(0.0, h),
    ]
}

/// Parallel model / scene point lists, skipping matches whose indices are out of range.
pub fn correspondences(
    model_kps: &[Keypoint],
    scene_kps: &[Keypoint],
    matches: &[Match],
) -> (Vec<DVec2>, Vec<DVec2>) {
    matches
        .iter()
        .filter_map(|m| {
            let model = model_kps.get(m.model_idx)?;
            let scene = scene_kps.get(m.scene_idx)?;
            Some((model.point.as_dvec2(), scene.point.as_dvec2()))
        })
        .unzip()
}

/// Projects the four corners, `None` if any lands at infinity.
pub fn project_corners(homography: &Homography, corners: &[Vec2; 4]) -> Option<[Vec2; 4]> {
    let mut out = [Vec2::ZERO; 4];
    for (o, c) in out.iter_mut().zip(corners) {
        *o = homography.project_f32(*c)?;
    }
    Some(out)
}

/// Strictly convex and not self-intersecting, in either winding order.
pub fn is_convex_quad(quad: &[Vec2; 4]) -> bool {
    let mut sign = 0.0f32;
    for i in 0..4 {
        let a = quad[i];
        let b = quad[(i + 1) % 4];
        let c = quad[(i + 2) % 4];
        let cross = (b - a).perp_dot(c - b);
        if !cross.is_finite() || cross.abs() <= f32::EPSILON {
            return false;
        }
        if sign == 0.0 {
            sign = cross.signum();
        } else if cross.signum() != sign {
            return false;
        }
    }
    true
}

/// Fits the model-to-scene homography and projects the model outline.
pub fn locate_object(
    model_size: (u32, u32),
    model_kps: &[Keypoint],
    scene_kps: &[Keypoint],
    matches: &[Match],
    config: &PoseConfig,
) -> PoseEstimate {
    let (model_pts, scene_pts) = correspondences(model_kps, scene_kps, matches);
    if model_pts.len() < MIN_CORRESPONDENCES {
        return PoseEstimate::Insufficient {
            matches: model_pts.len(),
        };
    }

    let fit = match fit_homography_ransac(&model_pts, &scene_pts, &config.ransac) {
        Ok(fit) => fit,
        Err(HomographyError::TooFewPoints { got, .. }) => {
            return PoseEstimate::Insufficient { matches: got };
        }
        Err(HomographyError::NoConsensus { inliers }) => {
            debug!("no consensus, best support {}", inliers);
            return PoseEstimate::Degenerate(DegenerateReason::NoConsensus);
        }
        Err(e) => {
            debug!("homography fit failed: {}", e);
            return PoseEstimate::Degenerate(DegenerateReason::DegenerateSamples);
        }
    };

    let corners = model_corners(model_size.0, model_size.1);
    let Some(corners) = project_corners(&fit.homography, &corners) else {
        return PoseEstimate::Degenerate(DegenerateReason::CornerAtInfinity);
    };
    if config.reject_non_convex && !is_convex_quad(&corners) {
        debug!("projected outline is not convex: {:?}", corners);
        return PoseEstimate::Degenerate(DegenerateReason::NonConvex);
    }

    PoseEstimate::Valid(Detection {
        homography: fit.homography,
        corners,
        inliers: fit.num_inliers,
        matches: model_pts.len(),
    })
}
