use glam::DVec2;
use log::debug;
use rand::SeedableRng;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

use super::homography::{Homography, HomographyError, homography_dlt, is_degenerate_sample};
use crate::config::RansacConfig;

const SAMPLE_SIZE: usize = 4;
/// Consecutive degenerate samples tolerated before giving up.
const MAX_DEGENERATE_DRAWS: usize = 100;

#[derive(Debug, Clone)]
pub struct RansacHomography {
    pub homography: Homography,
    pub inlier_mask: Vec<bool>,
    pub num_inliers: usize,
    pub iterations: usize,
}

fn inlier_mask(h: &Homography, src: &[DVec2], dst: &[DVec2], threshold: f64) -> (Vec<bool>, usize) {
    let mask: Vec<bool> = src
        .iter()
        .zip(dst)
        .map(|(s, d)| h.reprojection_error(*s, *d) <= threshold)
        .collect();
    let count = mask.iter().filter(|m| **m).count();
    (mask, count)
}

/// Iterations needed to draw one outlier free sample with probability `confidence`.
fn adaptive_iterations(inlier_ratio: f64, confidence: f64, max_iterations: usize) -> usize {
    let all_inliers = inlier_ratio.powi(SAMPLE_SIZE as i32);
    if all_inliers <= f64::EPSILON {
        return max_iterations;
    }
    if all_inliers >= 1.0 - f64::EPSILON {
        return 1;
    }
    let k = (1.0 - confidence).ln() / (1.0 - all_inliers).ln();
    if k.is_finite() && k >= 0.0 {
        (k.ceil() as usize).clamp(1, max_iterations)
    } else {
        max_iterations
    }
}

/// Robust homography fit: random 4-point DLT hypotheses scored by inlier count,
/// then a DLT refit on the best inlier set.
pub fn fit_homography_ransac(
    src: &[DVec2],
    dst: &[DVec2],
    config: &RansacConfig,
) -> Result<RansacHomography, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < SAMPLE_SIZE {
        return Err(HomographyError::TooFewPoints {
            needed: SAMPLE_SIZE,
            got: n,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut best: Option<(Homography, usize)> = None;
    let mut needed_iterations = config.max_iterations.max(1);
    let mut iterations = 0;
    let mut degenerate_draws = 0;

    while iterations < needed_iterations {
        let idx = sample(&mut rng, n, SAMPLE_SIZE);
        let s = [src[idx.index(0)], src[idx.index(1)], src[idx.index(2)], src[idx.index(3)]];
        let d = [dst[idx.index(0)], dst[idx.index(1)], dst[idx.index(2)], dst[idx.index(3)]];
        if is_degenerate_sample(&s) || is_degenerate_sample(&d) {
            degenerate_draws += 1;
            if degenerate_draws >= MAX_DEGENERATE_DRAWS {
                break;
            }
            continue;
        }
        degenerate_draws = 0;
        iterations += 1;

        let Ok(h) = homography_dlt(&s, &d) else {
            continue;
        };
        let (_, count) = inlier_mask(&h, src, dst, config.reprojection_threshold);
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((h, count));
            needed_iterations = adaptive_iterations(
                count as f64 / n as f64,
                config.confidence,
                config.max_iterations.max(1),
            );
        }
    }

    let Some((sample_h, sample_count)) = best else {
        debug!("ransac drew only degenerate samples");
        return Err(HomographyError::Degenerate);
    };
    if sample_count < SAMPLE_SIZE {
        return Err(HomographyError::NoConsensus {
            inliers: sample_count,
        });
    }

    let (sample_mask, _) = inlier_mask(&sample_h, src, dst, config.reprojection_threshold);
    let (in_src, in_dst): (Vec<DVec2>, Vec<DVec2>) = src
        .iter()
        .zip(dst)
        .zip(&sample_mask)
        .filter(|(_, m)| **m)
        .map(|((s, d), _)| (*s, *d))
        .unzip();

    // keep the refit only if it does not lose support
    let homography = match homography_dlt(&in_src, &in_dst) {
        Ok(refit) => {
            let (_, refit_count) = inlier_mask(&refit, src, dst, config.reprojection_threshold);
            if refit_count >= sample_count {
                refit
            } else {
                sample_h
            }
        }
        Err(_) => sample_h,
    };
    let (mask, num_inliers) = inlier_mask(&homography, src, dst, config.reprojection_threshold);
    debug!(
        "ransac: {} / {} inliers after {} iterations",
        num_inliers, n, iterations
    );
    Ok(RansacHomography {
        homography,
        inlier_mask: mask,
        num_inliers,
        iterations,
    })
}
