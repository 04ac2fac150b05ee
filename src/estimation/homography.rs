use glam::{DVec2, Vec2};
use nalgebra as na;
use thiserror::Error;

const EPS: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HomographyError {
    #[error("too few correspondences: need {needed}, got {got}")]
    TooFewPoints { needed: usize, got: usize },
    #[error("source and destination point counts differ: {src} vs {dst}")]
    LengthMismatch { src: usize, dst: usize },
    #[error("degenerate point configuration")]
    Degenerate,
    #[error("no consensus: best sample had {inliers} inliers")]
    NoConsensus { inliers: usize },
}

/// A finite, invertible plane-to-plane projective transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Homography(na::Matrix3<f64>);

impl Homography {
    pub fn identity() -> Homography {
        Homography(na::Matrix3::identity())
    }

    /// Wraps a matrix, rejecting non-finite or singular ones.
    ///
    /// The matrix is scaled so that `h[(2, 2)] == 1` when that entry is not zero.
    pub fn from_matrix(mat: na::Matrix3<f64>) -> Option<Homography> {
        if mat.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let scale = mat[(2, 2)];
        let mat = if scale.abs() > EPS { mat / scale } else { mat };
        let norm = mat.norm();
        if norm < EPS || (mat.determinant() / norm.powi(3)).abs() < EPS {
            return None;
        }
        Some(Homography(mat))
    }

    pub fn from_scale_translation(scale: f64, tx: f64, ty: f64) -> Homography {
        Homography(na::Matrix3::new(scale, 0.0, tx, 0.0, scale, ty, 0.0, 0.0, 1.0))
    }

    pub fn matrix(&self) -> &na::Matrix3<f64> {
        &self.0
    }

    pub fn inverse(&self) -> Option<Homography> {
        self.0.try_inverse().and_then(Homography::from_matrix)
    }

    /// `self` applied after `other`.
    pub fn compose(&self, other: &Homography) -> Option<Homography> {
        Homography::from_matrix(self.0 * other.0)
    }

    /// Maps a point, `None` when it lands on the line at infinity.
    pub fn project(&self, p: DVec2) -> Option<DVec2> {
        let v = self.0 * na::Vector3::new(p.x, p.y, 1.0);
        if v[2].abs() < EPS || !v[0].is_finite() || !v[1].is_finite() {
            return None;
        }
        Some(DVec2::new(v[0] / v[2], v[1] / v[2]))
    }

    pub fn project_f32(&self, p: Vec2) -> Option<Vec2> {
        self.project(p.as_dvec2()).map(|q| q.as_vec2())
    }

    pub fn reprojection_error(&self, src: DVec2, dst: DVec2) -> f64 {
        self.project(src)
            .map(|p| p.distance(dst))
            .unwrap_or(f64::INFINITY)
    }

    /// Row-major single precision copy, the layout imageproc projections use.
    pub fn to_row_major_f32(&self) -> [f32; 9] {
        let m = &self.0;
        [
            m[(0, 0)] as f32,
            m[(0, 1)] as f32,
            m[(0, 2)] as f32,
            m[(1, 0)] as f32,
            m[(1, 1)] as f32,
            m[(1, 2)] as f32,
            m[(2, 0)] as f32,
            m[(2, 1)] as f32,
            m[(2, 2)] as f32,
        ]
    }
}

/// Translates the centroid to the origin and scales the mean distance to sqrt(2).
fn normalize_points(pts: &[DVec2]) -> (na::Matrix3<f64>, Vec<DVec2>) {
    let n = pts.len() as f64;
    let centroid = pts.iter().copied().sum::<DVec2>() / n;
    let mean_dist = pts.iter().map(|p| p.distance(centroid)).sum::<f64>() / n;
    let s = if mean_dist > EPS {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    let t = na::Matrix3::new(
        s,
        0.0,
        -s * centroid.x,
        0.0,
        s,
        -s * centroid.y,
        0.0,
        0.0,
        1.0,
    );
    let normalized = pts.iter().map(|p| (*p - centroid) * s).collect();
    (t, normalized)
}

/// Direct linear transform with Hartley normalization, `dst ≈ H * src`.
pub fn homography_dlt(src: &[DVec2], dst: &[DVec2]) -> Result<Homography, HomographyError> {
    if src.len() != dst.len() {
        return Err(HomographyError::LengthMismatch {
            src: src.len(),
            dst: dst.len(),
        });
    }
    let n = src.len();
    if n < 4 {
        return Err(HomographyError::TooFewPoints { needed: 4, got: n });
    }

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    let mut a = na::DMatrix::<f64>::zeros(2 * n, 9);
    for (i, (s, d)) in src_n.iter().zip(dst_n.iter()).enumerate() {
        a[(2 * i, 3)] = -s.x;
        a[(2 * i, 4)] = -s.y;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = d.y * s.x;
        a[(2 * i, 7)] = d.y * s.y;
        a[(2 * i, 8)] = d.y;

        a[(2 * i + 1, 0)] = s.x;
        a[(2 * i + 1, 1)] = s.y;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -d.x * s.x;
        a[(2 * i + 1, 7)] = -d.x * s.y;
        a[(2 * i + 1, 8)] = -d.x;
    }

    // null vector of A is the eigenvector of AᵀA with the smallest eigenvalue
    let ata = a.transpose() * &a;
    let eig = na::SymmetricEigen::new(ata);
    let (min_idx, _) = eig
        .eigenvalues
        .iter()
        .enumerate()
        .fold((0, f64::MAX), |(bi, bv), (i, v)| {
            if v.abs() < bv { (i, v.abs()) } else { (bi, bv) }
        });
    let h = eig.eigenvectors.column(min_idx);
    let h_norm = na::Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], h[8]);

    let t_dst_inv = t_dst.try_inverse().ok_or(HomographyError::Degenerate)?;
    Homography::from_matrix(t_dst_inv * h_norm * t_src).ok_or(HomographyError::Degenerate)
}

fn triangle_area2(a: DVec2, b: DVec2, c: DVec2) -> f64 {
    (b - a).perp_dot(c - a)
}

/// True when any three of the four points are (nearly) collinear.
pub fn is_degenerate_sample(pts: &[DVec2; 4]) -> bool {
    let scale = pts
        .iter()
        .flat_map(|p| pts.iter().map(move |q| p.distance_squared(*q)))
        .fold(0.0, f64::max);
    if scale < EPS {
        return true;
    }
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES
        .iter()
        .any(|t| triangle_area2(pts[t[0]], pts[t[1]], pts[t[2]]).abs() < 1e-6 * scale)
}
