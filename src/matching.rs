use bitarray::BitArray;
use rayon::prelude::*;
use space::{Knn, LinearKnn, Metric, Neighbor};

/// Lowe's ratio between the best and the second best neighbour distance.
pub const LOWES_RATIO: f32 = 0.75;

/// A model descriptor paired with the scene descriptor it was matched to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub model_idx: usize,
    pub scene_idx: usize,
    pub distance: f32,
}

pub trait DescriptorDistance {
    fn distance(&self, other: &Self) -> f32;
}

/// Hamming distance.
impl<const B: usize> DescriptorDistance for BitArray<B> {
    fn distance(&self, other: &Self) -> f32 {
        BitArray::distance(self, other) as f32
    }
}

/// Euclidean distance.
impl DescriptorDistance for Vec<f32> {
    fn distance(&self, other: &Self) -> f32 {
        self.iter()
            .zip(other.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f32>()
            .sqrt()
    }
}

/// [`DescriptorDistance`] as a `space` metric.
///
/// Distances are never negative, so their bit patterns sort like the values.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescriptorMetric;

impl<D: DescriptorDistance> Metric<D> for DescriptorMetric {
    type Unit = u32;

    fn distance(&self, a: &D, b: &D) -> u32 {
        a.distance(b).to_bits()
    }
}

/// Exhaustive search for the two closest descriptors.
fn two_nearest<D: DescriptorDistance>(
    query: &D,
    candidates: &[D],
) -> Option<(Neighbor<u32>, Neighbor<u32>)> {
    let knn = LinearKnn {
        metric: DescriptorMetric,
        iter: candidates.iter(),
    };
    let mut neighbors = knn.knn(query, 2).into_iter();
    Some((neighbors.next()?, neighbors.next()?))
}

/// Matches every model descriptor against the scene descriptors with Lowe's ratio test.
///
/// A match is kept only if `best < ratio * second_best`. The result follows the
/// order of `model`. Either side being empty, or the scene holding a single
/// descriptor, gives no matches.
pub fn match_descriptors<D>(model: &[D], scene: &[D], ratio: f32) -> Vec<Match>
where
    D: DescriptorDistance + Sync,
{
    if model.is_empty() || scene.is_empty() {
        return Vec::new();
    }
    let matches: Vec<Match> = model
        .par_iter()
        .enumerate()
        .filter_map(|(model_idx, query)| {
            let (best, second) = two_nearest(query, scene)?;
            let best_distance = f32::from_bits(best.distance);
            if best_distance < ratio * f32::from_bits(second.distance) {
                Some(Match {
                    model_idx,
                    scene_idx: best.index,
                    distance: best_distance,
                })
            } else {
                None
            }
        })
        .collect();
    log::debug!(
        "{} of {} model descriptors passed the ratio test",
        matches.len(),
        model.len()
    );
    matches
}
