//! Attribute similarity between a track and a feature target.

use super::model::{FeatureTarget, TrackCandidate, TrackFeatures};

/// Per-dimension weights: positivity, intensity, danceability.
const WEIGHTS: [f64; 3] = [0.40, 0.35, 0.25];

/// Weighted Euclidean distance between two feature points.
pub fn weighted_distance(a: &TrackFeatures, b: &TrackFeatures) -> f64 {
    let deltas = [
        a.positivity - b.positivity,
        a.intensity - b.intensity,
        a.danceability - b.danceability,
    ];
    deltas
        .iter()
        .zip(WEIGHTS)
        .map(|(d, w)| w * d * d)
        .sum::<f64>()
        .sqrt()
}

/// Similarity in `0.0..=1.0`; 1.0 means identical features.
///
/// The largest possible distance on the unit cube is `sqrt(sum(weights))`,
/// which normalizes the result.
pub fn similarity(target: &FeatureTarget, features: &TrackFeatures) -> f64 {
    let max = WEIGHTS.iter().sum::<f64>().sqrt();
    (1.0 - weighted_distance(&target.features(), features) / max).clamp(0.0, 1.0)
}

/// Score assigned from a catalog's own ranking when features are unknown.
///
/// Rank 0 scores 1.0 and the score decays linearly towards 0.5 at the end
/// of the result page, so measured similarity still dominates.
pub fn rank_score(rank: usize, page_len: usize) -> f64 {
    if page_len <= 1 {
        return 1.0;
    }
    1.0 - 0.5 * (rank.min(page_len - 1) as f64 / (page_len - 1) as f64)
}

/// Replace rank-derived scores with measured similarity where possible.
pub fn rescore(candidates: &mut [TrackCandidate], target: &FeatureTarget) {
    for candidate in candidates.iter_mut() {
        if let Some(features) = &candidate.features {
            candidate.attributes_score = similarity(target, features);
        }
    }
}
