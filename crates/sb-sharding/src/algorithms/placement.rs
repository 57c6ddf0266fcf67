//! Incremental nearest-centroid placement.
//!
//! A single validator joining an already-partitioned network does not force
//! a full recompute: it lands in the shard whose centroid is nearest in
//! feature space. Full recomputation is reserved for bulk joins and explicit
//! recluster calls.

use crate::domain::FeatureVector;
use shared_types::ShardId;

/// The shard whose centroid is Euclidean-nearest to `feature`; `None` when
/// no centroids exist.
pub fn nearest_shard(
    feature: &FeatureVector,
    centroids: &[(ShardId, FeatureVector)],
) -> Option<ShardId> {
    centroids
        .iter()
        .min_by(|(_, a), (_, b)| feature.distance(a).total_cmp(&feature.distance(b)))
        .map(|(shard, _)| *shard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_picks_nearest_centroid() {
        let centroids = vec![
            (0u16, FeatureVector([1.0, 0.5, 100.0])),
            (1u16, FeatureVector([8.0, 0.9, 400.0])),
        ];
        let joining = FeatureVector([7.5, 0.8, 390.0]);
        assert_eq!(nearest_shard(&joining, &centroids), Some(1));
    }

    #[test]
    fn test_exact_match_wins() {
        let centroids = vec![
            (3u16, FeatureVector([1.0, 1.0, 1.0])),
            (4u16, FeatureVector([2.0, 2.0, 2.0])),
        ];
        assert_eq!(
            nearest_shard(&FeatureVector([2.0, 2.0, 2.0]), &centroids),
            Some(4)
        );
    }

    #[test]
    fn test_no_centroids() {
        assert_eq!(nearest_shard(&FeatureVector::default(), &[]), None);
    }
}
