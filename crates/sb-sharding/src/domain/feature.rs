//! Resource feature space.

use serde::{Deserialize, Serialize};
use shared_types::ResourceProfile;

/// A validator's position in resource-feature space:
/// `(cpu_rating, reputation_score, ram_usage)`.
///
/// The k-means policy clusters on the `(cpu_rating, ram_usage)` plane; the
/// Ward policy uses all three axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct FeatureVector(pub [f64; 3]);

impl FeatureVector {
    /// Extract the feature vector of a validator profile.
    pub fn from_profile(profile: &ResourceProfile) -> Self {
        Self([profile.cpu_rating, profile.reputation_score, profile.ram_usage])
    }

    /// Projection onto the `(cpu_rating, ram_usage)` plane.
    pub fn cpu_ram(&self) -> [f64; 2] {
        [self.0[0], self.0[2]]
    }

    /// Euclidean distance to another feature vector.
    pub fn distance(&self, other: &FeatureVector) -> f64 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Component-wise mean of a set of feature vectors; `None` when empty.
    pub fn centroid(points: &[FeatureVector]) -> Option<FeatureVector> {
        if points.is_empty() {
            return None;
        }
        let mut sum = [0.0; 3];
        for point in points {
            for (axis, value) in sum.iter_mut().zip(point.0.iter()) {
                *axis += value;
            }
        }
        let count = points.len() as f64;
        Some(FeatureVector([sum[0] / count, sum[1] / count, sum[2] / count]))
    }
}
