//! Lloyd's k-means with k-means++ seeding, plus the silhouette index used
//! as the cluster-separation score.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn squared_distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

fn distance<const D: usize>(a: &[f64; D], b: &[f64; D]) -> f64 {
    squared_distance(a, b).sqrt()
}

/// Cluster `points` into `k` groups; returns one label in `0..k` per point.
///
/// Deterministic for a fixed `(points, k, seed)`. `k` is clamped to the
/// point count; `k == 0` labels everything 0.
pub fn kmeans<const D: usize>(
    points: &[[f64; D]],
    k: usize,
    seed: u64,
    max_iterations: usize,
) -> Vec<usize> {
    let n = points.len();
    let k = k.min(n);
    if n == 0 || k <= 1 {
        return vec![0; n];
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut labels = vec![0usize; n];

    for _ in 0..max_iterations.max(1) {
        let mut changed = false;
        for (index, point) in points.iter().enumerate() {
            let nearest = nearest_centroid(point, &centroids);
            if labels[index] != nearest {
                labels[index] = nearest;
                changed = true;
            }
        }

        recompute_centroids(points, &labels, &mut centroids);
        if !changed {
            break;
        }
    }

    labels
}

/// k-means++ seeding: each next centroid is drawn weighted by squared
/// distance to the nearest already-chosen one.
fn seed_centroids<const D: usize>(
    points: &[[f64; D]],
    k: usize,
    rng: &mut StdRng,
) -> Vec<[f64; D]> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.gen_range(0..points.len())]);

    while centroids.len() < k {
        let weights: Vec<f64> = points
            .iter()
            .map(|point| {
                centroids
                    .iter()
                    .map(|centroid| squared_distance(point, centroid))
                    .fold(f64::INFINITY, f64::min)
            })
            .collect();
        let total: f64 = weights.iter().sum();
        if total <= f64::EPSILON {
            // All remaining points coincide with a centroid; duplicate one.
            centroids.push(points[0]);
            continue;
        }
        let mut target = rng.gen::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (index, weight) in weights.iter().enumerate() {
            target -= weight;
            if target <= 0.0 {
                chosen = index;
                break;
            }
        }
        centroids.push(points[chosen]);
    }
    centroids
}

fn nearest_centroid<const D: usize>(point: &[f64; D], centroids: &[[f64; D]]) -> usize {
    let mut best = 0;
    let mut best_distance = f64::INFINITY;
    for (index, centroid) in centroids.iter().enumerate() {
        let d = squared_distance(point, centroid);
        if d < best_distance {
            best_distance = d;
            best = index;
        }
    }
    best
}

fn recompute_centroids<const D: usize>(
    points: &[[f64; D]],
    labels: &[usize],
    centroids: &mut [[f64; D]],
) {
    let k = centroids.len();
    let mut sums = vec![[0.0; D]; k];
    let mut counts = vec![0usize; k];
    for (point, &label) in points.iter().zip(labels.iter()) {
        counts[label] += 1;
        for (axis, value) in sums[label].iter_mut().zip(point.iter()) {
            *axis += value;
        }
    }
    for (cluster, centroid) in centroids.iter_mut().enumerate() {
        if counts[cluster] == 0 {
            // Empty cluster keeps its previous centroid.
            continue;
        }
        for (axis, sum) in centroid.iter_mut().zip(sums[cluster].iter()) {
            *axis = sum / counts[cluster] as f64;
        }
    }
}

/// Mean silhouette coefficient of a labeling; higher is better separation.
///
/// Points in singleton clusters score 0; fewer than two distinct clusters
/// score 0 overall.
pub fn silhouette<const D: usize>(points: &[[f64; D]], labels: &[usize], k: usize) -> f64 {
    let n = points.len();
    if n < 2 || k < 2 {
        return 0.0;
    }

    let mut cluster_sizes = vec![0usize; k];
    for &label in labels {
        cluster_sizes[label] += 1;
    }
    if cluster_sizes.iter().filter(|&&size| size > 0).count() < 2 {
        return 0.0;
    }

    let mut total = 0.0;
    for i in 0..n {
        if cluster_sizes[labels[i]] <= 1 {
            continue;
        }

        // Mean distance to every cluster.
        let mut sums = vec![0.0; k];
        for j in 0..n {
            if i == j {
                continue;
            }
            sums[labels[j]] += distance(&points[i], &points[j]);
        }

        let own = labels[i];
        let a = sums[own] / (cluster_sizes[own] - 1) as f64;
        let b = (0..k)
            .filter(|&cluster| cluster != own && cluster_sizes[cluster] > 0)
            .map(|cluster| sums[cluster] / cluster_sizes[cluster] as f64)
            .fold(f64::INFINITY, f64::min);
        if b.is_finite() {
            total += (b - a) / a.max(b);
        }
    }
    total / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated blobs on a plane.
    fn blobs() -> Vec<[f64; 2]> {
        let mut points = Vec::new();
        for i in 0..8 {
            points.push([0.1 * i as f64, 0.1 * i as f64]);
            points.push([10.0 + 0.1 * i as f64, 10.0 - 0.1 * i as f64]);
        }
        points
    }

    #[test]
    fn test_kmeans_deterministic_for_seed() {
        let points = blobs();
        assert_eq!(kmeans(&points, 2, 7, 100), kmeans(&points, 2, 7, 100));
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let points = blobs();
        let labels = kmeans(&points, 2, 7, 100);
        // Even-index points form one blob, odd-index the other.
        let first = labels[0];
        let second = labels[1];
        assert_ne!(first, second);
        for (index, &label) in labels.iter().enumerate() {
            let expected = if index % 2 == 0 { first } else { second };
            assert_eq!(label, expected, "point {index} mislabeled");
        }
    }

    #[test]
    fn test_kmeans_labels_in_range() {
        let points = blobs();
        for k in 1..=5 {
            let labels = kmeans(&points, k, 3, 50);
            assert!(labels.iter().all(|&label| label < k.max(1)));
            assert_eq!(labels.len(), points.len());
        }
    }

    #[test]
    fn test_kmeans_degenerate_inputs() {
        let empty: Vec<[f64; 2]> = Vec::new();
        assert!(kmeans(&empty, 3, 1, 10).is_empty());
        let one = vec![[1.0, 2.0]];
        assert_eq!(kmeans(&one, 3, 1, 10), vec![0]);
    }

    #[test]
    fn test_silhouette_rewards_separation() {
        let points = blobs();
        let good = kmeans(&points, 2, 7, 100);
        let score = silhouette(&points, &good, 2);
        assert!(score > 0.8, "well-separated blobs scored {score}");

        // A deliberately mixed labeling scores worse.
        let bad: Vec<usize> = (0..points.len()).map(|i| (i / 2) % 2).collect();
        assert!(silhouette(&points, &bad, 2) < score);
    }

    #[test]
    fn test_silhouette_degenerate_is_zero() {
        let points = blobs();
        let labels = vec![0; points.len()];
        assert_eq!(silhouette(&points, &labels, 1), 0.0);
        assert_eq!(silhouette(&points, &labels, 2), 0.0);
    }
}
