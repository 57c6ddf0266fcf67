//! Agglomerative clustering with Ward linkage, and the size-repair pass
//! that keeps group sizes inside a shard's `[min, max]` bounds.

use tracing::warn;

/// Cluster `points` hierarchically into exactly `clusters` groups using Ward
/// linkage (Lance–Williams update); returns one label in `0..clusters` per
/// point.
///
/// Naive O(n^3) merging; populations here are simulation-scale.
pub fn ward<const D: usize>(points: &[[f64; D]], clusters: usize) -> Vec<usize> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }
    let clusters = clusters.clamp(1, n);

    // Active cluster state: member lists and pairwise Ward distances.
    let mut members: Vec<Option<Vec<usize>>> = (0..n).map(|i| Some(vec![i])).collect();
    let mut sizes: Vec<usize> = vec![1; n];
    let mut distances = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d: f64 = points[i]
                .iter()
                .zip(points[j].iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum();
            distances[i][j] = d;
            distances[j][i] = d;
        }
    }

    let mut active = n;
    while active > clusters {
        // Closest active pair.
        let mut best = (0, 0);
        let mut best_distance = f64::INFINITY;
        for i in 0..n {
            if members[i].is_none() {
                continue;
            }
            for j in (i + 1)..n {
                if members[j].is_none() {
                    continue;
                }
                if distances[i][j] < best_distance {
                    best_distance = distances[i][j];
                    best = (i, j);
                }
            }
        }

        let (keep, drop) = best;
        // Lance-Williams update for Ward linkage.
        let (size_keep, size_drop) = (sizes[keep] as f64, sizes[drop] as f64);
        for other in 0..n {
            if other == keep || other == drop || members[other].is_none() {
                continue;
            }
            let size_other = sizes[other] as f64;
            let denominator = size_keep + size_drop + size_other;
            let updated = ((size_keep + size_other) * distances[keep][other]
                + (size_drop + size_other) * distances[drop][other]
                - size_other * distances[keep][drop])
                / denominator;
            distances[keep][other] = updated;
            distances[other][keep] = updated;
        }

        let absorbed = members[drop].take().unwrap_or_default();
        if let Some(kept) = members[keep].as_mut() {
            kept.extend(absorbed);
        }
        sizes[keep] += sizes[drop];
        active -= 1;
    }

    let mut labels = vec![0usize; n];
    for (label, group) in members.iter().flatten().enumerate() {
        for &point in group {
            labels[point] = label;
        }
    }
    labels
}

/// Repair a labeling so every group size lands in `[min, max]` when the
/// population allows it.
///
/// Undersized groups first pull their nearest points from groups that can
/// spare them; oversized groups then shed their farthest members to the
/// nearest group with room. Mirrors the nearest-centroid re-homing the
/// clustering model applies to outliers.
pub fn enforce_size_bounds<const D: usize>(
    points: &[[f64; D]],
    labels: &mut [usize],
    groups: usize,
    min: usize,
    max: usize,
) {
    if groups <= 1 {
        return;
    }

    // Fill undersized groups by pulling nearest members from donors above min.
    loop {
        let sizes = group_sizes(labels, groups);
        let Some(needy) = sizes.iter().position(|&size| size > 0 && size < min) else {
            break;
        };
        let centroid = centroid_of(points, labels, needy);
        let candidate = (0..points.len())
            .filter(|&i| labels[i] != needy && sizes[labels[i]] > min)
            .min_by(|&a, &b| {
                distance_to(&points[a], &centroid).total_cmp(&distance_to(&points[b], &centroid))
            });
        match candidate {
            Some(point) => labels[point] = needy,
            None => {
                warn!(group = needy, "cannot fill undersized shard within bounds");
                break;
            }
        }
    }

    // Shed oversized groups into the nearest group with room.
    loop {
        let sizes = group_sizes(labels, groups);
        let Some(swollen) = sizes.iter().position(|&size| size > max) else {
            break;
        };
        let centroid = centroid_of(points, labels, swollen);
        let Some(outcast) = (0..points.len())
            .filter(|&i| labels[i] == swollen)
            .max_by(|&a, &b| {
                distance_to(&points[a], &centroid).total_cmp(&distance_to(&points[b], &centroid))
            })
        else {
            break;
        };
        let target = (0..groups)
            .filter(|&group| group != swollen && sizes[group] < max)
            .min_by(|&a, &b| {
                let da = distance_to(&points[outcast], &centroid_of(points, labels, a));
                let db = distance_to(&points[outcast], &centroid_of(points, labels, b));
                da.total_cmp(&db)
            });
        match target {
            Some(group) => labels[outcast] = group,
            None => {
                warn!(group = swollen, "cannot shed oversized shard within bounds");
                break;
            }
        }
    }
}

fn group_sizes(labels: &[usize], groups: usize) -> Vec<usize> {
    let mut sizes = vec![0usize; groups];
    for &label in labels {
        sizes[label] += 1;
    }
    sizes
}

fn centroid_of<const D: usize>(points: &[[f64; D]], labels: &[usize], group: usize) -> [f64; D] {
    let mut sum = [0.0; D];
    let mut count = 0usize;
    for (point, &label) in points.iter().zip(labels.iter()) {
        if label == group {
            for (axis, value) in sum.iter_mut().zip(point.iter()) {
                *axis += value;
            }
            count += 1;
        }
    }
    if count > 0 {
        for axis in sum.iter_mut() {
            *axis /= count as f64;
        }
    }
    sum
}

fn distance_to<const D: usize>(point: &[f64; D], centroid: &[f64; D]) -> f64 {
    point
        .iter()
        .zip(centroid.iter())
        .map(|(a, b)| (a - b) * (a - b))
        .sum()
}
