use riskpulse_core::{Result, RiskError};

/// Result of a full batch K-means run.
#[derive(Debug, Clone)]
pub struct KmeansResult {
    /// Cluster index of each point, in input order.
    pub assignments: Vec<usize>,
    /// Final centroid vectors, indexed by cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Number of clusters.
    pub k: usize,
    /// Number of Lloyd's iterations performed.
    pub iterations: usize,
    /// Sum of squared distances from each point to its assigned centroid.
    pub inertia: f64,
}

impl KmeansResult {
    /// Number of points assigned to each cluster.
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0usize; self.k];
        for &c in &self.assignments {
            sizes[c] += 1;
        }
        sizes
    }
}

/// Run Lloyd's K-means algorithm.
///
/// Uses deterministic farthest-point initialization, so identical input
/// always yields identical output. Iterates until assignments stabilize or
/// `max_iterations` is reached.
///
/// # Arguments
/// * `points`: dense feature vectors of equal dimension
/// * `k`: number of clusters (must be >= 1 and <= points.len())
/// * `max_iterations`: upper bound on Lloyd's iterations
pub fn kmeans(points: &[Vec<f64>], k: usize, max_iterations: usize) -> Result<KmeansResult> {
    if k == 0 {
        return Err(RiskError::DegenerateInput(
            "cluster count must be at least 1".to_string(),
        ));
    }
    if points.len() < k {
        return Err(RiskError::InsufficientData {
            required: k,
            actual: points.len(),
        });
    }

    let dim = points[0].len();
    let n = points.len();

    let mut centroids = farthest_point_init(points, k);

    let mut assignments = vec![0usize; n];
    let mut iterations = 0;

    for _ in 0..max_iterations {
        iterations += 1;

        // Assignment step: assign each point to nearest centroid.
        let mut changed = false;
        for (i, vec) in points.iter().enumerate() {
            let nearest = nearest_centroid(vec, &centroids);
            if assignments[i] != nearest {
                assignments[i] = nearest;
                changed = true;
            }
        }

        if !changed && iterations > 1 {
            break;
        }

        // Update step: recompute centroids as mean of assigned points.
        let mut new_centroids = vec![vec![0.0; dim]; k];
        let mut counts = vec![0usize; k];

        for (i, vec) in points.iter().enumerate() {
            let cluster = assignments[i];
            counts[cluster] += 1;
            for (j, &val) in vec.iter().enumerate() {
                new_centroids[cluster][j] += val;
            }
        }

        for (c, centroid) in new_centroids.iter_mut().enumerate() {
            if counts[c] > 0 {
                let count = counts[c] as f64;
                for val in centroid.iter_mut() {
                    *val /= count;
                }
            } else {
                // Empty cluster: keep previous centroid.
                centroid.clone_from(&centroids[c]);
            }
        }

        centroids = new_centroids;
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(vec, &cluster)| squared_euclidean(vec, &centroids[cluster]))
        .sum();

    Ok(KmeansResult {
        assignments,
        centroids,
        k,
        iterations,
        inertia,
    })
}

// ── Internal helpers ─────────────────────────────────────────

/// Greedy farthest-point seeding: the middle point first, then repeatedly
/// the point with the largest squared distance to its nearest chosen centroid.
fn farthest_point_init(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let n = points.len();
    let mut centroids = Vec::with_capacity(k);

    centroids.push(points[n / 2].clone());

    for _ in 1..k {
        let mut best_idx = 0;
        let mut best_dist = f64::NEG_INFINITY;

        for (i, vec) in points.iter().enumerate() {
            let min_dist = centroids
                .iter()
                .map(|c| squared_euclidean(vec, c))
                .fold(f64::MAX, f64::min);
            if min_dist > best_dist {
                best_dist = min_dist;
                best_idx = i;
            }
        }

        centroids.push(points[best_idx].clone());
    }

    centroids
}

/// Index of the nearest centroid; ties go to the lowest index.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best_idx = 0;
    let mut best_dist = f64::MAX;
    for (i, centroid) in centroids.iter().enumerate() {
        let dist = squared_euclidean(point, centroid);
        if dist < best_dist {
            best_dist = dist;
            best_idx = i;
        }
    }
    best_idx
}

#[inline]
pub(crate) fn squared_euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}
