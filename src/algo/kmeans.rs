use rayon::prelude::*;

use crate::algo::tfidf::SparseRow;

/// Configuration for k-means partitioning.
#[derive(Debug, Clone, Copy)]
pub struct KMeansConfig {
    /// Number of clusters. Clamped to the number of rows.
    pub k: usize,
    /// Maximum Lloyd iterations per seeding.
    pub max_iter: usize,
    /// Stop once the total squared centroid shift falls to this value.
    pub tol: f64,
    /// Independent k-means++ seedings; the lowest inertia wins.
    pub n_init: usize,
    /// Seed for k-means++ initialization.
    pub seed: u64,
}

impl Default for KMeansConfig {
    fn default() -> Self {
        Self {
            k: 15,
            max_iter: 300,
            tol: 1e-4,
            n_init: 1,
            seed: 42,
        }
    }
}

/// Result of k-means: hard assignments plus a dense centroid per cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    /// Row index -> cluster index in `0..k`.
    pub assignments: Vec<usize>,
    /// Cluster index -> mean of its members over the full feature space.
    /// A cluster left without members keeps its last centroid.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances from each row to its centroid.
    pub inertia: f64,
    /// Lloyd iterations run by the winning seeding.
    pub iterations: usize,
    pub k: usize,
}

/// Partition sparse rows into `config.k` clusters.
///
/// * `rows` - One sparse vector per document, indices below `dim`.
/// * `dim` - Size of the feature space.
///
/// Initialization is k-means++ driven by a seeded generator, so identical
/// input and seed always yield identical output.
pub fn kmeans(rows: &[SparseRow], dim: usize, config: &KMeansConfig) -> KMeansResult {
    let n = rows.len();
    let k = config.k.min(n);
    if k == 0 {
        return KMeansResult {
            assignments: vec![],
            centroids: vec![],
            inertia: 0.0,
            iterations: 0,
            k: 0,
        };
    }

    let sq_norms: Vec<f64> = rows
        .iter()
        .map(|r| r.iter().map(|(_, w)| w * w).sum())
        .collect();

    let mut best = lloyd(rows, &sq_norms, dim, k, config, config.seed);
    for run in 1..config.n_init {
        let seed = config.seed.wrapping_add(run as u64);
        let result = lloyd(rows, &sq_norms, dim, k, config, seed);
        if result.inertia < best.inertia {
            best = result;
        }
    }
    best
}

fn lloyd(
    rows: &[SparseRow],
    sq_norms: &[f64],
    dim: usize,
    k: usize,
    config: &KMeansConfig,
    seed: u64,
) -> KMeansResult {
    let mut rng = LcgRng::new(seed);
    let mut centroids = kmeans_plus_plus(rows, sq_norms, dim, k, &mut rng);
    let mut iterations = 0;

    for _ in 0..config.max_iter {
        iterations += 1;
        let assigned = assign(rows, sq_norms, &centroids);
        let labels: Vec<usize> = assigned.iter().map(|&(c, _)| c).collect();
        let (mut next, counts) = compute_centroids(rows, &labels, dim, k);
        relocate_empty(&mut next, &counts, rows, &assigned, dim);

        let shift: f64 = centroids
            .iter()
            .zip(&next)
            .map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum::<f64>())
            .sum();
        centroids = next;
        if shift <= config.tol {
            break;
        }
    }

    let assigned = assign(rows, sq_norms, &centroids);
    let assignments: Vec<usize> = assigned.iter().map(|&(c, _)| c).collect();
    let inertia = assigned.iter().map(|&(_, d)| d).sum();

    // Centroids handed back describe the final membership.
    let (mut final_centroids, counts) = compute_centroids(rows, &assignments, dim, k);
    for (c, &count) in counts.iter().enumerate() {
        if count == 0 {
            final_centroids[c] = std::mem::take(&mut centroids[c]);
        }
    }

    KMeansResult {
        assignments,
        centroids: final_centroids,
        inertia,
        iterations,
        k,
    }
}

/// Greedy k-means++ seeding: the first center is uniform; each next one is the
/// best of `2 + ln(k)` candidates sampled with probability proportional to
/// their squared distance from the closest center, judged by the potential
/// (total squared distance) left after adding it.
fn kmeans_plus_plus(
    rows: &[SparseRow],
    sq_norms: &[f64],
    dim: usize,
    k: usize,
    rng: &mut LcgRng,
) -> Vec<Vec<f64>> {
    let n = rows.len();
    let trials = 2 + (k as f64).ln() as usize;
    let mut chosen: Vec<usize> = Vec::with_capacity(k);
    chosen.push((rng.next() % n as u64) as usize);
    let mut closest = distances_to(rows, sq_norms, chosen[0], dim);

    while chosen.len() < k {
        let total: f64 = closest.iter().sum();
        let mut best: Option<(usize, Vec<f64>, f64)> = None;
        if total > 0.0 {
            for _ in 0..trials {
                let candidate = sample_by_weight(&closest, rng.next_f64() * total);
                let updated: Vec<f64> = distances_to(rows, sq_norms, candidate, dim)
                    .into_iter()
                    .zip(&closest)
                    .map(|(d, &c)| d.min(c))
                    .collect();
                let potential: f64 = updated.iter().sum();
                if best.as_ref().map_or(true, |(_, _, p)| potential < *p) {
                    best = Some((candidate, updated, potential));
                }
            }
        }

        match best {
            Some((pick, updated, _)) => {
                chosen.push(pick);
                closest = updated;
            }
            None => {
                // Every row coincides with a center: take the next unused one.
                let pick = (0..n).find(|i| !chosen.contains(i)).unwrap_or(chosen[0]);
                chosen.push(pick);
            }
        }
    }

    chosen.iter().map(|&i| densify(&rows[i], dim)).collect()
}

/// Index whose cumulative weight first exceeds `target`, skipping zero weights.
fn sample_by_weight(weights: &[f64], target: f64) -> usize {
    let mut cumulative = 0.0;
    let mut pick = 0;
    for (i, &w) in weights.iter().enumerate() {
        if w <= 0.0 {
            continue;
        }
        cumulative += w;
        pick = i;
        if cumulative > target {
            break;
        }
    }
    pick
}

fn distances_to(rows: &[SparseRow], sq_norms: &[f64], center: usize, dim: usize) -> Vec<f64> {
    let dense = densify(&rows[center], dim);
    let norm = sq_norms[center];
    rows.iter()
        .zip(sq_norms)
        .map(|(r, &xn)| sq_distance(r, xn, &dense, norm))
        .collect()
}

/// Nearest centroid and squared distance for every row. Ties go to the lower index.
fn assign(rows: &[SparseRow], sq_norms: &[f64], centroids: &[Vec<f64>]) -> Vec<(usize, f64)> {
    let centroid_norms: Vec<f64> = centroids
        .iter()
        .map(|c| c.iter().map(|x| x * x).sum())
        .collect();

    rows.par_iter()
        .zip(sq_norms.par_iter())
        .map(|(row, &xn)| {
            let mut best = 0;
            let mut best_dist = f64::INFINITY;
            for (c, centroid) in centroids.iter().enumerate() {
                let d = sq_distance(row, xn, centroid, centroid_norms[c]);
                if d < best_dist {
                    best_dist = d;
                    best = c;
                }
            }
            (best, best_dist)
        })
        .collect()
}

fn compute_centroids(
    rows: &[SparseRow],
    labels: &[usize],
    dim: usize,
    k: usize,
) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut sums = vec![vec![0.0f64; dim]; k];
    let mut counts = vec![0usize; k];
    for (row, &c) in rows.iter().zip(labels) {
        counts[c] += 1;
        for &(j, w) in row {
            sums[c][j] += w;
        }
    }
    for (sum, &count) in sums.iter_mut().zip(&counts) {
        if count > 0 {
            let inv = 1.0 / count as f64;
            for x in sum.iter_mut() {
                *x *= inv;
            }
        }
    }
    (sums, counts)
}

/// Re-seed every empty cluster with the row farthest from its own centroid,
/// never using the same row twice.
fn relocate_empty(
    centroids: &mut [Vec<f64>],
    counts: &[usize],
    rows: &[SparseRow],
    assigned: &[(usize, f64)],
    dim: usize,
) {
    let mut used: Vec<usize> = Vec::new();
    for (c, &count) in counts.iter().enumerate() {
        if count > 0 {
            continue;
        }
        let far = assigned
            .iter()
            .enumerate()
            .filter(|(i, _)| !used.contains(i))
            .fold(None, |acc: Option<(usize, f64)>, (i, &(_, d))| match acc {
                Some((_, best)) if best >= d => acc,
                _ => Some((i, d)),
            });
        if let Some((i, _)) = far {
            used.push(i);
            centroids[c] = densify(&rows[i], dim);
        }
    }
}

/// Squared Euclidean distance between a sparse row and a dense centroid.
fn sq_distance(row: &SparseRow, row_sq_norm: f64, centroid: &[f64], centroid_sq_norm: f64) -> f64 {
    let dot: f64 = row.iter().map(|&(j, w)| w * centroid[j]).sum();
    (row_sq_norm - 2.0 * dot + centroid_sq_norm).max(0.0)
}

fn densify(row: &SparseRow, dim: usize) -> Vec<f64> {
    let mut dense = vec![0.0; dim];
    for &(j, w) in row {
        dense[j] = w;
    }
    dense
}

/// Simple Linear Congruential Generator for deterministic seeding.
struct LcgRng {
    state: u64,
}

impl LcgRng {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(1),
        }
    }

    fn next(&mut self) -> u64 {
        // LCG constants from Numerical Recipes
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Uniform in `[0, 1)` from the high 53 bits.
    fn next_f64(&mut self) -> f64 {
        (self.next() >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> Vec<SparseRow> {
        vec![
            vec![(0, 1.0)],
            vec![(0, 0.95), (1, 0.05)],
            vec![(2, 1.0)],
            vec![(2, 0.95), (3, 0.05)],
        ]
    }

    fn config(k: usize) -> KMeansConfig {
        KMeansConfig {
            k,
            ..Default::default()
        }
    }

    #[test]
    fn separates_distinct_groups() {
        let result = kmeans(&two_groups(), 4, &config(2));
        let a = &result.assignments;
        assert_eq!(a.len(), 4);
        assert_eq!(a[0], a[1]);
        assert_eq!(a[2], a[3]);
        assert_ne!(a[0], a[2]);
    }

    #[test]
    fn deterministic_for_seed() {
        let rows = two_groups();
        let r1 = kmeans(&rows, 4, &config(2));
        let r2 = kmeans(&rows, 4, &config(2));
        assert_eq!(r1, r2);
    }

    #[test]
    fn one_cluster_per_distinct_row_when_k_equals_n() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)], vec![(2, 1.0)]];
        let result = kmeans(&rows, 3, &config(3));
        let unique: std::collections::HashSet<usize> = result.assignments.iter().copied().collect();
        assert_eq!(unique.len(), 3);
        assert!(result.inertia.abs() < 1e-12);
    }

    #[test]
    fn k_clamped_to_rows() {
        let rows = vec![vec![(0, 1.0)], vec![(1, 1.0)]];
        let result = kmeans(&rows, 2, &config(10));
        assert_eq!(result.k, 2);
        assert_eq!(result.centroids.len(), 2);
        assert!(result.assignments.iter().all(|&c| c < 2));
    }

    #[test]
    fn identical_rows_stay_in_range() {
        let rows = vec![vec![(0, 1.0)]; 4];
        let result = kmeans(&rows, 1, &config(2));
        assert_eq!(result.assignments.len(), 4);
        assert!(result.assignments.iter().all(|&c| c < 2));
    }

    #[test]
    fn zero_dimensional_rows() {
        let rows: Vec<SparseRow> = vec![vec![], vec![], vec![]];
        let result = kmeans(&rows, 0, &config(2));
        assert_eq!(result.assignments.len(), 3);
        assert!(result.assignments.iter().all(|&c| c < 2));
        assert_eq!(result.centroids.len(), 2);
    }

    #[test]
    fn empty_input() {
        let result = kmeans(&[], 5, &config(3));
        assert!(result.assignments.is_empty());
        assert!(result.centroids.is_empty());
        assert_eq!(result.k, 0);
    }

    #[test]
    fn centroids_are_member_means() {
        let rows = two_groups();
        let result = kmeans(&rows, 4, &config(2));
        let c = result.assignments[0];
        let centroid = &result.centroids[c];
        assert!((centroid[0] - 0.975).abs() < 1e-12);
        assert!((centroid[1] - 0.025).abs() < 1e-12);
        assert_eq!(result.assignments[1], c);
        assert!(result.assignments[2..].iter().all(|&other| other != c));
    }

    #[test]
    fn more_inits_never_worse() {
        let rows: Vec<SparseRow> = (0..12)
            .map(|i| vec![(i % 4, 1.0), ((i + 1) % 4, 0.3)])
            .collect();
        let one = kmeans(&rows, 4, &KMeansConfig { k: 3, n_init: 1, ..Default::default() });
        let many = kmeans(&rows, 4, &KMeansConfig { k: 3, n_init: 5, ..Default::default() });
        assert!(many.inertia <= one.inertia + 1e-12);
    }

    #[test]
    fn iterations_bounded() {
        let rows = two_groups();
        let result = kmeans(&rows, 4, &KMeansConfig { k: 2, max_iter: 3, ..Default::default() });
        assert!(result.iterations <= 3);
    }

    #[test]
    fn lcg_unit_interval() {
        let mut rng = LcgRng::new(7);
        for _ in 0..1000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x));
        }
    }
}
