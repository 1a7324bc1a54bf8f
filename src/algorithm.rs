use crate::distance::{find_nearest_centroids, inertia, max_centroid_shift};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use tracing::debug;

/// Result of a single assignment + update step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Recomputed centroids (k, 2)
    pub centroids: Array2<f64>,
    /// Assignment of each point to the centroid it was closest to at the start of the step
    pub labels: Array1<usize>,
    /// Whether any centroid moved farther than the tolerance
    pub moved: bool,
    /// Largest distance any centroid moved
    pub shift: f64,
}

/// Result of running steps until convergence or the iteration cap
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansResult {
    pub centroids: Array2<f64>,
    pub labels: Array1<usize>,
    pub n_iterations: usize,
    /// `false` when the iteration cap stopped the run first
    pub converged: bool,
}

/// Assign every point to its nearest centroid (lowest index on ties)
pub fn assign_labels(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Array1<usize> {
    find_nearest_centroids(data, centroids)
}

/// Recompute each centroid as the mean of its assigned points.
///
/// A cluster with no points keeps its previous centroid.
pub fn update_centroids(
    data: &ArrayView2<f64>,
    labels: &ArrayView1<usize>,
    prev_centroids: &ArrayView2<f64>,
) -> Array2<f64> {
    let k = prev_centroids.nrows();
    let n_features = prev_centroids.ncols();

    // Accumulators for new centroids
    let mut cluster_sums: Array2<f64> = Array2::zeros((k, n_features));
    let mut cluster_counts = vec![0usize; k];

    for (row, &label) in data.rows().into_iter().zip(labels.iter()) {
        cluster_counts[label] += 1;
        let mut sum = cluster_sums.row_mut(label);
        sum += &row;
    }

    let mut centroids = prev_centroids.to_owned();
    for (cluster_idx, &count) in cluster_counts.iter().enumerate() {
        if count > 0 {
            for j in 0..n_features {
                centroids[[cluster_idx, j]] = cluster_sums[[cluster_idx, j]] / count as f64;
            }
        }
    }

    centroids
}

/// Run one k-means iteration: assign, update, then test for movement.
///
/// `moved` is false iff every centroid moved at most `tol`.
pub fn step(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>, tol: f64) -> StepResult {
    let labels = assign_labels(data, centroids);
    let new_centroids = update_centroids(data, &labels.view(), centroids);
    let shift = max_centroid_shift(centroids, &new_centroids.view());

    StepResult {
        centroids: new_centroids,
        labels,
        moved: shift > tol,
        shift,
    }
}

/// Apply [`step`] until no centroid moves or `max_iters` steps have run
pub fn run_to_convergence(
    data: &ArrayView2<f64>,
    centroids: &ArrayView2<f64>,
    max_iters: usize,
    tol: f64,
) -> KMeansResult {
    let mut centroids = centroids.to_owned();
    let mut labels = assign_labels(data, &centroids.view());
    let mut n_iterations = 0;
    let mut converged = false;

    for iteration in 0..max_iters {
        n_iterations = iteration + 1;

        let result = step(data, &centroids.view(), tol);
        centroids = result.centroids;
        labels = result.labels;

        debug!(
            iteration = n_iterations,
            shift = result.shift,
            inertia = inertia(data, &centroids.view(), &labels.view()),
            "k-means step"
        );

        if !result.moved {
            converged = true;
            break;
        }
    }

    KMeansResult {
        centroids,
        labels,
        n_iterations,
        converged,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    fn two_groups() -> Array2<f64> {
        array![[0.0, 0.0], [0.0, 2.0], [10.0, 10.0], [10.0, 12.0]]
    }

    #[test]
    fn test_update_uses_means() {
        let data = two_groups();
        let labels = array![0usize, 0, 1, 1];
        let prev = array![[5.0, 5.0], [6.0, 6.0]];

        let centroids = update_centroids(&data.view(), &labels.view(), &prev.view());
        assert_eq!(centroids, array![[0.0, 1.0], [10.0, 11.0]]);
    }

    #[test]
    fn test_empty_cluster_keeps_centroid() {
        let data = two_groups();
        let centroids = array![[0.0, 1.0], [10.0, 11.0], [100.0, -100.0]];

        let result = step(&data.view(), &centroids.view(), 1e-9);

        assert_eq!(result.centroids.row(2), array![100.0, -100.0]);
        assert!(result.labels.iter().all(|&l| l < 2));
    }

    #[test]
    fn test_step_reports_movement() {
        let data = two_groups();
        let start = array![[0.0, 0.0], [10.0, 10.0]];

        let first = step(&data.view(), &start.view(), 1e-9);
        assert!(first.moved);
        assert_relative_eq!(first.shift, 1.0, epsilon = 1e-12);

        let second = step(&data.view(), &first.centroids.view(), 1e-9);
        assert!(!second.moved);
        assert_eq!(second.centroids, first.centroids);
    }

    #[test]
    fn test_run_to_convergence_reaches_fixed_point() {
        let data = array![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [5.0, 5.0], [6.0, 5.0], [5.0, 6.0]];
        let start = array![[0.0, 0.0], [1.0, 0.0]];

        let result = run_to_convergence(&data.view(), &start.view(), 100, 1e-9);

        assert!(result.converged);
        assert!(result.n_iterations <= 100);
        assert_eq!(result.labels.to_vec(), vec![0, 0, 0, 1, 1, 1]);

        let again = step(&data.view(), &result.centroids.view(), 1e-9);
        assert!(!again.moved);
    }

    #[test]
    fn test_run_hits_iteration_cap() {
        let data = two_groups();
        let start = array![[0.0, 0.0], [10.0, 10.0]];

        let result = run_to_convergence(&data.view(), &start.view(), 1, 1e-9);
        assert_eq!(result.n_iterations, 1);
        assert!(!result.converged);
    }

    #[test]
    fn test_zero_iterations_still_assigns() {
        let data = two_groups();
        let start = array![[0.0, 0.0], [10.0, 10.0]];

        let result = run_to_convergence(&data.view(), &start.view(), 0, 1e-9);
        assert_eq!(result.n_iterations, 0);
        assert_eq!(result.labels.to_vec(), vec![0, 0, 1, 1]);
        assert_eq!(result.centroids, start);
    }
}
