use ndarray::{Array1, ArrayView1, ArrayView2};

/// Squared Euclidean distance between two rows.
///
/// Computed from coordinate differences rather than the
/// ||x||^2 + ||c||^2 - 2*x.c expansion so that exact ties stay exact.
#[inline]
pub fn squared_distance(a: &ArrayView1<f64>, b: &ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Index of the centroid closest to `point`, and its squared distance.
///
/// Ties go to the lowest centroid index. `centroids` must have at least one row.
pub fn nearest_centroid(point: &ArrayView1<f64>, centroids: &ArrayView2<f64>) -> (usize, f64) {
    let mut best_label = 0;
    let mut best_dist = f64::INFINITY;

    for (j, centroid) in centroids.rows().into_iter().enumerate() {
        let dist = squared_distance(point, &centroid);
        if dist < best_dist {
            best_dist = dist;
            best_label = j;
        }
    }

    (best_label, best_dist)
}

/// Find the nearest centroid for every data point
///
/// # Returns
/// * `labels` - Cluster assignments for each data point (n_data,)
pub fn find_nearest_centroids(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Array1<usize> {
    data.rows()
        .into_iter()
        .map(|row| nearest_centroid(&row, centroids).0)
        .collect()
}

/// Squared distance from every data point to its closest centroid
pub fn min_squared_distances(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>) -> Array1<f64> {
    data.rows()
        .into_iter()
        .map(|row| nearest_centroid(&row, centroids).1)
        .collect()
}

/// Sum of squared distances from each point to the centroid it is assigned to
pub fn inertia(data: &ArrayView2<f64>, centroids: &ArrayView2<f64>, labels: &ArrayView1<usize>) -> f64 {
    data.rows()
        .into_iter()
        .zip(labels.iter())
        .map(|(row, &label)| squared_distance(&row, &centroids.row(label)))
        .sum()
}

/// Largest Euclidean distance any single centroid moved
pub fn max_centroid_shift(old_centroids: &ArrayView2<f64>, new_centroids: &ArrayView2<f64>) -> f64 {
    old_centroids
        .rows()
        .into_iter()
        .zip(new_centroids.rows())
        .map(|(old_c, new_c)| squared_distance(&old_c, &new_c).sqrt())
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_squared_distance() {
        let a = array![1.0, 2.0];
        let b = array![4.0, 6.0];
        assert_relative_eq!(squared_distance(&a.view(), &b.view()), 25.0);
    }

    #[test]
    fn test_find_nearest_centroids() {
        let data = array![[0.0, 0.0], [10.0, 10.0], [5.0, 5.0]];
        let centroids = array![[0.0, 0.0], [10.0, 10.0]];

        let labels = find_nearest_centroids(&data.view(), &centroids.view());

        assert_eq!(labels[0], 0);
        assert_eq!(labels[1], 1);
        // (5,5) is equidistant; the lower index wins
        assert_eq!(labels[2], 0);
    }

    #[test]
    fn test_tie_goes_to_lowest_index_regardless_of_order() {
        let data = array![[0.0, 0.0]];
        let centroids = array![[3.0, 4.0], [-3.0, -4.0], [4.0, 3.0]];

        let labels = find_nearest_centroids(&data.view(), &centroids.view());
        assert_eq!(labels[0], 0);
    }

    #[test]
    fn test_min_squared_distances_and_inertia() {
        let data = array![[0.0, 0.0], [2.0, 0.0], [10.0, 0.0]];
        let centroids = array![[1.0, 0.0], [10.0, 0.0]];

        let mins = min_squared_distances(&data.view(), &centroids.view());
        assert_relative_eq!(mins[0], 1.0);
        assert_relative_eq!(mins[1], 1.0);
        assert_relative_eq!(mins[2], 0.0);

        let labels = find_nearest_centroids(&data.view(), &centroids.view());
        assert_relative_eq!(inertia(&data.view(), &centroids.view(), &labels.view()), 2.0);
    }

    #[test]
    fn test_max_centroid_shift() {
        let old = array![[0.0, 0.0], [1.0, 1.0]];
        let new = array![[3.0, 4.0], [1.0, 2.0]];

        let shift = max_centroid_shift(&old.view(), &new.view());
        assert_relative_eq!(shift, 5.0, epsilon = 1e-12);
    }
}
