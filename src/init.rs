use crate::distance::min_squared_distances;
use crate::error::KMeansError;
use crate::point::{points_to_array, Point};
use ndarray::{Array2, ArrayView2, Axis};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::index::sample;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a run picks its initial centroids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitMethod {
    /// k distinct dataset points chosen uniformly at random
    #[default]
    #[serde(rename = "random")]
    Random,
    /// Centroids clicked by the user, in click order
    #[serde(rename = "manual")]
    Manual,
    /// Farthest-first traversal
    #[serde(rename = "smart", alias = "farthest_first")]
    Smart,
    /// k-means++ seeding, weighted by squared distance
    #[serde(rename = "kmeans++", alias = "kmeanspp")]
    KMeansPlusPlus,
}

impl InitMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InitMethod::Random => "random",
            InitMethod::Manual => "manual",
            InitMethod::Smart => "smart",
            InitMethod::KMeansPlusPlus => "kmeans++",
        }
    }
}

impl fmt::Display for InitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InitMethod {
    type Err = KMeansError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(InitMethod::Random),
            "manual" => Ok(InitMethod::Manual),
            "smart" | "farthest_first" | "farthest-first" => Ok(InitMethod::Smart),
            "kmeans++" | "kmeanspp" => Ok(InitMethod::KMeansPlusPlus),
            _ => Err(KMeansError::UnknownInitMethod(s.to_string())),
        }
    }
}

/// Produce k initial centroids for `data` as a (k, 2) array.
///
/// `manual` is only consulted for [`InitMethod::Manual`], where it must hold
/// exactly k points. The random methods draw from `rng`, so a seeded RNG
/// gives reproducible centroids.
///
/// # Errors
///
/// - `EmptyDataset` if `data` has no rows
/// - `InvalidK` if k is 0 or larger than the dataset
/// - `CentroidCountMismatch` if manual points do not number k
/// - `NonFiniteCoordinate` if a manual point is NaN or infinite
pub fn initialize_centroids(
    data: &ArrayView2<f64>,
    k: usize,
    method: InitMethod,
    manual: Option<&[Point]>,
    rng: &mut ChaCha8Rng,
) -> Result<Array2<f64>, KMeansError> {
    let n_samples = data.nrows();

    if n_samples == 0 {
        return Err(KMeansError::EmptyDataset);
    }

    if k == 0 {
        return Err(KMeansError::InvalidK("k must be greater than 0".to_string()));
    }

    if k > n_samples {
        return Err(KMeansError::InvalidK(format!(
            "k ({}) is larger than the number of points ({})",
            k, n_samples
        )));
    }

    match method {
        InitMethod::Random => Ok(random_centroids(data, k, rng)),
        InitMethod::Manual => manual_centroids(k, manual.unwrap_or(&[])),
        InitMethod::Smart => Ok(farthest_first_centroids(data, k, rng)),
        InitMethod::KMeansPlusPlus => Ok(kmeans_plus_plus_centroids(data, k, rng)),
    }
}

/// Select k distinct data points uniformly at random
fn random_centroids(data: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let selected = sample(rng, data.nrows(), k).into_vec();
    data.select(Axis(0), &selected)
}

fn manual_centroids(k: usize, points: &[Point]) -> Result<Array2<f64>, KMeansError> {
    if points.len() != k {
        return Err(KMeansError::CentroidCountMismatch {
            expected: k,
            got: points.len(),
        });
    }
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(KMeansError::NonFiniteCoordinate { x: bad.x, y: bad.y });
    }

    Ok(points_to_array(points))
}

/// First pick uniform, then repeatedly take the point farthest from its
/// nearest chosen centroid (lowest index on ties)
fn farthest_first_centroids(data: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let mut selected = vec![rng.gen_range(0..data.nrows())];

    while selected.len() < k {
        let chosen = data.select(Axis(0), &selected);
        let dists = min_squared_distances(data, &chosen.view());

        let mut best = 0;
        for (i, &d) in dists.iter().enumerate() {
            if d > dists[best] {
                best = i;
            }
        }
        selected.push(best);
    }

    data.select(Axis(0), &selected)
}

/// First pick uniform, then each next pick weighted by squared distance to
/// the nearest chosen centroid
fn kmeans_plus_plus_centroids(data: &ArrayView2<f64>, k: usize, rng: &mut ChaCha8Rng) -> Array2<f64> {
    let n_samples = data.nrows();
    let mut selected = vec![rng.gen_range(0..n_samples)];

    while selected.len() < k {
        let chosen = data.select(Axis(0), &selected);
        let weights = min_squared_distances(data, &chosen.view());

        // All remaining points coincide with a centroid: fall back to uniform
        let next = match WeightedIndex::new(weights.iter().copied()) {
            Ok(dist) => dist.sample(rng),
            Err(_) => rng.gen_range(0..n_samples),
        };
        selected.push(next);
    }

    data.select(Axis(0), &selected)
}
