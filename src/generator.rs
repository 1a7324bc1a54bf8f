use crate::config::Distribution;
use crate::error::KMeansError;
use crate::point::Dataset;
use ndarray::{Array2, Axis};
use ndarray_rand::rand_distr::{Normal, Uniform};
use ndarray_rand::RandomExt;
use rand_chacha::ChaCha8Rng;

/// Source of synthetic 2D datasets.
///
/// Generators draw from the session RNG so a seeded session produces the
/// same datasets every time.
pub trait DatasetGenerator: Send {
    /// Produce `count` points
    fn generate(&self, count: usize, rng: &mut ChaCha8Rng) -> Dataset;
}

/// Points uniform in the unit square [0, 1)²
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformGenerator;

impl DatasetGenerator for UniformGenerator {
    fn generate(&self, count: usize, rng: &mut ChaCha8Rng) -> Dataset {
        Dataset::from_array(Array2::random_using((count, 2), Uniform::new(0.0, 1.0), rng))
    }
}

/// Gaussian blobs around random centers in [0.1, 0.9]²
#[derive(Debug, Clone)]
pub struct BlobGenerator {
    centers: usize,
    noise: Normal<f64>,
}

impl BlobGenerator {
    pub fn new(centers: usize, spread: f64) -> Result<Self, KMeansError> {
        if centers == 0 {
            return Err(KMeansError::InvalidDistribution(
                "blob count must be greater than 0".to_string(),
            ));
        }
        let noise = Normal::new(0.0, spread).map_err(|e| {
            KMeansError::InvalidDistribution(format!("blob spread {}: {}", spread, e))
        })?;

        Ok(Self { centers, noise })
    }
}

impl DatasetGenerator for BlobGenerator {
    fn generate(&self, count: usize, rng: &mut ChaCha8Rng) -> Dataset {
        let centers = Array2::random_using((self.centers, 2), Uniform::new(0.1, 0.9), rng);
        let mut data = Array2::random_using((count, 2), self.noise, rng);

        // Point i belongs to blob i % centers
        for (i, mut row) in data.axis_iter_mut(Axis(0)).enumerate() {
            row += &centers.row(i % self.centers);
        }

        Dataset::from_array(data)
    }
}

/// Build the generator a configuration asks for
pub fn generator_for(distribution: Distribution) -> Result<Box<dyn DatasetGenerator>, KMeansError> {
    match distribution {
        Distribution::Uniform => Ok(Box::new(UniformGenerator)),
        Distribution::Blobs { centers, spread } => Ok(Box::new(BlobGenerator::new(centers, spread)?)),
    }
}
