/// Shape of the synthetic datasets a session generates
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Distribution {
    /// Points uniform in the unit square [0, 1)²
    Uniform,
    /// Gaussian blobs around `centers` random centers with standard deviation `spread`
    Blobs { centers: usize, spread: f64 },
}

/// Configuration for a k-means teaching session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Number of points generated on reset (and the default for new datasets)
    pub dataset_size: usize,

    /// Largest dataset a generate request may ask for
    pub max_dataset_size: usize,

    /// Number of clusters used until the client chooses another one
    pub default_k: usize,

    /// Maximum number of iterations before a run is stopped without converging
    pub max_iters: usize,

    /// Convergence tolerance. A step whose largest centroid movement is at most
    /// this distance counts as converged.
    pub tol: f64,

    /// Random seed for dataset generation and centroid seeding.
    /// `None` draws a fresh seed from the OS.
    pub seed: Option<u64>,

    /// Dataset generator used by generate and reset
    pub distribution: Distribution,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            dataset_size: 100,
            max_dataset_size: 100_000,
            default_k: 3,
            max_iters: 300,
            tol: 1e-9,
            seed: None,
            distribution: Distribution::Uniform,
        }
    }
}

impl SessionConfig {
    /// Create a new configuration with the specified dataset size
    pub fn new(dataset_size: usize) -> Self {
        Self {
            dataset_size,
            ..Default::default()
        }
    }

    /// Set the upper bound on generated dataset sizes
    pub fn with_max_dataset_size(mut self, max_dataset_size: usize) -> Self {
        self.max_dataset_size = max_dataset_size;
        self
    }

    /// Set the default number of clusters
    pub fn with_default_k(mut self, k: usize) -> Self {
        self.default_k = k;
        self
    }

    /// Set the maximum number of iterations
    pub fn with_max_iters(mut self, max_iters: usize) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Set the convergence tolerance
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the dataset distribution
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.dataset_size, 100);
        assert_eq!(config.max_dataset_size, 100_000);
        assert_eq!(config.default_k, 3);
        assert_eq!(config.max_iters, 300);
        assert!(config.seed.is_none());
        assert_eq!(config.distribution, Distribution::Uniform);
    }

    #[test]
    fn test_builder_chain() {
        let config = SessionConfig::new(40)
            .with_max_dataset_size(500)
            .with_default_k(4)
            .with_max_iters(10)
            .with_tol(1e-6)
            .with_seed(7)
            .with_distribution(Distribution::Blobs {
                centers: 4,
                spread: 0.05,
            });

        assert_eq!(config.dataset_size, 40);
        assert_eq!(config.max_dataset_size, 500);
        assert_eq!(config.default_k, 4);
        assert_eq!(config.max_iters, 10);
        assert_eq!(config.tol, 1e-6);
        assert_eq!(config.seed, Some(7));
        assert!(matches!(config.distribution, Distribution::Blobs { centers: 4, .. }));
    }
}
