use crate::session::Phase;
use thiserror::Error;

/// Error types for k-means sessions
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KMeansError {
    /// The number of clusters k is invalid (must be in 1..=dataset size)
    #[error("Invalid k value: {0}")]
    InvalidK(String),

    /// Manual centroids supplied do not match k
    #[error("Please select exactly {expected} centroids before running k-means (got {got})")]
    CentroidCountMismatch { expected: usize, got: usize },

    /// A manual pick was submitted after k picks were already collected
    #[error("Centroid selection limit reached: all {k} centroids are already selected")]
    CentroidSelectionLimitReached { k: usize },

    /// A manual pick was submitted while manual initialization is not selected
    #[error("Manual centroid selection is not active; select the manual init method first")]
    ManualSelectionInactive,

    /// Step requested before centroids were initialized
    #[error("Cannot step in phase {0:?}; start a run first")]
    InvalidPhaseForStep(Phase),

    /// Operation attempted with no dataset (or a zero-sized one)
    #[error("No dataset available. Please generate the dataset first.")]
    EmptyDataset,

    /// A coordinate was NaN or infinite
    #[error("Coordinates must be finite, got ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },

    /// Requested dataset size is outside 1..=max
    #[error("Invalid dataset size {count}: must be between 1 and {max}")]
    InvalidDatasetSize { count: usize, max: usize },

    /// Dataset generator parameters are unusable
    #[error("Invalid distribution: {0}")]
    InvalidDistribution(String),

    /// The init method name is not recognised
    #[error("Unknown init method: {0} (expected random, manual, smart or kmeans++)")]
    UnknownInitMethod(String),
}

impl KMeansError {
    /// Non-fatal errors are surfaced as notices and never abort a session.
    pub fn is_notice(&self) -> bool {
        matches!(self, KMeansError::CentroidSelectionLimitReached { .. })
    }
}
