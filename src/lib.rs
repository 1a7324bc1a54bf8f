//! # kmeans-stepper
//!
//! The engine behind an interactive k-means teaching tool. A session holds a
//! small synthetic 2D dataset, lets the user choose how the initial centroids
//! are picked, and then advances Lloyd's algorithm one step at a time (or all
//! the way) while exposing every intermediate partition.
//!
//! ## Features
//!
//! - **Explicit lifecycle**: `Empty → AwaitingManualCentroids → Initialized →
//!   Iterating → Converged`, with every operation validated against the phase
//! - **Four seeding strategies**: random dataset points, manual clicks,
//!   farthest-first traversal ("smart") and k-means++
//! - **Reproducible**: a seeded ChaCha8 RNG drives datasets and seeding
//! - **Transport agnostic**: serde request/response shapes plus a lock-guarded
//!   [`SessionHandle`] for request/response servers and REPLs
//!
//! ## Example
//!
//! ```rust
//! use kmeans_stepper::{InitMethod, KMeansSession, Phase, SessionConfig};
//!
//! let config = SessionConfig::default().with_seed(7);
//! let mut session = KMeansSession::new(config).unwrap();
//!
//! session.generate_dataset(100).unwrap();
//! let started = session.start_run(3, InitMethod::Smart, None).unwrap();
//! assert_eq!(started.phase, Phase::Initialized);
//!
//! let done = session.run_to_convergence(None).unwrap();
//! assert_eq!(done.phase, Phase::Converged);
//! assert_eq!(done.clusters.iter().map(Vec::len).sum::<usize>(), 100);
//! ```
//!
//! ## Manual selection
//!
//! ```rust
//! use kmeans_stepper::{InitMethod, KMeansError, KMeansSession, Phase, Point, SessionConfig};
//!
//! let mut session = KMeansSession::new(SessionConfig::default().with_seed(1)).unwrap();
//! session.generate_dataset(100).unwrap();
//! session.select_init_method(2, InitMethod::Manual).unwrap();
//!
//! session.submit_manual_centroid(Point::new(0.25, 0.25)).unwrap();
//! let ready = session.submit_manual_centroid(Point::new(0.75, 0.75)).unwrap();
//! assert_eq!(ready.phase, Phase::Initialized);
//!
//! let extra = session.submit_manual_centroid(Point::new(0.5, 0.5));
//! assert!(matches!(extra, Err(KMeansError::CentroidSelectionLimitReached { k: 2 })));
//! ```

mod algorithm;
mod config;
mod distance;
mod error;
mod generator;
mod init;
mod point;
mod protocol;
mod selection;
mod session;

pub use algorithm::{assign_labels, run_to_convergence, step, update_centroids, KMeansResult, StepResult};
pub use config::{Distribution, SessionConfig};
pub use error::KMeansError;
pub use generator::{generator_for, BlobGenerator, DatasetGenerator, UniformGenerator};
pub use init::{initialize_centroids, InitMethod};
pub use point::{Dataset, Point};
pub use protocol::{dispatch, Request, Response, SessionHandle};
pub use selection::{ManualSelection, SelectionStatus};
pub use session::{KMeansSession, Phase, Snapshot};
