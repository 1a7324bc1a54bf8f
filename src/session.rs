use crate::algorithm::{self, assign_labels};
use crate::config::SessionConfig;
use crate::distance::inertia;
use crate::error::KMeansError;
use crate::generator::{generator_for, DatasetGenerator};
use crate::init::{initialize_centroids, InitMethod};
use crate::point::{array_to_points, Dataset, Point};
use crate::selection::{ManualSelection, SelectionStatus};
use ndarray::{Array1, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Stage of a session in the initialize → iterate → converge lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No centroids yet
    Empty,
    /// Manual init selected; collecting clicked centroids
    AwaitingManualCentroids,
    /// Centroids chosen and first assignment computed, no step taken
    Initialized,
    /// At least one step taken, centroids still moving
    Iterating,
    /// Centroids stopped moving (or the iteration cap was hit)
    Converged,
}

/// Read-only projection of a session returned after every operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub dataset: Vec<Point>,
    pub centroids: Vec<Point>,
    /// Points grouped by cluster, k groups in centroid order (groups may be empty)
    pub clusters: Vec<Vec<Point>>,
    /// Cluster index of each dataset point
    pub labels: Vec<usize>,
    pub phase: Phase,
    pub iteration: usize,
    pub k: usize,
    pub init_method: InitMethod,
    pub pending_manual_centroids: Vec<Point>,
    pub selection: SelectionStatus,
    /// Sum of squared distances to assigned centroids, once a run exists
    pub inertia: Option<f64>,
    pub iteration_cap_reached: bool,
}

/// Centroids and the assignment that goes with them
#[derive(Debug, Clone)]
struct Run {
    centroids: Array2<f64>,
    labels: Array1<usize>,
}

#[derive(Debug, Clone)]
struct SessionState {
    dataset: Option<Dataset>,
    k: usize,
    init_method: InitMethod,
    /// Present iff phase is Initialized, Iterating or Converged
    run: Option<Run>,
    phase: Phase,
    iteration_count: usize,
    iteration_cap_reached: bool,
    selection: ManualSelection,
}

impl SessionState {
    fn new(k: usize) -> Self {
        Self {
            dataset: None,
            k,
            init_method: InitMethod::Random,
            run: None,
            phase: Phase::Empty,
            iteration_count: 0,
            iteration_cap_reached: false,
            selection: ManualSelection::new(),
        }
    }

    fn clear_run(&mut self) {
        self.run = None;
        self.iteration_count = 0;
        self.iteration_cap_reached = false;
    }

    /// Phase to fall back to when no run exists
    fn idle_phase(&self) -> Phase {
        if self.init_method == InitMethod::Manual && self.dataset.is_some() {
            Phase::AwaitingManualCentroids
        } else {
            Phase::Empty
        }
    }
}

/// Controller for one interactive k-means session.
///
/// Every operation validates the current phase first and either commits a
/// complete new state or returns an error leaving the session untouched.
///
/// # Example
///
/// ```
/// use kmeans_stepper::{InitMethod, KMeansSession, Phase, SessionConfig};
///
/// let mut session = KMeansSession::new(SessionConfig::default().with_seed(42)).unwrap();
/// session.generate_dataset(100).unwrap();
/// session.start_run(3, InitMethod::Random, None).unwrap();
///
/// let mut snapshot = session.step().unwrap();
/// while snapshot.phase != Phase::Converged {
///     snapshot = session.step().unwrap();
/// }
/// assert_eq!(snapshot.clusters.len(), 3);
/// ```
pub struct KMeansSession {
    config: SessionConfig,
    generator: Box<dyn DatasetGenerator>,
    rng: ChaCha8Rng,
    state: SessionState,
}

impl KMeansSession {
    /// Create a session with the generator its configuration names.
    ///
    /// The session starts without a dataset; call [`generate_dataset`](Self::generate_dataset)
    /// or [`reset`](Self::reset) first.
    pub fn new(config: SessionConfig) -> Result<Self, KMeansError> {
        if config.dataset_size == 0 || config.dataset_size > config.max_dataset_size {
            return Err(KMeansError::InvalidDatasetSize {
                count: config.dataset_size,
                max: config.max_dataset_size,
            });
        }
        let generator = generator_for(config.distribution)?;
        Ok(Self::with_generator(config, generator))
    }

    /// Create a session that draws datasets from a custom generator
    pub fn with_generator(config: SessionConfig, generator: Box<dyn DatasetGenerator>) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let state = SessionState::new(config.default_k);

        Self {
            config,
            generator,
            rng,
            state,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn k(&self) -> usize {
        self.state.k
    }

    pub fn init_method(&self) -> InitMethod {
        self.state.init_method
    }

    pub fn iteration_count(&self) -> usize {
        self.state.iteration_count
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.state.dataset.as_ref()
    }

    pub fn selection_status(&self) -> SelectionStatus {
        self.state.selection.status()
    }

    /// Replace the dataset with `count` fresh points and drop all run state.
    ///
    /// With manual init selected the session moves to
    /// `AwaitingManualCentroids` with an empty selection, otherwise to `Empty`.
    /// A k larger than the new dataset is lowered to the dataset size.
    ///
    /// # Errors
    ///
    /// - `EmptyDataset` for a count of 0
    /// - `InvalidDatasetSize` above the configured `max_dataset_size`
    pub fn generate_dataset(&mut self, count: usize) -> Result<Snapshot, KMeansError> {
        if count == 0 {
            return Err(KMeansError::EmptyDataset);
        }
        if count > self.config.max_dataset_size {
            return Err(KMeansError::InvalidDatasetSize {
                count,
                max: self.config.max_dataset_size,
            });
        }

        let dataset = self.generator.generate(count, &mut self.rng);
        self.install_dataset(dataset);
        info!(points = count, phase = ?self.state.phase, "generated dataset");

        Ok(self.snapshot())
    }

    /// Use a caller-supplied dataset instead of a generated one
    pub fn load_dataset(&mut self, dataset: Dataset) -> Snapshot {
        info!(points = dataset.len(), "loaded dataset");
        self.install_dataset(dataset);
        self.snapshot()
    }

    fn install_dataset(&mut self, dataset: Dataset) {
        let state = &mut self.state;
        if state.k > dataset.len() {
            warn!(k = state.k, points = dataset.len(), "k exceeds dataset size, lowering k");
            state.k = dataset.len();
        }
        state.dataset = Some(dataset);
        state.clear_run();

        if state.init_method == InitMethod::Manual {
            state.selection.begin(state.k);
        } else {
            state.selection.clear();
        }
        state.phase = state.idle_phase();
    }

    /// Choose k and the init method ahead of a run.
    ///
    /// Any existing run is discarded. Choosing manual opens a fresh selection
    /// of k centroids; choosing anything else closes it.
    pub fn select_init_method(&mut self, k: usize, method: InitMethod) -> Result<Snapshot, KMeansError> {
        self.validate_k(k)?;

        let state = &mut self.state;
        state.k = k;
        state.init_method = method;
        state.clear_run();

        // Selection opens once there is a dataset to click on
        if method == InitMethod::Manual && state.dataset.is_some() {
            state.selection.begin(k);
        } else {
            state.selection.clear();
        }
        state.phase = state.idle_phase();
        debug!(k, method = %method, phase = ?state.phase, "init method selected");

        Ok(self.snapshot())
    }

    /// Record one manually clicked centroid.
    ///
    /// The k-th pick hands the selection to the initializer: the session
    /// moves to `Initialized` with those centroids and their first
    /// assignment. Picks beyond k fail with `CentroidSelectionLimitReached`.
    pub fn submit_manual_centroid(&mut self, point: Point) -> Result<Snapshot, KMeansError> {
        let mut selection = self.state.selection.clone();
        let status = selection.submit(point).map_err(|e| {
            if e.is_notice() {
                warn!(error = %e, "manual pick rejected");
            }
            e
        })?;

        if let SelectionStatus::Ready { .. } = status {
            let run = self.initial_run(self.state.k, InitMethod::Manual, selection.picks())?;
            self.commit_run(self.state.k, InitMethod::Manual, run);
            info!(k = self.state.k, "manual selection complete");
        }

        self.state.selection = selection;
        debug!(selection = ?self.state.selection.status(), "manual pick accepted");
        Ok(self.snapshot())
    }

    /// Initialize centroids and compute the first assignment.
    ///
    /// For manual init, `manual_centroids` wins when given; otherwise the
    /// pending selection is used. Either way it must hold exactly k points.
    pub fn start_run(
        &mut self,
        k: usize,
        method: InitMethod,
        manual_centroids: Option<Vec<Point>>,
    ) -> Result<Snapshot, KMeansError> {
        self.validate_k(k)?;

        let picks = match method {
            InitMethod::Manual => {
                manual_centroids.unwrap_or_else(|| self.state.selection.picks().to_vec())
            }
            _ => Vec::new(),
        };

        let run = self.initial_run(k, method, &picks)?;
        self.commit_run(k, method, run);

        if method == InitMethod::Manual {
            self.state.selection.fill(k, picks);
        } else {
            self.state.selection.clear();
        }
        info!(k, method = %method, "run started");

        Ok(self.snapshot())
    }

    /// Run one assignment + update step.
    ///
    /// A converged session returns its snapshot unchanged. Stepping before a
    /// run exists fails with `InvalidPhaseForStep`.
    pub fn step(&mut self) -> Result<Snapshot, KMeansError> {
        let (dataset, run) = match self.active_run()? {
            Some(active) => active,
            None => return Ok(self.snapshot()),
        };

        let result = algorithm::step(&dataset.view(), &run.centroids.view(), self.config.tol);
        let moved = result.moved;
        debug!(
            iteration = self.state.iteration_count + 1,
            shift = result.shift,
            "k-means step"
        );

        self.state.run = Some(Run {
            centroids: result.centroids,
            labels: result.labels,
        });
        self.state.iteration_count += 1;
        self.finish_iteration(moved);

        Ok(self.snapshot())
    }

    /// Step until convergence, the session iteration cap, or
    /// `max_iterations` further steps, whichever comes first
    pub fn run_to_convergence(&mut self, max_iterations: Option<usize>) -> Result<Snapshot, KMeansError> {
        let (dataset, run) = match self.active_run()? {
            Some(active) => active,
            None => return Ok(self.snapshot()),
        };

        let remaining = self
            .config
            .max_iters
            .saturating_sub(self.state.iteration_count);
        let budget = max_iterations.map_or(remaining, |m| m.min(remaining));
        if budget == 0 {
            return Ok(self.snapshot());
        }

        let result = algorithm::run_to_convergence(
            &dataset.view(),
            &run.centroids.view(),
            budget,
            self.config.tol,
        );

        self.state.run = Some(Run {
            centroids: result.centroids,
            labels: result.labels,
        });
        self.state.iteration_count += result.n_iterations;
        self.finish_iteration(!result.converged);

        Ok(self.snapshot())
    }

    /// Regenerate a dataset of the configured size and clear all algorithm state
    pub fn reset(&mut self) -> Snapshot {
        let count = self.config.dataset_size.clamp(1, self.config.max_dataset_size.max(1));
        let dataset = self.generator.generate(count, &mut self.rng);

        self.state = SessionState::new(self.config.default_k.min(count));
        self.state.dataset = Some(dataset);
        info!(points = count, "session reset");

        self.snapshot()
    }

    /// Project the current state
    pub fn snapshot(&self) -> Snapshot {
        let state = &self.state;
        let dataset = state.dataset.as_ref().map(Dataset::points).unwrap_or_default();

        let (centroids, clusters, labels, inertia) = match (&state.run, &state.dataset) {
            (Some(run), Some(data)) => {
                let mut clusters = vec![Vec::new(); run.centroids.nrows()];
                for (point, &label) in dataset.iter().zip(run.labels.iter()) {
                    clusters[label].push(*point);
                }
                let inertia = inertia(&data.view(), &run.centroids.view(), &run.labels.view());
                (
                    array_to_points(&run.centroids.view()),
                    clusters,
                    run.labels.to_vec(),
                    Some(inertia),
                )
            }
            _ => (Vec::new(), Vec::new(), Vec::new(), None),
        };

        Snapshot {
            dataset,
            centroids,
            clusters,
            labels,
            phase: state.phase,
            iteration: state.iteration_count,
            k: state.k,
            init_method: state.init_method,
            pending_manual_centroids: state.selection.picks().to_vec(),
            selection: state.selection.status(),
            inertia,
            iteration_cap_reached: state.iteration_cap_reached,
        }
    }

    fn validate_k(&self, k: usize) -> Result<(), KMeansError> {
        if k == 0 {
            return Err(KMeansError::InvalidK("k must be greater than 0".to_string()));
        }
        if let Some(dataset) = &self.state.dataset {
            if k > dataset.len() {
                return Err(KMeansError::InvalidK(format!(
                    "k ({}) is larger than the number of points ({})",
                    k,
                    dataset.len()
                )));
            }
        }
        Ok(())
    }

    fn initial_run(&mut self, k: usize, method: InitMethod, picks: &[Point]) -> Result<Run, KMeansError> {
        let dataset = self.state.dataset.as_ref().ok_or(KMeansError::EmptyDataset)?;
        let data = dataset.view();

        let centroids = initialize_centroids(&data, k, method, Some(picks), &mut self.rng)?;
        let labels = assign_labels(&data, &centroids.view());

        Ok(Run { centroids, labels })
    }

    fn commit_run(&mut self, k: usize, method: InitMethod, run: Run) {
        let state = &mut self.state;
        state.k = k;
        state.init_method = method;
        state.run = Some(run);
        state.phase = Phase::Initialized;
        state.iteration_count = 0;
        state.iteration_cap_reached = false;
    }

    /// Dataset and run to step from, `None` once converged
    fn active_run(&self) -> Result<Option<(&Dataset, &Run)>, KMeansError> {
        match self.state.phase {
            Phase::Converged => Ok(None),
            Phase::Initialized | Phase::Iterating => match (&self.state.dataset, &self.state.run) {
                (Some(dataset), Some(run)) => Ok(Some((dataset, run))),
                _ => Err(KMeansError::InvalidPhaseForStep(self.state.phase)),
            },
            phase => Err(KMeansError::InvalidPhaseForStep(phase)),
        }
    }

    fn finish_iteration(&mut self, moved: bool) {
        let state = &mut self.state;

        if !moved {
            state.phase = Phase::Converged;
            info!(iterations = state.iteration_count, "k-means converged");
        } else if state.iteration_count >= self.config.max_iters {
            state.phase = Phase::Converged;
            state.iteration_cap_reached = true;
            warn!(
                iterations = state.iteration_count,
                "iteration cap reached before convergence"
            );
        } else {
            state.phase = Phase::Iterating;
        }
    }
}
