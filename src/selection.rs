use crate::error::KMeansError;
use crate::point::Point;
use serde::Serialize;

/// Where the manual selection protocol stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SelectionStatus {
    /// Manual initialization is not selected
    Idle,
    /// Collecting picks; `selected` of `required` so far
    Awaiting { selected: usize, required: usize },
    /// All k picks collected; a run may start
    Ready { required: usize },
}

/// Gatekeeper for manually clicked centroids.
///
/// Accepts at most k picks while active and rejects the rest with
/// [`KMeansError::CentroidSelectionLimitReached`]. The caller re-checks the
/// count at run time; [`SelectionStatus::Ready`] is only a hint for the UI.
#[derive(Debug, Clone, Default)]
pub struct ManualSelection {
    active: bool,
    k: usize,
    picks: Vec<Point>,
}

impl ManualSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh selection of `k` centroids, discarding earlier picks
    pub fn begin(&mut self, k: usize) {
        self.active = true;
        self.k = k;
        self.picks.clear();
    }

    /// Leave manual mode and forget all picks
    pub fn clear(&mut self) {
        self.active = false;
        self.k = 0;
        self.picks.clear();
    }

    /// Replace the selection with a complete set of k picks
    pub(crate) fn fill(&mut self, k: usize, picks: Vec<Point>) {
        debug_assert_eq!(picks.len(), k);
        self.active = true;
        self.k = k;
        self.picks = picks;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_complete(&self) -> bool {
        self.active && self.picks.len() == self.k
    }

    /// Picks collected so far, in click order
    pub fn picks(&self) -> &[Point] {
        &self.picks
    }

    pub fn required(&self) -> usize {
        self.k
    }

    pub fn remaining(&self) -> usize {
        self.k.saturating_sub(self.picks.len())
    }

    pub fn status(&self) -> SelectionStatus {
        if !self.active {
            SelectionStatus::Idle
        } else if self.is_complete() {
            SelectionStatus::Ready { required: self.k }
        } else {
            SelectionStatus::Awaiting {
                selected: self.picks.len(),
                required: self.k,
            }
        }
    }

    /// Record one pick.
    ///
    /// # Errors
    ///
    /// - `ManualSelectionInactive` outside manual mode
    /// - `NonFiniteCoordinate` for NaN or infinite coordinates
    /// - `CentroidSelectionLimitReached` once k picks are held; the picks are unchanged
    pub fn submit(&mut self, point: Point) -> Result<SelectionStatus, KMeansError> {
        if !self.active {
            return Err(KMeansError::ManualSelectionInactive);
        }
        if !point.is_finite() {
            return Err(KMeansError::NonFiniteCoordinate {
                x: point.x,
                y: point.y,
            });
        }
        if self.picks.len() >= self.k {
            return Err(KMeansError::CentroidSelectionLimitReached { k: self.k });
        }

        self.picks.push(point);
        Ok(self.status())
    }
}
