use crate::error::KMeansError;
use ndarray::{Array2, ArrayView2};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

/// An immutable 2D coordinate pair.
///
/// On the wire a point is a two-element array `[x, y]`; deserialization
/// rejects NaN and infinite coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Build a point, rejecting non-finite coordinates
    pub fn checked(x: f64, y: f64) -> Result<Self, KMeansError> {
        let point = Self::new(x, y);
        if point.is_finite() {
            Ok(point)
        } else {
            Err(KMeansError::NonFiniteCoordinate { x, y })
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl TryFrom<[f64; 2]> for Point {
    type Error = KMeansError;

    fn try_from([x, y]: [f64; 2]) -> Result<Self, Self::Error> {
        Point::checked(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.x, point.y]
    }
}

/// Pack points into an (n, 2) array, one row per point
pub fn points_to_array(points: &[Point]) -> Array2<f64> {
    Array2::from_shape_fn((points.len(), 2), |(i, j)| {
        if j == 0 {
            points[i].x
        } else {
            points[i].y
        }
    })
}

/// Unpack the rows of an (n, 2) array into points
pub fn array_to_points(data: &ArrayView2<f64>) -> Vec<Point> {
    data.rows()
        .into_iter()
        .map(|row| Point::new(row[0], row[1]))
        .collect()
}

/// An ordered, fixed set of 2D points stored as an (n, 2) array.
///
/// A dataset is never mutated after construction; sessions replace it
/// wholesale on regenerate or reset.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    data: Array2<f64>,
}

impl Dataset {
    /// Build a dataset from points. Fails on an empty slice or a non-finite point.
    pub fn from_points(points: &[Point]) -> Result<Self, KMeansError> {
        if points.is_empty() {
            return Err(KMeansError::EmptyDataset);
        }
        if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
            return Err(KMeansError::NonFiniteCoordinate { x: bad.x, y: bad.y });
        }

        Ok(Self {
            data: points_to_array(points),
        })
    }

    /// Wrap an (n, 2) array produced by a generator
    pub(crate) fn from_array(data: Array2<f64>) -> Self {
        debug_assert_eq!(data.ncols(), 2, "datasets are two-dimensional");
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.data.nrows() == 0
    }

    /// Borrow the underlying (n, 2) array
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Get the point at `index`, if any
    pub fn point(&self, index: usize) -> Option<Point> {
        (index < self.len()).then(|| Point::new(self.data[[index, 0]], self.data[[index, 1]]))
    }

    /// Copy all points out in order
    pub fn points(&self) -> Vec<Point> {
        array_to_points(&self.data.view())
    }
}

impl Serialize for Dataset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for row in self.data.rows() {
            seq.serialize_element(&[row[0], row[1]])?;
        }
        seq.end()
    }
}
