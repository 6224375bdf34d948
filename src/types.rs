//! Core types shared across the crate.

use crate::engine::vector_ops;
use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// An ordered, index-addressed set of embedding vectors of one dimension.
///
/// Rows are stored contiguously in row-major order. The dimension is fixed
/// at construction, so every row has exactly `dim` components.
///
/// # Example
///
/// ```rust
/// use topicspace::VectorSet;
///
/// let set = VectorSet::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.dim(), 2);
/// assert_eq!(set.row(1), &[0.0, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VectorSetRepr")]
pub struct VectorSet {
    data: Vec<f32>,
    dim: usize,
}

#[derive(Deserialize)]
struct VectorSetRepr {
    data: Vec<f32>,
    dim: usize,
}

impl TryFrom<VectorSetRepr> for VectorSet {
    type Error = SimError;

    fn try_from(repr: VectorSetRepr) -> SimResult<Self> {
        VectorSet::from_flat(repr.data, repr.dim)
    }
}

impl VectorSet {
    /// Build a set from individual rows. All rows must share one non-zero
    /// length.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> SimResult<Self> {
        let dim = match rows.first() {
            Some(first) => first.len(),
            None => {
                return Err(SimError::config(
                    "cannot build a vector set from zero rows",
                ))
            }
        };
        if dim == 0 {
            return Err(SimError::config("vector dimension must be at least 1"));
        }

        let mut data = Vec::with_capacity(rows.len() * dim);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != dim {
                return Err(SimError::config(format!(
                    "row {} has dimension {} but expected {}",
                    i,
                    row.len(),
                    dim
                )));
            }
            data.extend_from_slice(row);
        }

        Ok(Self { data, dim })
    }

    /// Build a set from a flat row-major buffer.
    ///
    /// An empty buffer yields an empty set; operations reject empty sets at
    /// their own boundary.
    pub fn from_flat(data: Vec<f32>, dim: usize) -> SimResult<Self> {
        if dim == 0 {
            return Err(SimError::config("vector dimension must be at least 1"));
        }
        if data.len() % dim != 0 {
            return Err(SimError::config(format!(
                "buffer of {} values is not a multiple of dimension {}",
                data.len(),
                dim
            )));
        }
        Ok(Self { data, dim })
    }

    /// Vector dimension shared by every row
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.data.len() / self.dim
    }

    /// True when the set holds no rows
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row `i`.
    ///
    /// # Panics
    /// Panics if `i >= self.len()`.
    #[inline]
    pub fn row(&self, i: usize) -> &[f32] {
        let start = i * self.dim;
        &self.data[start..start + self.dim]
    }

    /// Iterate rows in index order
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[f32]> + '_ {
        self.data.chunks_exact(self.dim)
    }

    /// The underlying row-major buffer
    pub fn as_flat(&self) -> &[f32] {
        &self.data
    }

    /// Copy a contiguous range of rows into a new set.
    pub fn slice(&self, range: Range<usize>) -> SimResult<Self> {
        if range.start > range.end || range.end > self.len() {
            return Err(SimError::config(format!(
                "row range {:?} out of bounds for {} rows",
                range,
                self.len()
            )));
        }
        let data = self.data[range.start * self.dim..range.end * self.dim].to_vec();
        Ok(Self {
            data,
            dim: self.dim,
        })
    }

    /// Copy the listed rows, in the given order, into a new set.
    pub fn select(&self, indices: &[usize]) -> SimResult<Self> {
        let n = self.len();
        let mut data = Vec::with_capacity(indices.len() * self.dim);
        for &i in indices {
            if i >= n {
                return Err(SimError::config(format!(
                    "row index {} out of bounds for {} rows",
                    i, n
                )));
            }
            data.extend_from_slice(self.row(i));
        }
        Ok(Self {
            data,
            dim: self.dim,
        })
    }

    /// Return a copy with every row scaled to unit length.
    ///
    /// Ranking never normalizes on its own; callers that hold raw vectors use
    /// this explicitly before ranking.
    pub fn normalized(&self) -> SimResult<Self> {
        let mut data = self.data.clone();
        for (i, row) in data.chunks_exact_mut(self.dim).enumerate() {
            vector_ops::check_vector(row, "input", i)?;
            vector_ops::normalize_inplace(row);
        }
        Ok(Self {
            data,
            dim: self.dim,
        })
    }

    /// Whether every row has an L2 norm within `tolerance` of 1.0
    pub fn is_unit_norm(&self, tolerance: f32) -> bool {
        self.rows()
            .all(|row| vector_ops::is_normalized(row, tolerance))
    }
}

/// One ranked target: its index in the target set and its similarity score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Index into the target vector set
    pub index: usize,
    /// Cosine similarity (dot product of unit vectors)
    pub score: f32,
}

/// The ranked neighbors of one source vector.
///
/// Scores are non-increasing; equal scores appear in ascending target index
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankedResult {
    /// Neighbors, best first
    pub neighbors: Vec<Neighbor>,
}

impl RankedResult {
    /// Number of ranked neighbors
    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    /// True when nothing was ranked
    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }

    /// Target indices in rank order
    pub fn indices(&self) -> Vec<usize> {
        self.neighbors.iter().map(|n| n.index).collect()
    }

    /// Scores in rank order
    pub fn scores(&self) -> Vec<f32> {
        self.neighbors.iter().map(|n| n.score).collect()
    }

    /// Best neighbor, if any
    pub fn first(&self) -> Option<&Neighbor> {
        self.neighbors.first()
    }

    /// Iterate neighbors in rank order
    pub fn iter(&self) -> std::slice::Iter<'_, Neighbor> {
        self.neighbors.iter()
    }
}

/// Ranked labels with their scores for one source vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDescription {
    /// Labels of the nearest targets, best first
    pub labels: Vec<String>,
    /// Scores aligned with `labels`
    pub scores: Vec<f32>,
}

/// Ranked target indices with their scores for one source vector.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClosestItems {
    /// Indices of the nearest targets, best first
    pub indices: Vec<usize>,
    /// Scores aligned with `indices`
    pub scores: Vec<f32>,
}
