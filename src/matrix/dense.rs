//! Dense top-k similarity matrix.
//!
//! Allocates the full M×N matrix regardless of `topk`. Use it while M·N fits
//! comfortably in memory; otherwise build the [`CsrMatrix`](super::CsrMatrix).

use crate::engine::{CancellationToken, SimilarityEngine};
use crate::error::{SimError, SimResult};
use crate::types::VectorSet;
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use tracing::info;

/// An M×N matrix where row `i` holds the top-k similarity scores of source `i`
/// at their target columns and exact zeros elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseTopKMatrix {
    values: Array2<f32>,
}

impl DenseTopKMatrix {
    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Entry `(i, j)`.
    ///
    /// # Panics
    /// Panics if out of bounds.
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[[i, j]]
    }

    /// Row `i` as a view
    pub fn row(&self, i: usize) -> ArrayView1<'_, f32> {
        self.values.row(i)
    }

    /// Number of entries that are not exactly zero
    pub fn nnz(&self) -> usize {
        self.values.iter().filter(|&&v| v != 0.0).count()
    }

    /// Number of entries that are exactly zero
    pub fn count_zeros(&self) -> usize {
        self.values.len() - self.nnz()
    }

    /// Borrow the underlying array
    pub fn as_array(&self) -> &Array2<f32> {
        &self.values
    }

    /// Take the underlying array
    pub fn into_array(self) -> Array2<f32> {
        self.values
    }
}

impl SimilarityEngine {
    /// Build the dense top-k matrix of shape `(sources.len(), targets.len())`.
    ///
    /// Row `i` keeps the `min(topk, N)` best scores of source `i`. A kept score
    /// that is itself exactly `0.0` is indistinguishable from the fill.
    pub fn generate_similarity_matrix(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
    ) -> SimResult<DenseTopKMatrix> {
        self.dense_inner(sources, targets, topk, None)
    }

    /// [`generate_similarity_matrix`](Self::generate_similarity_matrix) with
    /// cooperative cancellation.
    pub fn generate_similarity_matrix_with_cancel(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
        cancel: &CancellationToken,
    ) -> SimResult<DenseTopKMatrix> {
        self.dense_inner(sources, targets, topk, Some(cancel))
    }

    fn dense_inner(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
        cancel: Option<&CancellationToken>,
    ) -> SimResult<DenseTopKMatrix> {
        let k = self.prepare(sources, targets, topk, "topk")?;
        let (rows, cols) = (sources.len(), targets.len());

        let len = rows.checked_mul(cols).ok_or_else(|| {
            SimError::config(format!(
                "dense matrix of {} x {} entries is not addressable",
                rows, cols
            ))
        })?;

        let mut data = vec![0.0f32; len];
        self.for_each_ranked_row(sources, targets, k, cols, &mut data, cancel, |ranked, row| {
            for n in ranked {
                row[n.index] = n.score;
            }
        })?;

        let values = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| SimError::config(e.to_string()))?;

        info!(rows, cols, topk = k, "Built dense similarity matrix");
        Ok(DenseTopKMatrix { values })
    }
}
