//! Compressed-row top-k similarity matrix.
//!
//! Stores `min(topk, N)` entries per row in three arrays:
//!
//! ```text
//! indptr : [0, k, 2k, ..., M·k]      row i spans indptr[i]..indptr[i + 1]
//! indices: column of each entry       ascending within a row
//! data   : score of each entry
//! ```
//!
//! Memory is O(M·k) instead of the dense O(M·N). Positions and values are
//! exactly those of [`DenseTopKMatrix`](super::DenseTopKMatrix) for the same
//! inputs.

use crate::engine::{CancellationToken, SimilarityEngine};
use crate::error::{SimError, SimResult};
use crate::types::{Neighbor, VectorSet};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Compressed sparse row matrix of `f32` scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CsrParts")]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

#[derive(Deserialize)]
struct CsrParts {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f32>,
}

impl TryFrom<CsrParts> for CsrMatrix {
    type Error = SimError;

    fn try_from(parts: CsrParts) -> SimResult<Self> {
        CsrMatrix::from_parts(parts.rows, parts.cols, parts.indptr, parts.indices, parts.data)
    }
}

impl CsrMatrix {
    /// Assemble a matrix from raw CSR arrays, validating their structure.
    pub fn from_parts(
        rows: usize,
        cols: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<f32>,
    ) -> SimResult<Self> {
        let expected = rows
            .checked_add(1)
            .ok_or_else(|| SimError::config(format!("{} rows is not addressable", rows)))?;
        if indptr.len() != expected {
            return Err(SimError::config(format!(
                "indptr has {} entries, expected {}",
                indptr.len(),
                expected
            )));
        }
        if indices.len() != data.len() {
            return Err(SimError::config(
                "indices and data must have the same length",
            ));
        }
        if indptr.first() != Some(&0) || indptr.last() != Some(&indices.len()) {
            return Err(SimError::config("indptr must start at 0 and end at nnz"));
        }
        if let Some(i) = indptr.windows(2).position(|w| w[0] > w[1]) {
            return Err(SimError::config(format!("indptr decreases at row {}", i)));
        }
        for (i, bounds) in indptr.windows(2).enumerate() {
            let row = &indices[bounds[0]..bounds[1]];
            if row.iter().any(|&c| c >= cols) {
                return Err(SimError::config(format!("row {} has a column out of range", i)));
            }
            if row.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SimError::config(format!(
                    "row {} columns are not strictly ascending",
                    i
                )));
            }
        }

        Ok(Self {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }

    /// `(rows, cols)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of stored entries.
    ///
    /// Built matrices store every kept score, including a kept score of
    /// exactly `0.0`, so this can exceed
    /// [`DenseTopKMatrix::nnz`](super::DenseTopKMatrix::nnz) for the same
    /// inputs, which counts only non-zero values.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Number of stored entries in row `i`
    ///
    /// # Panics
    /// Panics if `i >= rows`.
    pub fn row_nnz(&self, i: usize) -> usize {
        self.indptr[i + 1] - self.indptr[i]
    }

    /// Row pointer array
    pub fn indptr(&self) -> &[usize] {
        &self.indptr
    }

    /// Column index array
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Value array
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Columns and values stored in row `i`, columns ascending.
    ///
    /// # Panics
    /// Panics if `i >= rows`.
    pub fn row(&self, i: usize) -> (&[usize], &[f32]) {
        let (start, end) = (self.indptr[i], self.indptr[i + 1]);
        (&self.indices[start..end], &self.data[start..end])
    }

    /// Entry `(i, j)`, zero when not stored. `None` when out of bounds.
    pub fn get(&self, i: usize, j: usize) -> Option<f32> {
        if i >= self.rows || j >= self.cols {
            return None;
        }
        let (cols, values) = self.row(i);
        Some(match cols.binary_search(&j) {
            Ok(pos) => values[pos],
            Err(_) => 0.0,
        })
    }

    /// Iterate stored entries as `(row, col, value)` in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.rows).flat_map(move |i| {
            let (cols, values) = self.row(i);
            cols.iter()
                .zip(values.iter())
                .map(move |(&j, &v)| (i, j, v))
        })
    }

    /// Expand into a dense array.
    pub fn to_dense(&self) -> Array2<f32> {
        let mut dense = Array2::<f32>::zeros((self.rows, self.cols));
        for (i, j, v) in self.iter() {
            dense[[i, j]] = v;
        }
        dense
    }
}

impl SimilarityEngine {
    /// Build the compressed-row top-k matrix of shape
    /// `(sources.len(), targets.len())`.
    ///
    /// Every row stores exactly `min(topk, N)` entries, so `nnz` is
    /// `M · min(topk, N)` even when a kept score happens to be `0.0`.
    pub fn generate_csr_similarity_matrix(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
    ) -> SimResult<CsrMatrix> {
        self.csr_inner(sources, targets, topk, None)
    }

    /// [`generate_csr_similarity_matrix`](Self::generate_csr_similarity_matrix)
    /// with cooperative cancellation.
    pub fn generate_csr_similarity_matrix_with_cancel(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
        cancel: &CancellationToken,
    ) -> SimResult<CsrMatrix> {
        self.csr_inner(sources, targets, topk, Some(cancel))
    }

    fn csr_inner(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topk: usize,
        cancel: Option<&CancellationToken>,
    ) -> SimResult<CsrMatrix> {
        let k = self.prepare(sources, targets, topk, "topk")?;
        let (rows, cols) = (sources.len(), targets.len());

        let len = rows.checked_mul(k).ok_or_else(|| {
            SimError::config(format!("CSR matrix of {} x {} entries is not addressable", rows, k))
        })?;

        let mut entries = vec![Neighbor::default(); len];
        self.for_each_ranked_row(sources, targets, k, k, &mut entries, cancel, |ranked, row| {
            row.copy_from_slice(ranked);
            row.sort_unstable_by_key(|n| n.index);
        })?;

        let (indices, data): (Vec<usize>, Vec<f32>) =
            entries.iter().map(|n| (n.index, n.score)).unzip();
        let indptr: Vec<usize> = (0..=rows).map(|i| i * k).collect();

        info!(rows, cols, nnz = data.len(), "Built CSR similarity matrix");
        Ok(CsrMatrix {
            rows,
            cols,
            indptr,
            indices,
            data,
        })
    }
}
