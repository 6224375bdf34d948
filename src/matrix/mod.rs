//! Top-k similarity matrices.
//!
//! Two builders with identical semantics and different storage:
//!
//! | Builder | Type | Memory |
//! |---------|------|--------|
//! | [`generate_similarity_matrix`](crate::SimilarityEngine::generate_similarity_matrix) | [`DenseTopKMatrix`] | O(M·N) |
//! | [`generate_csr_similarity_matrix`](crate::SimilarityEngine::generate_csr_similarity_matrix) | [`CsrMatrix`] | O(M·k) |
//!
//! For identical inputs and `topk`, every value stored in the CSR matrix sits
//! at the same position with the same bits in the dense matrix, and the dense
//! matrix is zero everywhere else. Choosing between them is left to the
//! caller; [`MatrixFootprint`] gives the byte counts to decide with.

pub mod csr;
pub mod dense;

pub use csr::CsrMatrix;
pub use dense::DenseTopKMatrix;

use serde::{Deserialize, Serialize};

/// Estimated heap bytes of both matrix forms for an M×N build with `topk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixFootprint {
    /// Bytes of the dense matrix (saturating)
    pub dense_bytes: usize,
    /// Bytes of the CSR matrix (saturating)
    pub csr_bytes: usize,
}

impl MatrixFootprint {
    /// Estimate footprints for `rows` sources, `cols` targets and `topk`.
    pub fn estimate(rows: usize, cols: usize, topk: usize) -> Self {
        let k = topk.min(cols);
        let f32_size = std::mem::size_of::<f32>();
        let usize_size = std::mem::size_of::<usize>();

        let dense_bytes = rows.saturating_mul(cols).saturating_mul(f32_size);
        let csr_bytes = rows
            .saturating_mul(k)
            .saturating_mul(f32_size + usize_size)
            .saturating_add((rows.saturating_add(1)).saturating_mul(usize_size));

        Self {
            dense_bytes,
            csr_bytes,
        }
    }

    /// Whether the dense form fits within `budget_bytes`.
    pub fn dense_fits(&self, budget_bytes: usize) -> bool {
        self.dense_bytes <= budget_bytes
    }
}
