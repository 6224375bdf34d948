//! Exact top-k ranking between two vector sets.
//!
//! For every source row the engine scores all target rows by dot product
//! (cosine similarity for unit-norm inputs) and keeps the best `k` with a
//! bounded heap: O(N log k) selection and O(k) scratch per row on top of the
//! unavoidable O(N·D) dot products.
//!
//! ## Parallelism
//!
//! Source rows are split into contiguous batches of
//! [`SimilarityConfig::batch_size`] rows. Each batch owns a disjoint slice of
//! the caller-sized output buffer, so workers never share a write target. The
//! arithmetic for a row does not depend on which worker runs it, so results
//! are bit-identical for every thread count.
//!
//! ```text
//! sources ──┬── batch 0 ──> rows [0, B)      ──┐
//!           ├── batch 1 ──> rows [B, 2B)     ──┼──> output (row order = source order)
//!           └── batch n ──> rows [nB, M)     ──┘
//!                   ^ cancellation checked here, never within a row
//! ```

pub mod cancel;
pub mod topk;
pub mod vector_ops;

pub use cancel::CancellationToken;
pub use topk::{top_k, TopK};

use crate::config::SimilarityConfig;
use crate::error::{SimError, SimResult};
use crate::types::{Neighbor, RankedResult, VectorSet};
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// The ranking engine.
///
/// Holds only its configuration (and, when a worker count is configured, a
/// dedicated rayon pool). Every call is a pure function of its arguments.
#[derive(Debug, Clone)]
pub struct SimilarityEngine {
    config: SimilarityConfig,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            config: SimilarityConfig::default(),
            pool: None,
        }
    }
}

impl SimilarityEngine {
    /// Create an engine, validating the configuration and building a
    /// dedicated thread pool when `num_threads > 1`.
    pub fn new(config: SimilarityConfig) -> SimResult<Self> {
        config.validate()?;

        let pool = match config.num_threads {
            Some(threads) if threads > 1 => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("topicspace-rank-{}", i))
                    .build()
                    .map_err(|e| SimError::config(format!("failed to build thread pool: {}", e)))?;
                Some(Arc::new(pool))
            }
            _ => None,
        };

        Ok(Self { config, pool })
    }

    /// Engine that never leaves the calling thread.
    pub fn sequential() -> Self {
        Self {
            config: SimilarityConfig::sequential(),
            pool: None,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Rank every target for every source, keeping the best `topn` per row.
    ///
    /// Each result row has exactly `min(topn, targets.len())` entries.
    ///
    /// # Errors
    /// - [`SimError::Config`] for empty sets, mismatched dimensions or `topn == 0`
    /// - [`SimError::SimilarityUndefined`] for a non-finite or zero vector
    ///
    /// # Example
    /// ```
    /// use topicspace::{SimilarityEngine, VectorSet};
    ///
    /// let sources = VectorSet::from_rows(vec![vec![1.0, 0.0]]).unwrap();
    /// let targets = VectorSet::from_rows(vec![
    ///     vec![0.0, 1.0],
    ///     vec![1.0, 0.0],
    ///     vec![0.6, 0.8],
    /// ]).unwrap();
    ///
    /// let ranked = SimilarityEngine::default().rank(&sources, &targets, 2).unwrap();
    /// assert_eq!(ranked[0].indices(), vec![1, 2]);
    /// ```
    pub fn rank(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topn: usize,
    ) -> SimResult<Vec<RankedResult>> {
        self.rank_inner(sources, targets, topn, None)
    }

    /// [`rank`](Self::rank) with cooperative cancellation between batches.
    pub fn rank_with_cancel(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topn: usize,
        cancel: &CancellationToken,
    ) -> SimResult<Vec<RankedResult>> {
        self.rank_inner(sources, targets, topn, Some(cancel))
    }

    fn rank_inner(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topn: usize,
        cancel: Option<&CancellationToken>,
    ) -> SimResult<Vec<RankedResult>> {
        let k = self.prepare(sources, targets, topn, "topn")?;

        let mut results = vec![RankedResult::default(); sources.len()];
        self.for_each_ranked_row(sources, targets, k, 1, &mut results, cancel, |ranked, out| {
            out[0] = RankedResult {
                neighbors: ranked.to_vec(),
            };
        })?;

        Ok(results)
    }

    /// Validate a ranking call and return the effective `k` (clipped to the
    /// number of targets).
    ///
    /// All checks run before any ranking work starts, so a failing call never
    /// produces partial output.
    pub(crate) fn prepare(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        k: usize,
        k_name: &str,
    ) -> SimResult<usize> {
        if k == 0 {
            return Err(SimError::config(format!("{} must be at least 1", k_name)));
        }
        if sources.is_empty() {
            return Err(SimError::config("source vector set is empty"));
        }
        if targets.is_empty() {
            return Err(SimError::config("target vector set is empty"));
        }
        if sources.dim() != targets.dim() {
            return Err(SimError::config(format!(
                "dimension mismatch: sources have {} but targets have {}",
                sources.dim(),
                targets.dim()
            )));
        }

        vector_ops::check_vector_set(sources, "source")?;
        vector_ops::check_vector_set(targets, "target")?;

        let effective = k.min(targets.len());
        debug!(
            sources = sources.len(),
            targets = targets.len(),
            dim = sources.dim(),
            requested = k,
            effective,
            "Ranking vector sets"
        );
        Ok(effective)
    }

    /// Drive ranking over `out`, which holds `row_width` slots per source row.
    ///
    /// `write` receives a row's ranked neighbors (best first, exactly `k` of
    /// them) together with that row's output slots.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn for_each_ranked_row<T, F>(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        k: usize,
        row_width: usize,
        out: &mut [T],
        cancel: Option<&CancellationToken>,
        write: F,
    ) -> SimResult<()>
    where
        T: Send,
        F: Fn(&[Neighbor], &mut [T]) + Sync,
    {
        debug_assert_eq!(out.len(), sources.len() * row_width);

        // A batch never spans more rows than exist, so chunk_len <= out.len().
        let batch_rows = self.config.batch_size.min(sources.len()).max(1);
        let chunk_len = batch_rows.saturating_mul(row_width);

        let process = |(batch, chunk): (usize, &mut [T])| -> SimResult<()> {
            if cancel.map_or(false, CancellationToken::is_cancelled) {
                warn!(batch, "Ranking cancelled");
                return Err(SimError::Cancelled);
            }

            let first_row = batch * batch_rows;
            let mut selector = TopK::new(k);
            let mut ranked = vec![Neighbor::default(); k];

            for (offset, row_out) in chunk.chunks_mut(row_width).enumerate() {
                let query = sources.row(first_row + offset);
                for (j, target) in targets.rows().enumerate() {
                    selector.push(j, vector_ops::dot_product(query, target));
                }
                let written = selector.drain_sorted_into(&mut ranked);
                write(&ranked[..written], row_out);
            }

            trace!(batch, first_row, rows = chunk.len() / row_width, "Ranked batch");
            Ok(())
        };

        if self.config.is_sequential() || sources.len() < self.config.parallel_threshold {
            out.chunks_mut(chunk_len).enumerate().try_for_each(process)
        } else if let Some(pool) = &self.pool {
            pool.install(|| out.par_chunks_mut(chunk_len).enumerate().try_for_each(process))
        } else {
            out.par_chunks_mut(chunk_len).enumerate().try_for_each(process)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_rows(rows: Vec<Vec<f32>>) -> VectorSet {
        VectorSet::from_rows(rows).unwrap().normalized().unwrap()
    }

    /// Deterministic pseudo-random unit vectors
    fn generated(n: usize, dim: usize, seed: u32) -> VectorSet {
        let mut state = seed.wrapping_mul(747796405).wrapping_add(2891336453);
        let data: Vec<f32> = (0..n * dim)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                (state % 2001) as f32 / 1000.0 - 1.0 + 1e-3
            })
            .collect();
        VectorSet::from_flat(data, dim).unwrap().normalized().unwrap()
    }

    #[test]
    fn test_rank_basic_ordering() {
        let sources = unit_rows(vec![vec![1.0, 0.0, 0.0]]);
        let targets = unit_rows(vec![
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.0, 0.0],
            vec![-1.0, 0.0, 0.0],
            vec![1.0, 1.0, 0.0],
        ]);

        let ranked = SimilarityEngine::default().rank(&sources, &targets, 4).unwrap();
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].indices(), vec![1, 3, 0, 2]);
        assert!((ranked[0].neighbors[0].score - 1.0).abs() < 1e-6);
        assert!((ranked[0].neighbors[3].score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_rank_clips_topn() {
        let sources = generated(3, 8, 1);
        let targets = generated(5, 8, 2);
        let ranked = SimilarityEngine::default().rank(&sources, &targets, 50).unwrap();
        assert!(ranked.iter().all(|r| r.len() == 5));
    }

    #[test]
    fn test_rank_rejects_bad_input() {
        let engine = SimilarityEngine::default();
        let a = generated(2, 4, 1);
        let b = generated(2, 3, 2);
        let empty = VectorSet::from_flat(vec![], 4).unwrap();

        assert!(engine.rank(&a, &a, 0).unwrap_err().is_config());
        assert!(engine.rank(&a, &b, 1).unwrap_err().is_config());
        assert!(engine.rank(&empty, &a, 1).unwrap_err().is_config());
        assert!(engine.rank(&a, &empty, 1).unwrap_err().is_config());
    }

    #[test]
    fn test_rank_rejects_undefined_vectors() {
        let engine = SimilarityEngine::default();
        let good = generated(2, 2, 3);
        let zero = VectorSet::from_rows(vec![vec![1.0, 0.0], vec![0.0, 0.0]]).unwrap();
        let nan = VectorSet::from_rows(vec![vec![f32::NAN, 0.0]]).unwrap();

        match engine.rank(&good, &zero, 1).unwrap_err() {
            SimError::SimilarityUndefined { set, index, .. } => {
                assert_eq!(set, "target");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(engine
            .rank(&nan, &good, 1)
            .unwrap_err()
            .is_similarity_undefined());
    }

    #[test]
    fn test_sequential_and_parallel_are_bit_identical() {
        let sources = generated(300, 16, 7);
        let targets = generated(400, 16, 11);

        let sequential = SimilarityEngine::sequential()
            .rank(&sources, &targets, 10)
            .unwrap();

        let config = SimilarityConfig::builder()
            .num_threads(4)
            .batch_size(7)
            .parallel_threshold(0)
            .build()
            .unwrap();
        let parallel = SimilarityEngine::new(config)
            .unwrap()
            .rank(&sources, &targets, 10)
            .unwrap();

        assert_eq!(sequential.len(), parallel.len());
        for (a, b) in sequential.iter().zip(parallel.iter()) {
            assert_eq!(a.indices(), b.indices());
            let a_bits: Vec<u32> = a.scores().iter().map(|s| s.to_bits()).collect();
            let b_bits: Vec<u32> = b.scores().iter().map(|s| s.to_bits()).collect();
            assert_eq!(a_bits, b_bits);
        }
    }

    #[test]
    fn test_cancelled_before_start() {
        let sources = generated(10, 4, 5);
        let targets = generated(10, 4, 6);
        let token = CancellationToken::new();
        token.cancel();

        let result = SimilarityEngine::default().rank_with_cancel(&sources, &targets, 3, &token);
        assert!(matches!(result, Err(SimError::Cancelled)));
    }

    #[test]
    fn test_cancel_between_batches_stops_remaining_rows() {
        let sources = generated(6, 4, 8);
        let targets = generated(5, 4, 9);
        let config = SimilarityConfig {
            batch_size: 1,
            ..SimilarityConfig::sequential()
        };
        let engine = SimilarityEngine::new(config).unwrap();
        let token = CancellationToken::new();

        let mut out = vec![usize::MAX; sources.len()];
        let result = engine.for_each_ranked_row(
            &sources,
            &targets,
            2,
            1,
            &mut out,
            Some(&token),
            |ranked: &[Neighbor], row: &mut [usize]| {
                row[0] = ranked[0].index;
                token.cancel();
            },
        );

        assert!(matches!(result, Err(SimError::Cancelled)));
        assert_ne!(out[0], usize::MAX);
        assert!(out[1..].iter().all(|&v| v == usize::MAX));
    }

    #[test]
    fn test_oversized_batch_is_clamped_to_row_count() {
        let config = SimilarityConfig::builder()
            .num_threads(1)
            .batch_size(usize::MAX)
            .build()
            .unwrap();
        let engine = SimilarityEngine::new(config).unwrap();
        let sources = generated(2, 3, 12);
        let targets = generated(2, 3, 13);

        let matrix = engine.generate_similarity_matrix(&sources, &targets, 1).unwrap();
        assert_eq!(matrix.shape(), (2, 2));
        assert_eq!(matrix.nnz(), 2);

        let csr = engine.generate_csr_similarity_matrix(&sources, &targets, 2).unwrap();
        assert_eq!(csr.nnz(), 4);
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimilarityConfig::builder().batch_size(0).build_unchecked();
        assert!(SimilarityEngine::new(config).unwrap_err().is_config());
    }
}
