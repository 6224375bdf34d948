#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Topic Space Similarity Engine
//!
//! `topicspace` interprets a trained topic model by nearest-neighbor search
//! across three aligned vector sets that share one embedding space:
//! documents, vocabulary words, and topics.
//!
//! ## Overview
//!
//! - **Exact top-k ranking** with a bounded heap per source row
//! - **Label mapping** for topic → word and document → word descriptions
//! - **Top-k similarity matrices** in dense or compressed-row form
//! - **Deterministic parallelism** with rayon: identical bits for any worker count
//!
//! ## Architecture
//!
//! ```text
//! topicspace/
//! +-- engine/       # SimilarityEngine: validation, top-k selection, batching
//! +-- describe      # describe_closest_items / find_closest_items
//! +-- matrix/       # dense and CSR top-k matrices
//! +-- space         # TopicSpace facade over documents/words/topics/vocab
//! +-- config        # SimilarityConfig (threads, batch size)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use topicspace::{describe_closest_items, generate_csr_similarity_matrix, VectorSet};
//!
//! let topics = VectorSet::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]])?;
//! let words = VectorSet::from_rows(vec![
//!     vec![1.0, 0.0],
//!     vec![0.6, 0.8],
//!     vec![0.0, 1.0],
//! ])?;
//! let vocab = ["orbit", "launch", "goalie"];
//!
//! let described = describe_closest_items(&topics, &words, &vocab, 2)?;
//! assert_eq!(described[0].labels, vec!["orbit", "launch"]);
//!
//! let matrix = generate_csr_similarity_matrix(&topics, &words, 1)?;
//! assert_eq!(matrix.nnz(), 2);
//! # Ok::<(), topicspace::SimError>(())
//! ```
//!
//! ## Inputs
//!
//! Vectors must already be unit-norm; similarity is the plain dot product and
//! nothing is renormalized behind the caller's back. A NaN, infinite or
//! all-zero vector fails the call with [`SimError::SimilarityUndefined`].

#![warn(clippy::all)]

// Re-export commonly used types
pub use config::SimilarityConfig;
pub use engine::{CancellationToken, SimilarityEngine};
pub use error::{SimError, SimResult};
pub use matrix::{CsrMatrix, DenseTopKMatrix, MatrixFootprint};
pub use space::TopicSpace;
pub use types::*;

/// Error types for similarity operations.
///
/// # Example
///
/// ```rust
/// use topicspace::error::{SimError, SimResult};
///
/// fn check_topn(topn: usize) -> SimResult<()> {
///     if topn == 0 {
///         return Err(SimError::config("topn must be at least 1"));
///     }
///     Ok(())
/// }
///
/// assert!(check_topn(0).is_err());
/// ```
pub mod error;

/// Core types: [`VectorSet`], [`Neighbor`], [`RankedResult`],
/// [`ItemDescription`], [`ClosestItems`].
pub mod types;

/// Engine configuration.
pub mod config;

/// Top-k ranking engine, selection and vector math.
pub mod engine;

/// Label-mapped and index-only nearest-item lookups.
pub mod describe;

/// Dense and compressed-row top-k similarity matrices.
pub mod matrix;

/// Facade over the document, word and topic vector sets of one model.
pub mod space;

/// Alias for [`SimError`].
pub type Error = SimError;

/// Result type alias using [`SimError`].
pub type Result<T> = SimResult<T>;

/// Describe each source vector by the labels of its `topn` nearest targets.
///
/// `labels` must have one entry per target vector. Uses the default engine
/// configuration; see [`SimilarityEngine::describe_closest_items`].
pub fn describe_closest_items<S: AsRef<str>>(
    source_vectors: &VectorSet,
    target_vectors: &VectorSet,
    labels: &[S],
    topn: usize,
) -> SimResult<Vec<ItemDescription>> {
    SimilarityEngine::default().describe_closest_items(source_vectors, target_vectors, labels, topn)
}

/// Return each source vector's `topn` nearest target indices with scores.
pub fn find_closest_items(
    source_vectors: &VectorSet,
    target_vectors: &VectorSet,
    topn: usize,
) -> SimResult<Vec<ClosestItems>> {
    SimilarityEngine::default().find_closest_items(source_vectors, target_vectors, topn)
}

/// Dense `(sources × targets)` matrix keeping each row's `topk` scores.
pub fn generate_similarity_matrix(
    source_vectors: &VectorSet,
    target_vectors: &VectorSet,
    topk: usize,
) -> SimResult<DenseTopKMatrix> {
    SimilarityEngine::default().generate_similarity_matrix(source_vectors, target_vectors, topk)
}

/// Compressed-row `(sources × targets)` matrix keeping each row's `topk`
/// scores; value-identical to [`generate_similarity_matrix`].
pub fn generate_csr_similarity_matrix(
    source_vectors: &VectorSet,
    target_vectors: &VectorSet,
    topk: usize,
) -> SimResult<CsrMatrix> {
    SimilarityEngine::default().generate_csr_similarity_matrix(source_vectors, target_vectors, topk)
}

/// Prelude for convenient imports.
///
/// ```rust
/// use topicspace::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::SimilarityConfig;
    pub use crate::engine::{CancellationToken, SimilarityEngine};
    pub use crate::error::{SimError, SimResult};
    pub use crate::matrix::{CsrMatrix, DenseTopKMatrix};
    pub use crate::space::TopicSpace;
    pub use crate::types::*;
    pub use crate::{
        describe_closest_items, find_closest_items, generate_csr_similarity_matrix,
        generate_similarity_matrix,
    };
}
