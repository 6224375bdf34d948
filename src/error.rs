//! Error types for similarity ranking operations

use std::io;
use thiserror::Error;

/// Result type for similarity operations
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all ranking and matrix operations.
///
/// Every variant aborts the enclosing call; no operation returns partial
/// output alongside an error.
#[derive(Error, Debug)]
pub enum SimError {
    /// Bad shapes, mismatched lengths, zero topn/topk, empty vector sets or
    /// an invalid engine configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A vector that would take part in a cosine similarity is non-finite or
    /// has zero magnitude.
    #[error("Similarity undefined for {set} vector {index}: {reason}")]
    SimilarityUndefined {
        /// Which vector set the offending row belongs to
        set: &'static str,
        /// Row index inside that set
        index: usize,
        /// What was wrong with it
        reason: String,
    },

    /// A cancellation token was triggered between batches
    #[error("Operation cancelled")]
    Cancelled,

    /// I/O errors (configuration files)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        SimError::Serialization(err.to_string())
    }
}

impl SimError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        SimError::Config(msg.into())
    }

    /// Create a similarity-undefined error
    pub fn similarity_undefined(set: &'static str, index: usize, reason: impl Into<String>) -> Self {
        SimError::SimilarityUndefined {
            set,
            index,
            reason: reason.into(),
        }
    }

    /// Whether this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, SimError::Config(_))
    }

    /// Whether this is a similarity-undefined error
    pub fn is_similarity_undefined(&self) -> bool {
        matches!(self, SimError::SimilarityUndefined { .. })
    }
}
