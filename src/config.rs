//! Configuration for the similarity engine.
//!
//! The engine has no state besides this configuration. It controls how source
//! rows are spread over workers, never what is computed: every setting yields
//! bit-identical results.
//!
//! # Usage
//!
//! ```rust
//! use topicspace::config::SimilarityConfig;
//!
//! // Use defaults (rayon global pool)
//! let config = SimilarityConfig::default();
//!
//! // Or build a dedicated 4-worker configuration
//! let config = SimilarityConfig::builder()
//!     .num_threads(4)
//!     .batch_size(128)
//!     .build()
//!     .expect("valid configuration");
//!
//! assert_eq!(config.num_threads, Some(4));
//! ```

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Number of worker threads.
    ///
    /// - `None`: use rayon's global pool
    /// - `Some(1)`: run on the calling thread
    /// - `Some(n)`: use a dedicated pool of `n` workers
    ///
    /// Default: None
    #[serde(default)]
    pub num_threads: Option<usize>,

    /// Contiguous source rows handed to a worker at once.
    /// Cancellation is checked between batches.
    ///
    /// Default: 256
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Below this many source rows the engine stays on the calling thread.
    ///
    /// Default: 64
    #[serde(default = "default_parallel_threshold")]
    pub parallel_threshold: usize,
}

fn default_batch_size() -> usize {
    256
}

fn default_parallel_threshold() -> usize {
    64
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            num_threads: None,
            batch_size: default_batch_size(),
            parallel_threshold: default_parallel_threshold(),
        }
    }
}

impl SimilarityConfig {
    /// Everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            num_threads: Some(1),
            ..Default::default()
        }
    }

    /// Large batches for corpus-scale builds where per-batch overhead matters
    /// more than cancellation latency.
    pub fn high_throughput() -> Self {
        Self {
            num_threads: None,
            batch_size: 1024,
            parallel_threshold: 16,
        }
    }

    /// Whether this configuration never leaves the calling thread.
    pub fn is_sequential(&self) -> bool {
        self.num_threads == Some(1)
    }

    /// Validate this configuration.
    pub fn validate(&self) -> SimResult<()> {
        if self.batch_size == 0 {
            return Err(SimError::config("batch_size must be greater than 0"));
        }

        if self.num_threads == Some(0) {
            return Err(SimError::config("num_threads must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string.
    ///
    /// Missing fields take their defaults.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to pretty JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Start a builder from the defaults.
    pub fn builder() -> SimilarityConfigBuilder {
        SimilarityConfigBuilder::default()
    }
}

/// Builder for [`SimilarityConfig`].
#[derive(Debug, Default)]
pub struct SimilarityConfigBuilder {
    config: SimilarityConfig,
}

impl SimilarityConfigBuilder {
    /// Set the worker count
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.num_threads = Some(threads);
        self
    }

    /// Use rayon's global pool
    pub fn global_pool(mut self) -> Self {
        self.config.num_threads = None;
        self
    }

    /// Set rows per batch
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    /// Set the sequential cutoff
    pub fn parallel_threshold(mut self, threshold: usize) -> Self {
        self.config.parallel_threshold = threshold;
        self
    }

    /// Build and validate.
    pub fn build(self) -> SimResult<SimilarityConfig> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build without validation.
    pub fn build_unchecked(self) -> SimilarityConfig {
        self.config
    }
}
