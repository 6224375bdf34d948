//! Aligned document, word and topic embeddings.
//!
//! [`TopicSpace`] borrows the vector sets and vocabulary produced by a topic
//! model (joint document/word embedding plus clustered topic vectors) and
//! answers the interpretation queries built on the ranking engine:
//!
//! ```text
//!               topic_words            document_topics / topic matrix
//!   topics ───────────────> words   documents ───────────────> topics
//!                             ^
//!   documents ────────────────┘ document_words
//! ```
//!
//! Nothing is copied or normalized: the vectors must already be unit-norm.

use crate::engine::{top_k, SimilarityEngine};
use crate::error::{SimError, SimResult};
use crate::matrix::{CsrMatrix, DenseTopKMatrix};
use crate::types::{ClosestItems, ItemDescription, VectorSet};
use std::collections::HashMap;
use tracing::debug;

/// Borrowed view over the three vector sets of one embedding space.
#[derive(Debug)]
pub struct TopicSpace<'a> {
    documents: &'a VectorSet,
    words: &'a VectorSet,
    topics: &'a VectorSet,
    vocab: &'a [String],
    word_index: HashMap<&'a str, usize>,
    engine: SimilarityEngine,
}

impl<'a> TopicSpace<'a> {
    /// Validate and wrap the collaborator's output.
    ///
    /// # Errors
    /// [`SimError::Config`] when a set is empty, dimensions differ, the
    /// vocabulary is not aligned with `words`, or a vocabulary entry repeats.
    pub fn new(
        documents: &'a VectorSet,
        words: &'a VectorSet,
        topics: &'a VectorSet,
        vocab: &'a [String],
    ) -> SimResult<Self> {
        for (name, set) in [("document", documents), ("word", words), ("topic", topics)] {
            if set.is_empty() {
                return Err(SimError::config(format!("{} vector set is empty", name)));
            }
        }
        if words.dim() != documents.dim() || topics.dim() != documents.dim() {
            return Err(SimError::config(format!(
                "dimension mismatch: documents {}, words {}, topics {}",
                documents.dim(),
                words.dim(),
                topics.dim()
            )));
        }
        if vocab.len() != words.len() {
            return Err(SimError::config(format!(
                "vocabulary has {} entries for {} word vectors",
                vocab.len(),
                words.len()
            )));
        }

        let mut word_index = HashMap::with_capacity(vocab.len());
        for (i, word) in vocab.iter().enumerate() {
            if word_index.insert(word.as_str(), i).is_some() {
                return Err(SimError::config(format!(
                    "vocabulary entry '{}' appears more than once",
                    word
                )));
            }
        }

        debug!(
            documents = documents.len(),
            words = words.len(),
            topics = topics.len(),
            dim = documents.dim(),
            "Opened topic space"
        );

        Ok(Self {
            documents,
            words,
            topics,
            vocab,
            word_index,
            engine: SimilarityEngine::default(),
        })
    }

    /// Use a specific engine configuration for all queries.
    pub fn with_engine(mut self, engine: SimilarityEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Number of discovered topics
    pub fn num_topics(&self) -> usize {
        self.topics.len()
    }

    /// Number of documents
    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    /// Vocabulary size
    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    /// Shared embedding dimension
    pub fn dim(&self) -> usize {
        self.documents.dim()
    }

    /// Index of `word` in the vocabulary
    pub fn word_index(&self, word: &str) -> Option<usize> {
        self.word_index.get(word).copied()
    }

    /// The `topn` words nearest to each topic.
    pub fn topic_words(&self, topn: usize) -> SimResult<Vec<ItemDescription>> {
        self.engine
            .describe_closest_items(self.topics, self.words, self.vocab, topn)
    }

    /// The `topn` words nearest to each listed document, in the given order.
    pub fn document_words(
        &self,
        doc_indices: &[usize],
        topn: usize,
    ) -> SimResult<Vec<ItemDescription>> {
        let docs = self.documents.select(doc_indices)?;
        self.engine
            .describe_closest_items(&docs, self.words, self.vocab, topn)
    }

    /// The `topn` topics nearest to every document.
    pub fn document_topics(&self, topn: usize) -> SimResult<Vec<ClosestItems>> {
        self.engine
            .find_closest_items(self.documents, self.topics, topn)
    }

    /// Dense documents × topics matrix keeping `topk` topics per document.
    pub fn document_topic_matrix(&self, topk: usize) -> SimResult<DenseTopKMatrix> {
        self.engine
            .generate_similarity_matrix(self.documents, self.topics, topk)
    }

    /// Compressed-row documents × topics matrix keeping `topk` topics per
    /// document.
    pub fn document_topic_csr(&self, topk: usize) -> SimResult<CsrMatrix> {
        self.engine
            .generate_csr_similarity_matrix(self.documents, self.topics, topk)
    }

    /// Documents per topic when each document is assigned its nearest topic.
    ///
    /// Returns `(topic, count)` for every topic, largest first; equal counts
    /// keep ascending topic order.
    pub fn topic_sizes(&self) -> SimResult<Vec<(usize, usize)>> {
        let assignments = self
            .engine
            .rank(self.documents, self.topics, 1)?;

        let mut counts = vec![0usize; self.topics.len()];
        for row in &assignments {
            if let Some(best) = row.first() {
                counts[best.index] += 1;
            }
        }

        let mut sizes: Vec<(usize, usize)> = counts.into_iter().enumerate().collect();
        sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(sizes)
    }

    /// The `topn` vocabulary words nearest to `word`, excluding `word` itself.
    pub fn similar_words(&self, word: &str, topn: usize) -> SimResult<ItemDescription> {
        let index = self
            .word_index(word)
            .ok_or_else(|| SimError::config(format!("'{}' is not in the vocabulary", word)))?;
        if topn == 0 {
            return Err(SimError::config("topn must be at least 1"));
        }

        let query = self.words.select(&[index])?;
        let ranked = self
            .engine
            .rank(&query, self.words, topn.saturating_add(1))?;

        let neighbors = ranked
            .into_iter()
            .next()
            .map(|row| row.neighbors)
            .unwrap_or_default();
        let kept = top_k(
            neighbors
                .into_iter()
                .filter(|n| n.index != index)
                .map(|n| (n.index, n.score)),
            topn,
        );

        Ok(ItemDescription {
            labels: kept.iter().map(|n| self.vocab[n.index].clone()).collect(),
            scores: kept.iter().map(|n| n.score).collect(),
        })
    }

    /// The `topn` documents nearest to `topic`.
    pub fn search_documents_by_topic(&self, topic: usize, topn: usize) -> SimResult<ClosestItems> {
        if topic >= self.topics.len() {
            return Err(SimError::config(format!(
                "topic {} out of range for {} topics",
                topic,
                self.topics.len()
            )));
        }

        let query = self.topics.select(&[topic])?;
        let mut found = self
            .engine
            .find_closest_items(&query, self.documents, topn)?;
        Ok(found.pop().unwrap_or_default())
    }
}
