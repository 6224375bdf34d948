//! Label-mapped and index-only nearest-item lookups.
//!
//! Both operations rank with the [`SimilarityEngine`] and only differ in
//! post-processing:
//!
//! - **describe**: ranked target indices are replaced with their labels
//!   (topic → words, document → words)
//! - **find**: ranked target indices are returned as-is (document → topics)

use crate::engine::{CancellationToken, SimilarityEngine};
use crate::error::{SimError, SimResult};
use crate::types::{ClosestItems, ItemDescription, RankedResult, VectorSet};

impl SimilarityEngine {
    /// Describe each source by the labels of its `topn` nearest targets.
    ///
    /// `labels[i]` names `targets.row(i)`.
    ///
    /// # Errors
    /// [`SimError::Config`] when `labels.len() != targets.len()`, in addition
    /// to the errors of [`SimilarityEngine::rank`].
    pub fn describe_closest_items<S: AsRef<str>>(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        labels: &[S],
        topn: usize,
    ) -> SimResult<Vec<ItemDescription>> {
        check_labels(targets, labels)?;
        let ranked = self.rank(sources, targets, topn)?;
        Ok(label_results(ranked, labels))
    }

    /// [`describe_closest_items`](Self::describe_closest_items) with
    /// cooperative cancellation.
    pub fn describe_closest_items_with_cancel<S: AsRef<str>>(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        labels: &[S],
        topn: usize,
        cancel: &CancellationToken,
    ) -> SimResult<Vec<ItemDescription>> {
        check_labels(targets, labels)?;
        let ranked = self.rank_with_cancel(sources, targets, topn, cancel)?;
        Ok(label_results(ranked, labels))
    }

    /// Return each source's `topn` nearest target indices with scores.
    pub fn find_closest_items(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topn: usize,
    ) -> SimResult<Vec<ClosestItems>> {
        let ranked = self.rank(sources, targets, topn)?;
        Ok(ranked.into_iter().map(ClosestItems::from).collect())
    }

    /// [`find_closest_items`](Self::find_closest_items) with cooperative
    /// cancellation.
    pub fn find_closest_items_with_cancel(
        &self,
        sources: &VectorSet,
        targets: &VectorSet,
        topn: usize,
        cancel: &CancellationToken,
    ) -> SimResult<Vec<ClosestItems>> {
        let ranked = self.rank_with_cancel(sources, targets, topn, cancel)?;
        Ok(ranked.into_iter().map(ClosestItems::from).collect())
    }
}

fn check_labels<S>(targets: &VectorSet, labels: &[S]) -> SimResult<()> {
    if labels.len() != targets.len() {
        return Err(SimError::config(format!(
            "{} labels supplied for {} target vectors",
            labels.len(),
            targets.len()
        )));
    }
    Ok(())
}

fn label_results<S: AsRef<str>>(ranked: Vec<RankedResult>, labels: &[S]) -> Vec<ItemDescription> {
    ranked
        .into_iter()
        .map(|row| ItemDescription {
            labels: row
                .neighbors
                .iter()
                .map(|n| labels[n.index].as_ref().to_string())
                .collect(),
            scores: row.scores(),
        })
        .collect()
}

impl From<RankedResult> for ClosestItems {
    fn from(row: RankedResult) -> Self {
        let (indices, scores) = row.neighbors.iter().map(|n| (n.index, n.score)).unzip();
        Self { indices, scores }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words() -> (VectorSet, Vec<&'static str>) {
        let vectors = VectorSet::from_rows(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![0.6, 0.8, 0.0],
        ])
        .unwrap();
        (vectors, vec!["space", "hockey", "medicine", "orbit"])
    }

    #[test]
    fn test_describe_maps_labels_in_rank_order() {
        let (word_vectors, vocab) = words();
        let topics = VectorSet::from_rows(vec![vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0]]).unwrap();

        let described = SimilarityEngine::default()
            .describe_closest_items(&topics, &word_vectors, &vocab, 2)
            .unwrap();

        assert_eq!(described.len(), 2);
        assert_eq!(described[0].labels, vec!["space", "orbit"]);
        assert_eq!(described[1].labels, vec!["hockey", "orbit"]);
        assert!((described[0].scores[1] - 0.6).abs() < 1e-6);
        assert!((described[1].scores[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_describe_accepts_owned_labels() {
        let (word_vectors, vocab) = words();
        let owned: Vec<String> = vocab.iter().map(|w| w.to_string()).collect();
        let topics = VectorSet::from_rows(vec![vec![0.0, 0.0, 1.0]]).unwrap();

        let described = SimilarityEngine::default()
            .describe_closest_items(&topics, &word_vectors, &owned, 1)
            .unwrap();
        assert_eq!(described[0].labels, vec!["medicine"]);
    }

    #[test]
    fn test_describe_label_length_mismatch() {
        let (word_vectors, vocab) = words();
        let topics = VectorSet::from_rows(vec![vec![1.0, 0.0, 0.0]]).unwrap();

        let err = SimilarityEngine::default()
            .describe_closest_items(&topics, &word_vectors, &vocab[..3], 2)
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_find_returns_indices() {
        let (word_vectors, _) = words();
        let docs = VectorSet::from_rows(vec![vec![0.0, 1.0, 0.0]]).unwrap();

        let found = SimilarityEngine::default()
            .find_closest_items(&docs, &word_vectors, 3)
            .unwrap();
        assert_eq!(found[0].indices, vec![1, 3, 0]);
        assert_eq!(found[0].scores.len(), 3);
    }

    #[test]
    fn test_find_with_cancel() {
        let (word_vectors, _) = words();
        let token = CancellationToken::new();
        token.cancel();

        let result = SimilarityEngine::default().find_closest_items_with_cancel(
            &word_vectors,
            &word_vectors,
            1,
            &token,
        );
        assert!(matches!(result, Err(SimError::Cancelled)));
    }
}
